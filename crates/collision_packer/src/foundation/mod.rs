//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the packer:
//! - Math types and fixed-point helpers
//! - Logging utilities

pub mod math;
pub mod logging;
