//! Core packer configuration
//!
//! Holds the settings that select the container variant and its layout
//! constants.

pub mod config;
