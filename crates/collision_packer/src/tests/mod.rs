//! Scenario tests across the whole pipeline
