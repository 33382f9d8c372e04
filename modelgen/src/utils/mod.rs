//! Utilities for modelgen
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{camel_cased, column_name, entity_name, sanitize, serialization_name};
