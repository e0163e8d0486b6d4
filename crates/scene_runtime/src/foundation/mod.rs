//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the runtime:
//! - Math types and matrix decomposition
//! - Frame time management
//! - Logging initialisation

pub mod logging;
pub mod math;
pub mod time;
