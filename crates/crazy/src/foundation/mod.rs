//! Foundation module - Core utilities shared by the framework
//!
//! - Frame timing driven by the native clock
//! - Logging utilities

pub mod time;
pub mod logging;
