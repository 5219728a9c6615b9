//! Utility modules
//! 
//! This module contains common utilities used throughout the application,
//! including error handling, response envelopes, logging setup, and helper functions.

pub mod errors;
pub mod helpers;
pub mod logging;
pub mod response;

pub use errors::{EventifyError, Result};
