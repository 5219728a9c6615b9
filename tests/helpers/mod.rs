//! Test helpers module
//!
//! Database and Redis containers, the mock email API, and builders for
//! users, events and fully wired services.

#![allow(dead_code)]

pub mod database_helper;
pub mod email_mock;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use email_mock::*;
pub use test_context::*;
pub use test_data::*;
