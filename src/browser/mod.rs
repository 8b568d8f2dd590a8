//! Browser automation module
//!
//! Owns the shared Chromium instance and hands out isolated page handles
//! to search workflows.

mod errors;
mod session;

pub use errors::BrowserError;
pub use session::{BrowserSession, BrowserSessionConfig};
