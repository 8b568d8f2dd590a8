//! Search job queue
//!
//! Bounds how many search workflows run concurrently and how many are
//! admitted per time window.

mod executor;

pub use executor::{QueueConfig, QueueError, QueueEvent, SearchQueue};
