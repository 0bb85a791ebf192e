//! Utility functions and helpers
//!
//! ## Modules
//!
//! - [`clock`] - Injectable time source
//! - [`retry`] - Retry logic for transient backend failures

pub mod clock;
pub mod retry;

pub use clock::{Clock, FixedClock, SystemClock};
