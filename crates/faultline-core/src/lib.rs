//! Error classification for Faultline
//!
//! Defines the client-safe [`ClassifiedError`], the single [`classify`]
//! function used at every boundary, and the wire payloads derived from it.

#![allow(clippy::must_use_candidate)]

mod classification;
pub mod error;
mod frame;

pub use classification::{Classification, RecordedError, classify};
pub use error::{Cause, ClassifiedError, ErrorBody, FALLBACK_APP_CODE, SYSTEM_ERROR_APP_CODE};
pub use frame::ErrorFrame;
