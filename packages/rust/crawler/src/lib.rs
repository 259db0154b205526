//! Page fetching and token extraction.
//!
//! This crate provides:
//! - [`PageFetcher`], the fetch seam, and [`HttpFetcher`], its reqwest implementation
//! - [`FetchError`], the transient/fatal fetch failure taxonomy
//! - [`extract_emails`] and [`SocialNetwork`] for pulling tokens out of pages

pub mod extract;
pub mod fetch;

pub use extract::{SocialNetwork, extract_emails};
pub use fetch::{FetchError, FetchOptions, HttpFetcher, PageFetcher};
