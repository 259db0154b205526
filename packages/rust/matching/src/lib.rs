//! Company name matching and email decisions.
//!
//! Everything here is pure string work:
//! - [`variants`] expands a company name into fuzzy-match probes
//! - [`NameMatcher`] decides whether a string is about a company
//! - [`EmailDecider`] filters and ranks candidate email addresses

pub mod decider;
pub mod matcher;
pub mod similarity;
pub mod variants;
pub mod wordlists;

pub use decider::{EmailDecider, filter_job_application, rank_preferred};
pub use matcher::{NameMatcher, contains_company_name};
pub use similarity::{similar_chars, similarity_percent};
pub use variants::name_variants;
