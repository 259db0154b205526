//! Enrichment pipeline for OrgScout.
//!
//! Ties together search, crawling, name matching and the organization
//! providers into a single operation: [`Enricher::enrich`] turns a company
//! name into a [`orgscout_shared::CompanyRecord`].

pub mod discovery;
pub mod finder;
pub mod link_extractor;
pub mod pipeline;
pub mod providers;
pub mod result_extractor;
pub mod social;
pub mod suffixes;

#[cfg(test)]
mod testing;

pub use discovery::{EmailDiscovery, clean_location};
pub use finder::LinkFinder;
pub use link_extractor::{LinkEmailExtractor, LinkExtraction};
pub use pipeline::{EnrichRequest, Enricher, ProgressReporter, SilentProgress};
pub use providers::{
    AcceptAllValidator, Crunchbase, DunAndBradstreet, MailboxValidator, OrganizationSource,
    ProviderRegistry,
};
pub use result_extractor::SearchResultEmailExtractor;
pub use social::LinkedInResolver;
