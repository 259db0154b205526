//! Shared types, error model, and configuration for orgscout.
//!
//! This crate is the foundation depended on by all other orgscout crates.
//! It provides:
//! - [`OrgScoutError`], the unified error type
//! - Domain types ([`CompanyRecord`], [`EmailBatch`], [`CachedSite`], [`SearchHit`])
//! - Configuration ([`AppConfig`], config loading)
//! - URL helpers shared by the cache, crawler and search layers

pub mod config;
pub mod error;
pub mod types;
pub mod urls;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, FetchConfig, MatchingConfig, ProvidersConfig, SearchConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_serpapi_key,
};
pub use error::{OrgScoutError, Result};
pub use types::{
    CachedPage, CachedSite, CompanyRecord, EmailBatch, EmailSource, OrganizationFacts,
    SearchHit, SocialLinks, extend_iunique, iunique,
};
