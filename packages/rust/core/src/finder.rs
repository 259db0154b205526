//! Single-link lookups: run one query through the free engines, then the
//! paid channel, and keep the first link a picker accepts.

use std::sync::Arc;

use tracing::{debug, error, warn};

use orgscout_search::{PaidSearch, SearchEngines};
use orgscout_shared::SearchHit;

#[derive(Clone)]
pub struct LinkFinder {
    engines: SearchEngines,
    paid: Option<Arc<dyn PaidSearch>>,
}

impl LinkFinder {
    pub fn new(engines: SearchEngines, paid: Option<Arc<dyn PaidSearch>>) -> Self {
        Self { engines, paid }
    }

    /// First link `pick` selects from the results for `query`. Search
    /// failures are logged and treated as empty result pages.
    pub async fn find<F>(&self, query: &str, locale: Option<&str>, pick: F) -> Option<String>
    where
        F: Fn(&[SearchHit]) -> Option<String>,
    {
        let mut cursor = self.engines.cursor();
        while cursor.advance() {
            match cursor.query(query).await {
                Ok(hits) => {
                    if let Some(link) = pick(&hits) {
                        debug!(query, engine = cursor.current_name(), %link, "link found");
                        return Some(link);
                    }
                }
                Err(e) => warn!(query, engine = cursor.current_name(), error = %e, "search failed"),
            }
        }

        let paid = self.paid.as_ref()?;
        match paid.query(query, locale).await {
            Ok(hits) => pick(&self.engines.drop_excluded(hits)),
            Err(e) => {
                error!(query, error = %e, "paid search failed");
                None
            }
        }
    }
}
