//! Combined search over posts and documents

use serde::{Deserialize, Serialize};

use crate::documents::ReadingDocument;
use crate::error::{Error, Result};
use crate::gateway::RequestGateway;
use crate::posts::Post;

/// Matches for a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub post_result: Vec<Post>,

    #[serde(default)]
    pub document_result: Vec<ReadingDocument>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.post_result.is_empty() && self.document_result.is_empty()
    }
}

/// Client for `/search`
pub struct SearchClient<'a> {
    gateway: &'a RequestGateway,
}

impl<'a> SearchClient<'a> {
    pub(crate) fn new(gateway: &'a RequestGateway) -> Self {
        Self { gateway }
    }

    pub async fn query(&self, query: &str) -> Result<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::validation("Please enter a search query."));
        }
        self.gateway
            .get("/search")
            .query("query", query)
            .execute::<SearchResults>()
            .await
    }
}
