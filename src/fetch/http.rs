use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::{SourceConfig, INDEX_PLACEHOLDERS};
use crate::error::Result;
use super::{FetchResult, FragmentSource};

/// Fetches fragments over HTTP from a URL template
pub struct HttpFragmentSource {
    client: Client,
    url_template: String,
}

impl HttpFragmentSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url_template: config.url_template.clone(),
        })
    }

    /// Substitute `index` into the template
    pub fn fragment_url(&self, index: u64) -> String {
        let index = index.to_string();
        INDEX_PLACEHOLDERS
            .iter()
            .fold(self.url_template.clone(), |url, placeholder| {
                url.replace(placeholder, &index)
            })
    }
}

#[async_trait]
impl FragmentSource for HttpFragmentSource {
    async fn fetch(&self, index: u64) -> FetchResult {
        let url = self.fragment_url(index);
        debug!("Requesting fragment-{}: {}", index, url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Error fetching fragment-{}: {}", index, e);
                return FetchResult::Empty;
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("Fragment-{} not found", index);
            return FetchResult::EndOfSequence;
        }
        if !status.is_success() {
            warn!("Failed to fetch fragment-{}, status code: {}", index, status);
            return FetchResult::Empty;
        }

        match response.bytes().await {
            Ok(body) => FetchResult::Content(body.to_vec()),
            Err(e) => {
                error!("Error reading fragment-{} body: {}", index, e);
                FetchResult::Empty
            }
        }
    }
}
