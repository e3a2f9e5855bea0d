//! Roster directory client over HTTP.
//!
//! # Wire format
//! ```text
//! GET {base}/partitions/{partition}/members?limit=N[&after=ID]
//!     → {"members": [...], "next_cursor": "ID" | null}
//! GET {base}/partitions/{partition}/index[?role=ROLE]
//!     → 200 [member, ...] | 404 when not indexed
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

use crate::config::{DirectoryConfig, RetryConfig};
use crate::resilience::retries::retry;
use crate::roster::directory::RosterDirectory;
use crate::roster::types::{
    DirectoryError, DirectoryResult, Member, MemberId, MemberSet, RosterPage,
};

/// HTTP roster directory with retry on 429/5xx.
#[derive(Clone)]
pub struct HttpDirectory {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
    retries: RetryConfig,
}

impl HttpDirectory {
    pub fn new(config: &DirectoryConfig, retries: RetryConfig) -> DirectoryResult<Self> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| {
            DirectoryError::Config(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;
        // Url::join drops the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| DirectoryError::Config(e.to_string()))?;

        tracing::info!(base_url = %base_url, "Roster directory client initialized");

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
            retries,
        })
    }

    fn endpoint(&self, partition: &str, tail: &str) -> DirectoryResult<Url> {
        let mut url = self
            .base_url
            .join("partitions/")
            .map_err(|e| DirectoryError::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| DirectoryError::Config("base URL cannot be a base".into()))?
            .pop_if_empty()
            .push(partition)
            .push(tail);
        Ok(url)
    }

    async fn get(&self, url: Url) -> DirectoryResult<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))
    }
}

#[async_trait]
impl RosterDirectory for HttpDirectory {
    async fn fetch_page(
        &self,
        partition: &str,
        cursor: Option<&MemberId>,
        limit: usize,
    ) -> DirectoryResult<RosterPage> {
        let mut url = self.endpoint(partition, "members")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(after) = cursor {
                query.append_pair("after", &after.0);
            }
        }

        let url = &url;
        retry(&self.retries, move || async move {
            let response = self.get(url.clone()).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(DirectoryError::Status(status.as_u16()));
            }
            response
                .json::<RosterPage>()
                .await
                .map_err(|e| DirectoryError::Decode(e.to_string()))
        })
        .await
    }

    async fn fetch_by_filter_direct(
        &self,
        partition: &str,
        filter: Option<&str>,
    ) -> DirectoryResult<Option<MemberSet>> {
        let mut url = self.endpoint(partition, "index")?;
        if let Some(role) = filter {
            url.query_pairs_mut().append_pair("role", role);
        }

        let url = &url;
        retry(&self.retries, move || async move {
            let response = self.get(url.clone()).await?;
            match response.status() {
                StatusCode::NOT_FOUND => Ok(None),
                status if status.is_success() => {
                    let members = response
                        .json::<Vec<Member>>()
                        .await
                        .map_err(|e| DirectoryError::Decode(e.to_string()))?;
                    Ok(Some(members.into_iter().collect()))
                }
                status => Err(DirectoryError::Status(status.as_u16())),
            }
        })
        .await
    }
}
