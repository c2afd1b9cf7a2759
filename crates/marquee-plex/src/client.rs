use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use marquee_core::{RawSessionRecord, SessionSource, SourceError};

use crate::error::PlexError;
use crate::types::SessionsResponse;

const SESSIONS_PATH: &str = "status/sessions";
const CLIENT_IDENTIFIER: &str = "marquee";

/// Plex Media Server client, limited to what the marquee needs.
pub struct PlexClient {
    base_url: Url,
    token: String,
    http: Client,
}

impl PlexClient {
    pub fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self, PlexError> {
        let mut base_url = Url::parse(base_url)?;
        // Keep any path prefix (reverse proxies) when joining.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            token,
            http,
        })
    }

    pub fn sessions_url(&self) -> Result<Url, PlexError> {
        Ok(self.base_url.join(SESSIONS_PATH)?)
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, PlexError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(PlexError::Api {
                status,
                message: body,
            })
        }
    }

    /// Fetch all active playback sessions, in server order.
    pub async fn sessions(&self) -> Result<Vec<RawSessionRecord>, PlexError> {
        let resp = self
            .http
            .get(self.sessions_url()?)
            .header("X-Plex-Token", &self.token)
            .header("X-Plex-Client-Identifier", CLIENT_IDENTIFIER)
            .header("Accept", "application/json")
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let body: SessionsResponse = resp
            .json()
            .await
            .map_err(|e| PlexError::Parse(e.to_string()))?;

        let records = body.into_records();
        debug!(count = records.len(), "Fetched Plex sessions");
        Ok(records)
    }
}

impl SessionSource for PlexClient {
    async fn list_active_sessions(&self) -> Result<Vec<RawSessionRecord>, SourceError> {
        self.sessions().await.map_err(|e| SourceError(e.to_string()))
    }
}
