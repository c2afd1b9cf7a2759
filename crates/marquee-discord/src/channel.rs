use std::sync::Mutex;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use marquee_core::{ChannelError, ChannelSink};

use crate::error::DiscordError;

const API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Deserialize)]
pub struct ChannelObject {
    pub id: String,
    pub name: Option<String>,
    pub guild_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// A guild voice channel addressed over the Discord REST API.
///
/// The channel name is cached after the first successful lookup and kept in
/// step with our own renames, so a cycle costs no request unless it renames.
pub struct DiscordChannel {
    channel_id: u64,
    token: String,
    api_base: String,
    http: Client,
    cached_name: Mutex<Option<String>>,
}

impl DiscordChannel {
    pub fn new(channel_id: u64, token: String, timeout: Duration) -> Result<Self, DiscordError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            channel_id,
            token,
            api_base: API_BASE.to_string(),
            http,
            cached_name: Mutex::new(None),
        })
    }

    /// Point the client at a different API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn channel_id(&self) -> u64 {
        self.channel_id
    }

    fn url(&self) -> String {
        format!("{}/channels/{}", self.api_base.trim_end_matches('/'), self.channel_id)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    fn cached(&self) -> Option<String> {
        self.cached_name
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_cached(&self, name: Option<String>) {
        *self.cached_name.lock().unwrap_or_else(|e| e.into_inner()) = name;
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, DiscordError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify(status, body))
    }

    /// Fetch the channel from the API.
    pub async fn fetch(&self) -> Result<ChannelObject, DiscordError> {
        let resp = self
            .http
            .get(self.url())
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| DiscordError::Parse(e.to_string()))
    }

    /// Rename the channel, recording `reason` in the guild audit log.
    pub async fn edit_name(&self, name: &str, reason: &str) -> Result<ChannelObject, DiscordError> {
        let resp = self
            .http
            .patch(self.url())
            .header("Authorization", self.auth_header())
            .header("X-Audit-Log-Reason", encode_reason(reason))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| DiscordError::Parse(e.to_string()))
    }
}

impl ChannelSink for DiscordChannel {
    async fn current_name(&self) -> Result<String, ChannelError> {
        if let Some(name) = self.cached() {
            return Ok(name);
        }

        let channel = self.fetch().await.map_err(|e| match e {
            DiscordError::Inaccessible { .. } => ChannelError::NotFound(self.channel_id),
            other => ChannelError::Lookup(other.to_string()),
        })?;
        let name = channel.name.unwrap_or_default();
        info!(channel_id = self.channel_id, name = %name, "Resolved target channel");
        self.set_cached(Some(name.clone()));
        Ok(name)
    }

    async fn rename(&self, new_name: &str, reason: &str) -> Result<(), ChannelError> {
        match self.edit_name(new_name, reason).await {
            Ok(channel) => {
                let applied = channel.name.unwrap_or_else(|| new_name.to_string());
                debug!(name = %applied, "Channel renamed");
                self.set_cached(Some(applied));
                Ok(())
            }
            Err(DiscordError::Inaccessible { .. }) => {
                // Force a fresh lookup next cycle.
                self.set_cached(None);
                Err(ChannelError::NotFound(self.channel_id))
            }
            Err(e) => Err(ChannelError::RenameFailed(e.to_string())),
        }
    }
}

/// Map a non-success response to an error.
fn classify(status: StatusCode, body: String) -> DiscordError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => DiscordError::Inaccessible {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => match serde_json::from_str::<RateLimitBody>(&body) {
            Ok(limit) => DiscordError::RateLimited {
                retry_after: limit.retry_after,
            },
            Err(_) => DiscordError::Api {
                status: status.as_u16(),
                message: body,
            },
        },
        _ => DiscordError::Api {
            status: status.as_u16(),
            message: body,
        },
    }
}

/// Audit log reasons travel URL-encoded in a header.
fn encode_reason(reason: &str) -> String {
    url::form_urlencoded::byte_serialize(reason.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> DiscordChannel {
        DiscordChannel::new(123, "secret".into(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url() {
        assert_eq!(channel().url(), "https://discord.com/api/v10/channels/123");
        assert_eq!(
            channel().with_api_base("http://localhost:8080/api/").url(),
            "http://localhost:8080/api/channels/123"
        );
    }

    #[test]
    fn test_auth_header() {
        assert_eq!(channel().auth_header(), "Bot secret");
    }

    #[test]
    fn test_encode_reason() {
        assert_eq!(
            encode_reason("Update cinema name from Plex session"),
            "Update%20cinema%20name%20from%20Plex%20session"
        );
    }

    #[test]
    fn test_classify() {
        assert!(matches!(
            classify(StatusCode::NOT_FOUND, String::new()),
            DiscordError::Inaccessible { status: 404 }
        ));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, "{\"code\": 50001}".into()),
            DiscordError::Inaccessible { status: 403 }
        ));
        match classify(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"message": "You are being rate limited.", "retry_after": 64.5, "global": false}"#.into(),
        ) {
            DiscordError::RateLimited { retry_after } => assert_eq!(retry_after, 64.5),
            other => panic!("Expected RateLimited, got {other:?}"),
        }
        assert!(matches!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, "oops".into()),
            DiscordError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_parse_channel_object() {
        let json = r#"{"id": "123", "type": 2, "guild_id": "9", "name": " Cinema", "bitrate": 64000}"#;
        let c: ChannelObject = serde_json::from_str(json).unwrap();
        assert_eq!(c.name.as_deref(), Some(" Cinema"));
        assert_eq!(c.guild_id.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_cached_name_skips_request() {
        // The API base is unroutable; only the cache can answer.
        let c = channel().with_api_base("http://127.0.0.1:9");
        c.set_cached(Some(" Cinema".into()));
        assert_eq!(c.current_name().await.unwrap(), " Cinema");
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_cached() {
        let c = channel().with_api_base("http://127.0.0.1:9");
        let err = c.current_name().await.unwrap_err();
        assert!(matches!(err, ChannelError::Lookup(_)));
        assert!(c.cached().is_none());
    }
}
