//! Client for the platform messaging API.
//!
//! One `reqwest::Client` shared across all requests, authenticated with the
//! channel access token. JSON endpoints live on the API host; binary message
//! content is fetched from the separate blob host. Both hosts can be pointed
//! at a test server.

pub mod messages;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::LinecrabError;
use messages::Message;

const API_BASE: &str = "https://api.line.me";
const BLOB_BASE: &str = "https://api-data.line.me";

type ApiResult<T> = Result<T, LinecrabError>;

#[derive(Debug, Clone)]
pub struct MessagingApi {
    http: reqwest::Client,
    access_token: String,
    api_base: String,
    blob_base: String,
}

impl MessagingApi {
    pub fn new(access_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            access_token: access_token.into(),
            api_base: API_BASE.to_string(),
            blob_base: BLOB_BASE.to_string(),
        }
    }

    /// Point the client at alternative hosts (test servers).
    pub fn with_base_urls(mut self, api_base: impl Into<String>, blob_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.blob_base = blob_base.into();
        self
    }

    pub async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> ApiResult<()> {
        self.post_json(
            "/v2/bot/message/reply",
            &ReplyRequest {
                reply_token,
                messages: &messages,
            },
        )
        .await
    }

    pub async fn push(&self, to: &str, messages: Vec<Message>) -> ApiResult<()> {
        self.post_json(
            "/v2/bot/message/push",
            &PushRequest {
                to,
                messages: &messages,
            },
        )
        .await
    }

    pub async fn multicast(&self, to: &[String], messages: Vec<Message>) -> ApiResult<()> {
        self.post_json(
            "/v2/bot/message/multicast",
            &MulticastRequest {
                to,
                messages: &messages,
            },
        )
        .await
    }

    pub async fn broadcast(&self, messages: Vec<Message>) -> ApiResult<()> {
        self.post_json(
            "/v2/bot/message/broadcast",
            &BroadcastRequest {
                messages: &messages,
            },
        )
        .await
    }

    pub async fn profile(&self, user_id: &str) -> ApiResult<Profile> {
        self.get_json(&format!("/v2/bot/profile/{}", user_id)).await
    }

    pub async fn message_quota(&self) -> ApiResult<Quota> {
        self.get_json("/v2/bot/message/quota").await
    }

    pub async fn quota_consumption(&self) -> ApiResult<QuotaConsumption> {
        self.get_json("/v2/bot/message/quota/consumption").await
    }

    /// Delivery count for broadcast messages sent on `date` (`YYYYMMDD`).
    pub async fn broadcast_delivery_count(&self, date: &str) -> ApiResult<DeliveryCount> {
        self.get_json(&format!("/v2/bot/message/delivery/broadcast?date={}", date))
            .await
    }

    pub async fn leave_group(&self, group_id: &str) -> ApiResult<()> {
        self.post_empty(&format!("/v2/bot/group/{}/leave", group_id))
            .await
    }

    pub async fn leave_room(&self, room_id: &str) -> ApiResult<()> {
        self.post_empty(&format!("/v2/bot/room/{}/leave", room_id))
            .await
    }

    pub async fn issue_link_token(&self, user_id: &str) -> ApiResult<LinkToken> {
        let response = self
            .http
            .post(format!("{}/v2/bot/user/{}/linkToken", self.api_base, user_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn insight_message_delivery(&self, date: &str) -> ApiResult<MessageDeliveryInsight> {
        self.get_json(&format!("/v2/bot/insight/message/delivery?date={}", date))
            .await
    }

    pub async fn insight_followers(&self, date: &str) -> ApiResult<FollowersInsight> {
        self.get_json(&format!("/v2/bot/insight/followers?date={}", date))
            .await
    }

    pub async fn insight_demographic(&self) -> ApiResult<DemographicInsight> {
        self.get_json("/v2/bot/insight/demographic").await
    }

    /// Fetch the binary content of an image/video/audio/file message.
    pub async fn message_content(&self, message_id: &str) -> ApiResult<Vec<u8>> {
        let response = self
            .http
            .get(format!(
                "{}/v2/bot/message/{}/content",
                self.blob_base, message_id
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(Self::check(response).await?.bytes().await?.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> ApiResult<T> {
        let response = self
            .http
            .get(format!("{}{}", self.api_base, path_and_query))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        let response = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn post_empty(&self, path: &str) -> ApiResult<()> {
        let response = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Surface non-2xx responses as typed errors carrying the response body.
    async fn check(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        if let Some(request_id) = response
            .headers()
            .get("x-line-request-id")
            .and_then(|v| v.to_str().ok())
        {
            debug!("x-line-request-id: {}", request_id);
        }
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(LinecrabError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: &'a [Message],
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: &'a [Message],
}

#[derive(Serialize)]
struct MulticastRequest<'a> {
    to: &'a [String],
    messages: &'a [Message],
}

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    messages: &'a [Message],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub picture_url: Option<String>,
}

/// Monthly message quota. `value` is absent when the quota type is `none`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quota {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaConsumption {
    pub total_usage: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCount {
    pub status: String,
    #[serde(default)]
    pub success: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkToken {
    pub link_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeliveryInsight {
    pub status: String,
    #[serde(default)]
    pub broadcast: Option<u64>,
    #[serde(default)]
    pub targeting: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowersInsight {
    pub status: String,
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(default)]
    pub targeted_reaches: Option<u64>,
    #[serde(default)]
    pub blocks: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicInsight {
    pub available: bool,
    #[serde(default)]
    pub genders: Vec<GenderBucket>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderBucket {
    pub gender: String,
    pub percentage: f64,
}
