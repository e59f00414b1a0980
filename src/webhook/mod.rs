//! Inbound webhook envelope and event model.
//!
//! The platform batches events into one request body; each event carries a
//! source descriptor and, for most event directions, a single-use reply
//! token. Unrecognized event and message types deserialize into `Unknown`
//! instead of failing the whole envelope.

pub mod signature;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Top-level webhook request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEnvelope {
    /// Bot user ID receiving this delivery.
    #[serde(default)]
    pub destination: String,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Message(MessageEvent),
    Follow(FollowEvent),
    Unfollow(UnfollowEvent),
    Join(JoinEvent),
    Leave(LeaveEvent),
    Postback(PostbackEvent),
    Beacon(BeaconEvent),
    MemberJoined(MemberJoinedEvent),
    MemberLeft(MemberLeftEvent),
    #[serde(other)]
    Unknown,
}

impl Event {
    /// Event type name as it appears on the wire, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Message(_) => "message",
            Event::Follow(_) => "follow",
            Event::Unfollow(_) => "unfollow",
            Event::Join(_) => "join",
            Event::Leave(_) => "leave",
            Event::Postback(_) => "postback",
            Event::Beacon(_) => "beacon",
            Event::MemberJoined(_) => "memberJoined",
            Event::MemberLeft(_) => "memberLeft",
            Event::Unknown => "unknown",
        }
    }
}

/// Where an event came from: a 1:1 chat, a group, or a room. A closed set;
/// the platform defines exactly these three.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Source {
    #[serde(rename_all = "camelCase")]
    User { user_id: String },
    #[serde(rename_all = "camelCase")]
    Group {
        group_id: String,
        #[serde(default)]
        user_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Room {
        room_id: String,
        #[serde(default)]
        user_id: Option<String>,
    },
}

impl Source {
    /// The sending user's ID, when the platform includes one.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Source::User { user_id } => Some(user_id),
            Source::Group { user_id, .. } | Source::Room { user_id, .. } => user_id.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Source::User { .. } => "user",
            Source::Group { .. } => "group",
            Source::Room { .. } => "room",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub reply_token: String,
    pub source: Source,
    pub message: MessageContent,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text(TextContent),
    Location(LocationContent),
    Sticker(StickerContent),
    Image(MediaContent),
    Video(MediaContent),
    Audio(MediaContent),
    File(FileContent),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationContent {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerContent {
    pub id: String,
    pub package_id: String,
    pub sticker_id: String,
}

/// Image, video, and audio messages carry no payload inline, only an ID to
/// fetch the binary content with.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContent {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    pub id: String,
    pub file_name: String,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEvent {
    pub reply_token: String,
    pub source: Source,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfollowEvent {
    pub source: Source,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEvent {
    pub reply_token: String,
    pub source: Source,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveEvent {
    pub source: Source,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostbackEvent {
    pub reply_token: String,
    pub source: Source,
    pub postback: Postback,
}

/// Opaque data payload chosen by the bot when it offered an interactive
/// action, plus picker parameters when the action was a datetime picker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Postback {
    pub data: String,
    #[serde(default)]
    pub params: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconEvent {
    pub reply_token: String,
    pub source: Source,
    pub beacon: Beacon,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beacon {
    pub hwid: String,
    #[serde(rename = "type")]
    pub beacon_type: String,
    /// Device message, a hex string set by the beacon hardware.
    #[serde(default)]
    pub dm: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberJoinedEvent {
    pub reply_token: String,
    pub source: Source,
    pub joined: Members,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLeftEvent {
    pub source: Source,
    pub left: Members,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Members {
    pub members: Vec<Source>,
}
