//! Routes verified webhook events to handlers.
//!
//! One verified event in, zero or more messaging API calls out. Handler
//! failures are returned to the HTTP boundary, which logs and acknowledges
//! the delivery anyway: the platform retries non-2xx responses and a reply
//! token is single-use, so a partial failure must not trigger re-delivery.

mod command;
mod text;


pub use command::Command;

use anyhow::Result;
use tracing::{info, warn};

use crate::api::MessagingApi;
use crate::api::messages::Message;
use crate::media::MediaStore;
use crate::webhook::{
    BeaconEvent, Event, FollowEvent, JoinEvent, MemberJoinedEvent, MessageContent, MessageEvent,
    PostbackEvent, Source,
};

/// Per-request context: where this server is publicly reachable, derived
/// from the inbound request's forwarding headers. Used to build URLs that
/// point back at the static tree.
#[derive(Debug, Clone)]
pub struct RequestContext {
    base_url: String,
}

impl RequestContext {
    /// `base_url` is `scheme://host` without a trailing slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// URL of a file in the media scratch directory.
    pub fn media_url(&self, name: &str) -> String {
        format!("{}/static/tmp/{}", self.base_url, name)
    }

    /// URL of a file at the top of the static tree, with https enforced;
    /// the platform rejects plain-http content URLs.
    pub fn static_url(&self, name: &str) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("https://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!("{}/static/{}", base, name)
    }
}

pub struct Dispatcher {
    api: MessagingApi,
    media: MediaStore,
}

impl Dispatcher {
    pub fn new(api: MessagingApi, media: MediaStore) -> Self {
        Self { api, media }
    }

    /// Handle one verified event.
    pub async fn dispatch(&self, event: Event, ctx: &RequestContext) -> Result<()> {
        match event {
            Event::Message(ev) => self.on_message(ev, ctx).await,
            Event::Follow(ev) => self.on_follow(ev).await,
            Event::Unfollow(ev) => {
                info!("got unfollow event: {:?}", ev.source.user_id());
                Ok(())
            }
            Event::Join(ev) => self.on_join(ev).await,
            Event::Leave(_) => {
                info!("got leave event");
                Ok(())
            }
            Event::Postback(ev) => self.on_postback(ev).await,
            Event::Beacon(ev) => self.on_beacon(ev).await,
            Event::MemberJoined(ev) => self.on_member_joined(ev).await,
            Event::MemberLeft(_) => {
                info!("got memberLeft event");
                Ok(())
            }
            Event::Unknown => {
                info!("ignoring unknown event type");
                Ok(())
            }
        }
    }

    async fn on_message(&self, event: MessageEvent, ctx: &RequestContext) -> Result<()> {
        let MessageEvent {
            reply_token,
            source,
            message,
            ..
        } = event;
        match message {
            MessageContent::Text(content) => {
                self.on_text(&reply_token, &source, &content.text, ctx).await
            }
            MessageContent::Location(content) => {
                self.api
                    .reply(
                        &reply_token,
                        vec![Message::Location {
                            title: "Location".to_string(),
                            address: content.address.unwrap_or_default(),
                            latitude: content.latitude,
                            longitude: content.longitude,
                        }],
                    )
                    .await?;
                Ok(())
            }
            MessageContent::Sticker(content) => {
                self.api
                    .reply(
                        &reply_token,
                        vec![Message::Sticker {
                            package_id: content.package_id,
                            sticker_id: content.sticker_id,
                        }],
                    )
                    .await?;
                Ok(())
            }
            MessageContent::Image(content) => {
                self.on_media(&reply_token, &content.id, "jpg", ctx).await
            }
            MessageContent::Video(content) => {
                self.on_media(&reply_token, &content.id, "mp4", ctx).await
            }
            MessageContent::Audio(content) => {
                self.on_media(&reply_token, &content.id, "m4a", ctx).await
            }
            MessageContent::File(content) => {
                self.on_file(&reply_token, &content.id, &content.file_name, ctx)
                    .await
            }
            MessageContent::Unknown => {
                info!("ignoring unknown message type");
                Ok(())
            }
        }
    }

    /// Fetch binary content, publish it to the media store, and reply with
    /// the public URL of the saved file.
    async fn on_media(
        &self,
        reply_token: &str,
        message_id: &str,
        extension: &str,
        ctx: &RequestContext,
    ) -> Result<()> {
        let bytes = self.api.message_content(message_id).await?;
        let name = self.media.save_with_extension(&bytes, extension)?;
        info!("saved {} content as {}", extension, name);
        self.api
            .reply(
                reply_token,
                vec![
                    Message::text("Save content."),
                    Message::text(ctx.media_url(&name)),
                ],
            )
            .await?;
        Ok(())
    }

    async fn on_file(
        &self,
        reply_token: &str,
        message_id: &str,
        file_name: &str,
        ctx: &RequestContext,
    ) -> Result<()> {
        let bytes = self.api.message_content(message_id).await?;
        let name = self.media.save_with_suffix(&bytes, file_name)?;
        info!("saved file content as {}", name);
        self.api
            .reply(
                reply_token,
                vec![
                    Message::text("Save file."),
                    Message::text(ctx.media_url(&name)),
                ],
            )
            .await?;
        Ok(())
    }

    async fn on_follow(&self, event: FollowEvent) -> Result<()> {
        info!("got follow event: {:?}", event.source.user_id());
        self.api
            .reply(&event.reply_token, vec![Message::text("Got follow event")])
            .await?;
        Ok(())
    }

    async fn on_join(&self, event: JoinEvent) -> Result<()> {
        self.api
            .reply(
                &event.reply_token,
                vec![Message::text(format!(
                    "Joined this {}",
                    event.source.kind()
                ))],
            )
            .await?;
        Ok(())
    }

    async fn on_postback(&self, event: PostbackEvent) -> Result<()> {
        let reply = match event.postback.data.as_str() {
            "ping" => "pong".to_string(),
            "datetime_postback" => {
                let Some(picked) = postback_param(&event, "datetime") else {
                    warn!("datetime postback without a datetime param");
                    return Ok(());
                };
                picked
            }
            "date_postback" => {
                let Some(picked) = postback_param(&event, "date") else {
                    warn!("date postback without a date param");
                    return Ok(());
                };
                picked
            }
            other => {
                info!("ignoring postback payload: {}", other);
                return Ok(());
            }
        };
        self.api
            .reply(&event.reply_token, vec![Message::text(reply)])
            .await?;
        Ok(())
    }

    async fn on_beacon(&self, event: BeaconEvent) -> Result<()> {
        let text = format!(
            "Got beacon event. hwid={}, device_message(hex string)={}",
            event.beacon.hwid,
            event.beacon.dm.unwrap_or_default()
        );
        self.api
            .reply(&event.reply_token, vec![Message::text(text)])
            .await?;
        Ok(())
    }

    async fn on_member_joined(&self, event: MemberJoinedEvent) -> Result<()> {
        let members: Vec<&str> = event
            .joined
            .members
            .iter()
            .filter_map(Source::user_id)
            .collect();
        self.api
            .reply(
                &event.reply_token,
                vec![Message::text(format!(
                    "Got memberJoined event. members={}",
                    members.join(", ")
                ))],
            )
            .await?;
        Ok(())
    }
}

fn postback_param(event: &PostbackEvent, key: &str) -> Option<String> {
    event
        .postback
        .params
        .as_ref()
        .and_then(|params| params.get(key))
        .cloned()
}
