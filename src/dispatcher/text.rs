//! Handlers for text-message commands.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::{Command, Dispatcher, RequestContext};
use crate::api::messages::{
    Action, CarouselColumn, Emoji, ImageCarouselColumn, Message, QuickReply, Template,
};
use crate::webhook::Source;

/// Flex bubble used by the `flex_update_1` command, kept verbatim as the
/// JSON document a designer would export from the flex simulator.
const HOTEL_BUBBLE_JSON: &str = r##"
{
  "type": "bubble",
  "body": {
    "type": "box",
    "layout": "vertical",
    "contents": [
      {
        "type": "image",
        "url": "https://scdn.line-apps.com/n/channel_devcenter/img/flexsnapshot/clip/clip3.jpg",
        "position": "relative",
        "size": "full",
        "aspectMode": "cover",
        "aspectRatio": "1:1",
        "gravity": "center"
      },
      {
        "type": "box",
        "layout": "horizontal",
        "contents": [
          {
            "type": "box",
            "layout": "vertical",
            "contents": [
              {
                "type": "text",
                "text": "Brown Hotel",
                "weight": "bold",
                "size": "xl",
                "color": "#ffffff"
              },
              {
                "type": "box",
                "layout": "baseline",
                "margin": "md",
                "contents": [
                  {
                    "type": "icon",
                    "size": "sm",
                    "url": "https://scdn.line-apps.com/n/channel_devcenter/img/fx/review_gold_star_28.png"
                  },
                  {
                    "type": "icon",
                    "size": "sm",
                    "url": "https://scdn.line-apps.com/n/channel_devcenter/img/fx/review_gold_star_28.png"
                  },
                  {
                    "type": "icon",
                    "size": "sm",
                    "url": "https://scdn.line-apps.com/n/channel_devcenter/img/fx/review_gold_star_28.png"
                  },
                  {
                    "type": "icon",
                    "size": "sm",
                    "url": "https://scdn.line-apps.com/n/channel_devcenter/img/fx/review_gold_star_28.png"
                  },
                  {
                    "type": "icon",
                    "size": "sm",
                    "url": "https://scdn.line-apps.com/n/channel_devcenter/img/fx/review_gray_star_28.png"
                  },
                  {
                    "type": "text",
                    "text": "4.0",
                    "size": "sm",
                    "color": "#d6d6d6",
                    "margin": "md",
                    "flex": 0
                  }
                ]
              }
            ]
          },
          {
            "type": "box",
            "layout": "vertical",
            "contents": [
              {
                "type": "text",
                "text": "¥62,000",
                "color": "#a9a9a9",
                "decoration": "line-through",
                "align": "end"
              },
              {
                "type": "text",
                "text": "¥42,000",
                "color": "#ebebeb",
                "size": "xl",
                "align": "end"
              }
            ]
          }
        ],
        "position": "absolute",
        "offsetBottom": "0px",
        "offsetStart": "0px",
        "offsetEnd": "0px",
        "backgroundColor": "#00000099",
        "paddingAll": "20px"
      },
      {
        "type": "box",
        "layout": "vertical",
        "contents": [
          {
            "type": "text",
            "text": "SALE",
            "color": "#ffffff"
          }
        ],
        "position": "absolute",
        "backgroundColor": "#ff2600",
        "cornerRadius": "20px",
        "paddingAll": "5px",
        "offsetTop": "10px",
        "offsetEnd": "10px",
        "paddingStart": "10px",
        "paddingEnd": "10px"
      }
    ],
    "paddingAll": "0px"
  }
}
"##;

impl Dispatcher {
    pub(super) async fn on_text(
        &self,
        reply_token: &str,
        source: &Source,
        text: &str,
        ctx: &RequestContext,
    ) -> Result<()> {
        let Some(command) = Command::parse(text) else {
            return self.echo(reply_token, text).await;
        };
        match command {
            Command::Profile => self.cmd_profile(reply_token, source).await,
            Command::Emojis => self.cmd_emojis(reply_token).await,
            Command::Quota => self.cmd_quota(reply_token).await,
            Command::QuotaConsumption => self.cmd_quota_consumption(reply_token).await,
            Command::Push => self.cmd_push(source).await,
            Command::Multicast => self.cmd_multicast(source).await,
            Command::Broadcast => self.cmd_broadcast().await,
            Command::BroadcastResult { date } => {
                self.cmd_broadcast_result(reply_token, &date).await
            }
            Command::Bye => self.cmd_bye(reply_token, source).await,
            Command::Image => self.cmd_image(reply_token, ctx).await,
            Command::Confirm => self.cmd_confirm(reply_token).await,
            Command::Buttons => self.cmd_buttons(reply_token).await,
            Command::Carousel => self.cmd_carousel(reply_token).await,
            Command::ImageCarousel => self.cmd_image_carousel(reply_token).await,
            Command::Imagemap => Ok(()),
            Command::Flex => self.cmd_flex(reply_token).await,
            Command::FlexJson => self.cmd_flex_json(reply_token).await,
            Command::QuickReplyDemo => self.cmd_quick_reply(reply_token).await,
            // Only meaningful from a 1:1 chat; anything else gets the echo.
            Command::LinkToken => match source {
                Source::User { user_id } => self.cmd_link_token(reply_token, user_id).await,
                _ => self.echo(reply_token, text).await,
            },
            Command::InsightMessageDelivery => {
                self.cmd_insight_message_delivery(reply_token).await
            }
            Command::InsightFollowers => self.cmd_insight_followers(reply_token).await,
            Command::InsightDemographic => self.cmd_insight_demographic(reply_token).await,
        }
    }

    async fn echo(&self, reply_token: &str, text: &str) -> Result<()> {
        self.api
            .reply(reply_token, vec![Message::text(text)])
            .await?;
        Ok(())
    }

    async fn cmd_profile(&self, reply_token: &str, source: &Source) -> Result<()> {
        let Source::User { user_id } = source else {
            self.api
                .reply(
                    reply_token,
                    vec![Message::text("Bot can't use profile API without user ID")],
                )
                .await?;
            return Ok(());
        };
        let profile = self.api.profile(user_id).await?;
        self.api
            .reply(
                reply_token,
                vec![
                    Message::text(format!("Display name: {}", profile.display_name)),
                    Message::text(format!(
                        "Status message: {}",
                        profile.status_message.unwrap_or_default()
                    )),
                ],
            )
            .await?;
        Ok(())
    }

    async fn cmd_emojis(&self, reply_token: &str) -> Result<()> {
        let emojis = vec![
            Emoji {
                index: 0,
                product_id: "5ac1bfd5040ab15980c9b435".to_string(),
                emoji_id: "001".to_string(),
            },
            Emoji {
                index: 13,
                product_id: "5ac1bfd5040ab15980c9b435".to_string(),
                emoji_id: "002".to_string(),
            },
        ];
        self.api
            .reply(
                reply_token,
                vec![Message::text_with_emojis("$ LINE emoji $", emojis)],
            )
            .await?;
        Ok(())
    }

    async fn cmd_quota(&self, reply_token: &str) -> Result<()> {
        let quota = self.api.message_quota().await?;
        self.api
            .reply(
                reply_token,
                vec![
                    Message::text(format!("type: {}", quota.kind)),
                    Message::text(format!("value: {}", fmt_count(quota.value))),
                ],
            )
            .await?;
        Ok(())
    }

    async fn cmd_quota_consumption(&self, reply_token: &str) -> Result<()> {
        let consumption = self.api.quota_consumption().await?;
        self.api
            .reply(
                reply_token,
                vec![Message::text(format!(
                    "total usage: {}",
                    consumption.total_usage
                ))],
            )
            .await?;
        Ok(())
    }

    async fn cmd_push(&self, source: &Source) -> Result<()> {
        let Some(user_id) = source.user_id() else {
            warn!("push command without a sender user ID");
            return Ok(());
        };
        self.api.push(user_id, vec![Message::text("PUSH!")]).await?;
        Ok(())
    }

    async fn cmd_multicast(&self, source: &Source) -> Result<()> {
        let Some(user_id) = source.user_id() else {
            warn!("multicast command without a sender user ID");
            return Ok(());
        };
        self.api
            .multicast(
                &[user_id.to_string()],
                vec![Message::text(
                    "THIS IS A MULTICAST MESSAGE, but it's slower than PUSH.",
                )],
            )
            .await?;
        Ok(())
    }

    async fn cmd_broadcast(&self) -> Result<()> {
        self.api
            .broadcast(vec![Message::text("THIS IS A BROADCAST MESSAGE")])
            .await?;
        Ok(())
    }

    async fn cmd_broadcast_result(&self, reply_token: &str, date: &str) -> Result<()> {
        info!("getting broadcast result for {}", date);
        let result = self.api.broadcast_delivery_count(date).await?;
        self.api
            .reply(
                reply_token,
                vec![
                    Message::text(format!("Number of sent broadcast messages: {}", date)),
                    Message::text(format!("status: {}", result.status)),
                    Message::text(format!("success: {}", fmt_count(result.success))),
                ],
            )
            .await?;
        Ok(())
    }

    async fn cmd_bye(&self, reply_token: &str, source: &Source) -> Result<()> {
        match source {
            Source::Group { group_id, .. } => {
                self.api
                    .reply(reply_token, vec![Message::text("Leaving group")])
                    .await?;
                self.api.leave_group(group_id).await?;
            }
            Source::Room { room_id, .. } => {
                self.api
                    .reply(reply_token, vec![Message::text("Leaving room")])
                    .await?;
                self.api.leave_room(room_id).await?;
            }
            Source::User { .. } => {
                self.api
                    .reply(
                        reply_token,
                        vec![Message::text("Bot can't leave from 1:1 chat")],
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn cmd_image(&self, reply_token: &str, ctx: &RequestContext) -> Result<()> {
        let url = ctx.static_url("logo.png");
        info!("image url={}", url);
        self.api
            .reply(reply_token, vec![Message::image(url)])
            .await?;
        Ok(())
    }

    async fn cmd_confirm(&self, reply_token: &str) -> Result<()> {
        let template = Template::Confirm {
            text: "Do it?".to_string(),
            actions: vec![
                Action::Message {
                    label: "Yes".to_string(),
                    text: "Yes!".to_string(),
                },
                Action::Message {
                    label: "No".to_string(),
                    text: "No!".to_string(),
                },
            ],
        };
        self.api
            .reply(
                reply_token,
                vec![Message::template("Confirm alt text", template)],
            )
            .await?;
        Ok(())
    }

    async fn cmd_buttons(&self, reply_token: &str) -> Result<()> {
        let template = Template::Buttons {
            title: Some("My buttons sample".to_string()),
            text: "Hello, my buttons".to_string(),
            actions: vec![
                Action::Uri {
                    label: "Go to line.me".to_string(),
                    uri: "https://line.me".to_string(),
                },
                Action::Postback {
                    label: "ping".to_string(),
                    data: "ping".to_string(),
                    display_text: None,
                },
                Action::Postback {
                    label: "ping with text".to_string(),
                    data: "ping".to_string(),
                    display_text: Some("ping".to_string()),
                },
                Action::Message {
                    label: "Translate Rice".to_string(),
                    text: "米".to_string(),
                },
            ],
        };
        self.api
            .reply(
                reply_token,
                vec![Message::template("Buttons alt text", template)],
            )
            .await?;
        Ok(())
    }

    async fn cmd_carousel(&self, reply_token: &str) -> Result<()> {
        let template = Template::Carousel {
            columns: vec![
                CarouselColumn {
                    thumbnail_image_url: None,
                    title: Some("fuga1".to_string()),
                    text: "hoge1".to_string(),
                    actions: vec![
                        Action::Uri {
                            label: "Go to line.me".to_string(),
                            uri: "https://line.me".to_string(),
                        },
                        Action::Postback {
                            label: "ping".to_string(),
                            data: "ping".to_string(),
                            display_text: None,
                        },
                    ],
                },
                CarouselColumn {
                    thumbnail_image_url: None,
                    title: Some("fuga2".to_string()),
                    text: "hoge2".to_string(),
                    actions: vec![
                        Action::Postback {
                            label: "ping with text".to_string(),
                            data: "ping".to_string(),
                            display_text: Some("ping".to_string()),
                        },
                        Action::Message {
                            label: "Translate Rice".to_string(),
                            text: "米".to_string(),
                        },
                    ],
                },
            ],
        };
        self.api
            .reply(
                reply_token,
                vec![Message::template("Carousel alt text", template)],
            )
            .await?;
        Ok(())
    }

    async fn cmd_image_carousel(&self, reply_token: &str) -> Result<()> {
        let template = Template::ImageCarousel {
            columns: vec![
                ImageCarouselColumn {
                    image_url: "https://via.placeholder.com/1024x1024".to_string(),
                    action: Action::DatetimePicker {
                        label: "datetime".to_string(),
                        data: "datetime_postback".to_string(),
                        mode: "datetime".to_string(),
                    },
                },
                ImageCarouselColumn {
                    image_url: "https://via.placeholder.com/1024x1024".to_string(),
                    action: Action::DatetimePicker {
                        label: "date".to_string(),
                        data: "date_postback".to_string(),
                        mode: "date".to_string(),
                    },
                },
            ],
        };
        self.api
            .reply(
                reply_token,
                vec![Message::template("ImageCarousel alt text", template)],
            )
            .await?;
        Ok(())
    }

    async fn cmd_flex(&self, reply_token: &str) -> Result<()> {
        let bubble = json!({
            "type": "bubble",
            "direction": "ltr",
            "hero": {
                "type": "image",
                "url": "https://example.com/cafe.jpg",
                "size": "full",
                "aspectRatio": "20:13",
                "aspectMode": "cover",
                "action": {"type": "uri", "label": "label", "uri": "http://example.com"}
            },
            "body": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    {"type": "text", "text": "Brown Cafe", "weight": "bold", "size": "xl"},
                    {
                        "type": "box",
                        "layout": "baseline",
                        "margin": "md",
                        "contents": [
                            {"type": "icon", "size": "sm", "url": "https://example.com/gold_star.png"},
                            {"type": "icon", "size": "sm", "url": "https://example.com/grey_star.png"},
                            {"type": "icon", "size": "sm", "url": "https://example.com/gold_star.png"},
                            {"type": "icon", "size": "sm", "url": "https://example.com/gold_star.png"},
                            {"type": "icon", "size": "sm", "url": "https://example.com/grey_star.png"},
                            {"type": "text", "text": "4.0", "size": "sm", "color": "#999999", "margin": "md", "flex": 0}
                        ]
                    },
                    {
                        "type": "box",
                        "layout": "vertical",
                        "margin": "lg",
                        "spacing": "sm",
                        "contents": [
                            {
                                "type": "box",
                                "layout": "baseline",
                                "spacing": "sm",
                                "contents": [
                                    {"type": "text", "text": "Place", "color": "#aaaaaa", "size": "sm", "flex": 1},
                                    {"type": "text", "text": "Shinjuku, Tokyo", "wrap": true, "color": "#666666", "size": "sm", "flex": 5}
                                ]
                            },
                            {
                                "type": "box",
                                "layout": "baseline",
                                "spacing": "sm",
                                "contents": [
                                    {"type": "text", "text": "Time", "color": "#aaaaaa", "size": "sm", "flex": 1},
                                    {"type": "text", "text": "10:00 - 23:00", "wrap": true, "color": "#666666", "size": "sm", "flex": 5}
                                ]
                            }
                        ]
                    }
                ]
            },
            "footer": {
                "type": "box",
                "layout": "vertical",
                "spacing": "sm",
                "contents": [
                    {
                        "type": "button",
                        "style": "link",
                        "height": "sm",
                        "action": {"type": "uri", "label": "CALL", "uri": "tel:000000"}
                    },
                    {"type": "separator"},
                    {
                        "type": "button",
                        "style": "link",
                        "height": "sm",
                        "action": {"type": "uri", "label": "WEBSITE", "uri": "https://example.com"}
                    }
                ]
            }
        });
        self.api
            .reply(reply_token, vec![Message::flex("hello", bubble)])
            .await?;
        Ok(())
    }

    async fn cmd_flex_json(&self, reply_token: &str) -> Result<()> {
        let contents: serde_json::Value =
            serde_json::from_str(HOTEL_BUBBLE_JSON).context("embedded flex document")?;
        self.api
            .reply(reply_token, vec![Message::flex("hello", contents)])
            .await?;
        Ok(())
    }

    async fn cmd_quick_reply(&self, reply_token: &str) -> Result<()> {
        let quick_reply = QuickReply::new(vec![
            Action::Postback {
                label: "label1".to_string(),
                data: "data1".to_string(),
                display_text: None,
            },
            Action::Message {
                label: "label2".to_string(),
                text: "text2".to_string(),
            },
            Action::DatetimePicker {
                label: "label3".to_string(),
                data: "data3".to_string(),
                mode: "date".to_string(),
            },
            Action::Camera {
                label: "label4".to_string(),
            },
            Action::CameraRoll {
                label: "label5".to_string(),
            },
            Action::Location {
                label: "label6".to_string(),
            },
        ]);
        self.api
            .reply(
                reply_token,
                vec![Message::text_with_quick_reply("Quick reply", quick_reply)],
            )
            .await?;
        Ok(())
    }

    async fn cmd_link_token(&self, reply_token: &str, user_id: &str) -> Result<()> {
        let token = self.api.issue_link_token(user_id).await?;
        self.api
            .reply(
                reply_token,
                vec![Message::text(format!("link_token: {}", token.link_token))],
            )
            .await?;
        Ok(())
    }

    async fn cmd_insight_message_delivery(&self, reply_token: &str) -> Result<()> {
        let today = Utc::now().format("%Y%m%d").to_string();
        let insight = self.api.insight_message_delivery(&today).await?;
        let messages = if insight.status == "ready" {
            vec![
                Message::text(format!("broadcast: {}", fmt_count(insight.broadcast))),
                Message::text(format!("targeting: {}", fmt_count(insight.targeting))),
            ]
        } else {
            vec![Message::text(format!("status: {}", insight.status))]
        };
        self.api.reply(reply_token, messages).await?;
        Ok(())
    }

    async fn cmd_insight_followers(&self, reply_token: &str) -> Result<()> {
        let today = Utc::now().format("%Y%m%d").to_string();
        let insight = self.api.insight_followers(&today).await?;
        let messages = if insight.status == "ready" {
            vec![
                Message::text(format!("followers: {}", fmt_count(insight.followers))),
                Message::text(format!(
                    "targetedReaches: {}",
                    fmt_count(insight.targeted_reaches)
                )),
                Message::text(format!("blocks: {}", fmt_count(insight.blocks))),
            ]
        } else {
            vec![Message::text(format!("status: {}", insight.status))]
        };
        self.api.reply(reply_token, messages).await?;
        Ok(())
    }

    async fn cmd_insight_demographic(&self, reply_token: &str) -> Result<()> {
        let insight = self.api.insight_demographic().await?;
        let messages = if insight.available {
            insight
                .genders
                .iter()
                .map(|bucket| Message::text(format!("{}: {}", bucket.gender, bucket.percentage)))
                .collect()
        } else {
            vec![Message::text("available: false")]
        };
        self.api.reply(reply_token, messages).await?;
        Ok(())
    }
}

fn fmt_count(value: Option<u64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}
