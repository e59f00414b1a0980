//! Outbound message model.
//!
//! Serialize-only mirror of the platform's message objects. Constructed per
//! reply and never persisted. Flex containers are arbitrary JSON documents
//! (`serde_json::Value`) rather than a dedicated type tree.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        emojis: Option<Vec<Emoji>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        quick_reply: Option<QuickReply>,
    },
    #[serde(rename_all = "camelCase")]
    Location {
        title: String,
        address: String,
        latitude: f64,
        longitude: f64,
    },
    #[serde(rename_all = "camelCase")]
    Sticker {
        package_id: String,
        sticker_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        original_content_url: String,
        preview_image_url: String,
    },
    #[serde(rename_all = "camelCase")]
    Template {
        alt_text: String,
        template: Template,
    },
    #[serde(rename_all = "camelCase")]
    Flex {
        alt_text: String,
        contents: Value,
    },
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Message::Text {
            text: text.into(),
            emojis: None,
            quick_reply: None,
        }
    }

    pub fn text_with_emojis(text: impl Into<String>, emojis: Vec<Emoji>) -> Self {
        Message::Text {
            text: text.into(),
            emojis: Some(emojis),
            quick_reply: None,
        }
    }

    pub fn text_with_quick_reply(text: impl Into<String>, quick_reply: QuickReply) -> Self {
        Message::Text {
            text: text.into(),
            emojis: None,
            quick_reply: Some(quick_reply),
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        let url = url.into();
        Message::Image {
            original_content_url: url.clone(),
            preview_image_url: url,
        }
    }

    pub fn template(alt_text: impl Into<String>, template: Template) -> Self {
        Message::Template {
            alt_text: alt_text.into(),
            template,
        }
    }

    pub fn flex(alt_text: impl Into<String>, contents: Value) -> Self {
        Message::Flex {
            alt_text: alt_text.into(),
            contents,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Template {
    Confirm {
        text: String,
        actions: Vec<Action>,
    },
    Buttons {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        text: String,
        actions: Vec<Action>,
    },
    Carousel {
        columns: Vec<CarouselColumn>,
    },
    ImageCarousel {
        columns: Vec<ImageCarouselColumn>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselColumn {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCarouselColumn {
    pub image_url: String,
    pub action: Action,
}

/// Interactive actions attached to templates and quick replies. Wire names
/// are fixed by the platform and not uniformly cased.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Action {
    #[serde(rename = "message")]
    Message { label: String, text: String },
    #[serde(rename = "uri")]
    Uri { label: String, uri: String },
    #[serde(rename = "postback", rename_all = "camelCase")]
    Postback {
        label: String,
        data: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        display_text: Option<String>,
    },
    #[serde(rename = "datetimepicker")]
    DatetimePicker {
        label: String,
        data: String,
        mode: String,
    },
    #[serde(rename = "camera")]
    Camera { label: String },
    #[serde(rename = "cameraRoll")]
    CameraRoll { label: String },
    #[serde(rename = "location")]
    Location { label: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickReply {
    pub items: Vec<QuickReplyItem>,
}

impl QuickReply {
    pub fn new(actions: Vec<Action>) -> Self {
        QuickReply {
            items: actions.into_iter().map(QuickReplyItem::new).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickReplyItem {
    #[serde(rename = "type")]
    kind: &'static str,
    pub action: Action,
}

impl QuickReplyItem {
    pub fn new(action: Action) -> Self {
        QuickReplyItem {
            kind: "action",
            action,
        }
    }
}

/// Product emoji substituted for a `$` placeholder in a text message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Emoji {
    pub index: u32,
    pub product_id: String,
    pub emoji_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_message_wire_format() {
        let msg = Message::text("hello");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "text", "text": "hello"})
        );
    }

    #[test]
    fn text_with_emojis_wire_format() {
        let msg = Message::text_with_emojis(
            "$ hi $",
            vec![Emoji {
                index: 0,
                product_id: "5ac1bfd5040ab15980c9b435".into(),
                emoji_id: "001".into(),
            }],
        );
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "text",
                "text": "$ hi $",
                "emojis": [{"index": 0, "productId": "5ac1bfd5040ab15980c9b435", "emojiId": "001"}]
            })
        );
    }

    #[test]
    fn sticker_message_wire_format() {
        let msg = Message::Sticker {
            package_id: "1".into(),
            sticker_id: "2".into(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "sticker", "packageId": "1", "stickerId": "2"})
        );
    }

    #[test]
    fn confirm_template_wire_format() {
        let msg = Message::template(
            "Confirm alt text",
            Template::Confirm {
                text: "Do it?".into(),
                actions: vec![
                    Action::Message {
                        label: "Yes".into(),
                        text: "Yes!".into(),
                    },
                    Action::Message {
                        label: "No".into(),
                        text: "No!".into(),
                    },
                ],
            },
        );
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "template",
                "altText": "Confirm alt text",
                "template": {
                    "type": "confirm",
                    "text": "Do it?",
                    "actions": [
                        {"type": "message", "label": "Yes", "text": "Yes!"},
                        {"type": "message", "label": "No", "text": "No!"}
                    ]
                }
            })
        );
    }

    #[test]
    fn image_carousel_template_tag() {
        let msg = Message::template(
            "ImageCarousel alt text",
            Template::ImageCarousel {
                columns: vec![ImageCarouselColumn {
                    image_url: "https://example.com/a.png".into(),
                    action: Action::DatetimePicker {
                        label: "datetime".into(),
                        data: "datetime_postback".into(),
                        mode: "datetime".into(),
                    },
                }],
            },
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["template"]["type"], "image_carousel");
        assert_eq!(
            value["template"]["columns"][0]["action"]["type"],
            "datetimepicker"
        );
    }

    #[test]
    fn quick_reply_action_casing() {
        let msg = Message::text_with_quick_reply(
            "Quick reply",
            QuickReply::new(vec![
                Action::Camera {
                    label: "camera".into(),
                },
                Action::CameraRoll {
                    label: "roll".into(),
                },
            ]),
        );
        let value = serde_json::to_value(&msg).unwrap();
        let items = value["quickReply"]["items"].as_array().unwrap();
        assert_eq!(items[0]["type"], "action");
        assert_eq!(items[0]["action"]["type"], "camera");
        assert_eq!(items[1]["action"]["type"], "cameraRoll");
    }

    #[test]
    fn flex_contents_pass_through() {
        let bubble = json!({"type": "bubble", "body": {"type": "box", "layout": "vertical", "contents": []}});
        let msg = Message::flex("hello", bubble.clone());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "flex");
        assert_eq!(value["contents"], bubble);
    }
}
