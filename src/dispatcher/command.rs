//! Text commands recognized by the demo bot.

/// Exact, case-sensitive command set. `BroadcastResult` is the one prefix
/// match (`broadcast <date>`); everything else must match the whole text.
/// Unrecognized text falls through to the echo reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Profile,
    Emojis,
    Quota,
    QuotaConsumption,
    Push,
    Multicast,
    Broadcast,
    BroadcastResult { date: String },
    Bye,
    Image,
    Confirm,
    Buttons,
    Carousel,
    ImageCarousel,
    Imagemap,
    Flex,
    FlexJson,
    QuickReplyDemo,
    LinkToken,
    InsightMessageDelivery,
    InsightFollowers,
    InsightDemographic,
}

impl Command {
    pub fn parse(text: &str) -> Option<Command> {
        let command = match text {
            "profile" => Command::Profile,
            "emojis" => Command::Emojis,
            "quota" => Command::Quota,
            "quota_consumption" => Command::QuotaConsumption,
            "push" => Command::Push,
            "multicast" => Command::Multicast,
            "broadcast" => Command::Broadcast,
            "bye" => Command::Bye,
            "image" => Command::Image,
            "confirm" => Command::Confirm,
            "buttons" => Command::Buttons,
            "carousel" => Command::Carousel,
            "image_carousel" => Command::ImageCarousel,
            "imagemap" => Command::Imagemap,
            "flex" => Command::Flex,
            "flex_update_1" => Command::FlexJson,
            "quick_reply" => Command::QuickReplyDemo,
            "link_token" => Command::LinkToken,
            "insight_message_delivery" => Command::InsightMessageDelivery,
            "insight_followers" => Command::InsightFollowers,
            "insight_demographic" => Command::InsightDemographic,
            _ => {
                let date = text.strip_prefix("broadcast ")?;
                Command::BroadcastResult {
                    date: date.trim().to_string(),
                }
            }
        };
        Some(command)
    }
}
