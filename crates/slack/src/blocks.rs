use serde::Serialize;

pub const DRINK_ORDER_CALLBACK_ID: &str = "order_drink";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Button,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttachmentAction {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub value: String,
}

impl AttachmentAction {
    pub fn button(
        name: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            text: label.into(),
            action_type: ActionType::Button,
            value: value.into(),
        }
    }
}

/// Legacy interactive attachment; button presses come back tagged with `callback_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub text: String,
    pub fallback: String,
    pub callback_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub attachment_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AttachmentAction>,
}

/// Body of a `chat.postMessage` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl OutboundMessage {
    pub fn plain(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self { channel: channel.into(), text: text.into(), attachments: Vec::new() }
    }
}

pub struct MessageBuilder {
    channel: String,
    text: String,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self { channel: channel.into(), text: text.into(), attachments: Vec::new() }
    }

    pub fn attachment<F>(mut self, callback_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut AttachmentBuilder),
    {
        let mut builder = AttachmentBuilder::default();
        build(&mut builder);
        self.attachments.push(builder.build(callback_id.into()));
        self
    }

    pub fn build(self) -> OutboundMessage {
        OutboundMessage { channel: self.channel, text: self.text, attachments: self.attachments }
    }
}

#[derive(Default)]
pub struct AttachmentBuilder {
    text: String,
    fallback: Option<String>,
    color: Option<String>,
    actions: Vec<AttachmentAction>,
}

impl AttachmentBuilder {
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = text.into();
        self
    }

    pub fn fallback(&mut self, fallback: impl Into<String>) -> &mut Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn color(&mut self, color: impl Into<String>) -> &mut Self {
        self.color = Some(color.into());
        self
    }

    pub fn button(&mut self, action: AttachmentAction) -> &mut Self {
        self.actions.push(action);
        self
    }

    fn build(self, callback_id: String) -> Attachment {
        Attachment {
            fallback: self.fallback.unwrap_or_else(|| self.text.clone()),
            text: self.text,
            callback_id,
            color: self.color,
            attachment_type: "default".to_owned(),
            actions: self.actions,
        }
    }
}

pub fn drink_order_message(channel: &str) -> OutboundMessage {
    MessageBuilder::new(channel, "What drink would you like?")
        .attachment(DRINK_ORDER_CALLBACK_ID, |attachment| {
            attachment
                .text("What do you wanna drink?")
                .fallback("You are unable to order")
                .color("#3AA3E3")
                .button(AttachmentAction::button("Kopi", "Kopi", "kopi"))
                .button(AttachmentAction::button("Teh", "Teh", "teh"))
                .button(AttachmentAction::button("Milo", "Milo", "milo"));
        })
        .build()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{drink_order_message, MessageBuilder, OutboundMessage, DRINK_ORDER_CALLBACK_ID};

    #[test]
    fn drink_order_offers_three_buttons_under_one_callback() {
        let message = drink_order_message("D1");

        assert_eq!(message.text, "What drink would you like?");
        assert_eq!(message.attachments.len(), 1);
        let attachment = &message.attachments[0];
        assert_eq!(attachment.callback_id, DRINK_ORDER_CALLBACK_ID);
        let values: Vec<&str> =
            attachment.actions.iter().map(|action| action.value.as_str()).collect();
        assert_eq!(values, vec!["kopi", "teh", "milo"]);
    }

    #[test]
    fn drink_order_serializes_to_the_legacy_attachment_shape() {
        let value = serde_json::to_value(drink_order_message("D1")).expect("serialize");

        assert_eq!(
            value,
            json!({
                "channel": "D1",
                "text": "What drink would you like?",
                "attachments": [{
                    "text": "What do you wanna drink?",
                    "fallback": "You are unable to order",
                    "callback_id": "order_drink",
                    "color": "#3AA3E3",
                    "attachment_type": "default",
                    "actions": [
                        { "name": "Kopi", "text": "Kopi", "type": "button", "value": "kopi" },
                        { "name": "Teh", "text": "Teh", "type": "button", "value": "teh" },
                        { "name": "Milo", "text": "Milo", "type": "button", "value": "milo" }
                    ]
                }]
            })
        );
    }

    #[test]
    fn plain_messages_omit_attachments() {
        let value = serde_json::to_value(OutboundMessage::plain("C1", "Okay")).expect("serialize");
        assert_eq!(value, json!({ "channel": "C1", "text": "Okay" }));
    }

    #[test]
    fn attachment_fallback_defaults_to_its_text() {
        let message = MessageBuilder::new("C1", "hi")
            .attachment("cb", |attachment| {
                attachment.text("pick one");
            })
            .build();

        assert_eq!(message.attachments[0].fallback, "pick one");
        assert_eq!(message.attachments[0].color, None);
    }
}
