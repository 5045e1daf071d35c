use thiserror::Error;

use kopibot_core::dialogue::DialogueError;

use crate::blocks::OutboundMessage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    Message(MessageEvent),
    ChannelJoin(ChannelJoinEvent),
    Installation(InstallationEvent),
    InteractiveAction(InteractiveActionEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::Message(event) => SlackEventType::Message(event.kind),
            Self::ChannelJoin(_) => SlackEventType::ChannelJoin,
            Self::Installation(_) => SlackEventType::Installation,
            Self::InteractiveAction(_) => SlackEventType::InteractiveAction,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    Message(MessageKind),
    ChannelJoin,
    Installation,
    InteractiveAction,
    Unsupported,
}

/// How a message reached the bot.
///
/// `DirectMention` starts with `@bot`, `Mention` names the bot elsewhere in
/// the text, `Ambient` is any other channel chatter. The transport strips the
/// leading mention before the text reaches the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    DirectMessage,
    DirectMention,
    Mention,
    Ambient,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectMessage => "direct_message",
            Self::DirectMention => "direct_mention",
            Self::Mention => "mention",
            Self::Ambient => "ambient",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub kind: MessageKind,
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
    pub ts: String,
}

/// The bot itself was added to a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelJoinEvent {
    pub channel_id: String,
}

/// A team finished installing the app. Custom integrations never see this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallationEvent {
    pub team_id: String,
    pub installer_user_id: Option<String>,
}

/// A button from an interactive attachment was pressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractiveActionEvent {
    pub channel_id: String,
    pub user_id: String,
    pub callback_id: String,
    pub action_name: String,
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Vec<OutboundMessage>),
    Processed,
    Ignored,
}

impl HandlerResult {
    pub fn reply(message: OutboundMessage) -> Self {
        Self::Responded(vec![message])
    }

    pub fn messages(&self) -> &[OutboundMessage] {
        match self {
            Self::Responded(messages) => messages,
            Self::Processed | Self::Ignored => &[],
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Dialogue(#[from] DialogueError),
    #[error("{handler} handler failure: {message}")]
    Handler { handler: &'static str, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}
