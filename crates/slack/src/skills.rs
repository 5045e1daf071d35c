//! The bot's behaviour: every handler registered on the controller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use kopibot_core::domain::user::{UserId, UserRecord};
use kopibot_db::UserRepository;

use crate::blocks::{drink_order_message, OutboundMessage};
use crate::controller::{Controller, EventHandler};
use crate::conversation::{ConversationKey, ConversationManager};
use crate::events::{
    EventContext, EventHandlerError, HandlerResult, MessageKind, SlackEnvelope, SlackEvent,
    SlackEventType,
};
use crate::hears::{HeardMessage, MessageHandler, Pattern};

pub const CHANNEL_JOIN_GREETING: &str = "I'm here! ✨✨✨";
pub const GREETING_REPLY: &str = "What's up!✨";
pub const INSTALLED_INTRO: &str = "I am a bot that has just joined your team";
pub const INSTALLED_INVITE_HINT: &str =
    "You must now /invite me to a channel so that I can be of use!";
pub const POD_BAY_REFUSAL: &str = "I'm sorry, Dave. I'm afraid I can't do that.";
pub const DOOR_ACK: &str = "Okay";
pub const SWEAR_WORDS: &[&str] = &["shit", "knnbccb", "bullshit", "damn", "fuck"];

/// Shared capabilities handed to every skill at registration time.
#[derive(Clone)]
pub struct BotContext {
    pub users: Arc<dyn UserRepository>,
    pub conversations: Arc<ConversationManager>,
}

impl BotContext {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        let conversations = Arc::new(ConversationManager::new(users.clone()));
        Self { users, conversations }
    }
}

/// Builds a controller with every skill registered, in match priority order.
pub fn build_controller(ctx: &BotContext) -> Result<Controller, regex::Error> {
    let mut controller = Controller::new(ctx.conversations.clone());
    register_skills(&mut controller, ctx)?;
    Ok(controller)
}

pub fn register_skills(controller: &mut Controller, ctx: &BotContext) -> Result<(), regex::Error> {
    use MessageKind::{DirectMention, DirectMessage, Mention};

    controller.on(ChannelJoinGreeting);
    controller.on(InstallationGreeting);

    controller.hears("greeting", Pattern::phrases(&["hello", "hey"])?, &[DirectMessage], Greeting);
    controller.hears(
        "remember_name",
        vec![Pattern::regex("call me (.*)")?, Pattern::regex("my name is (.*)")?],
        &[DirectMessage],
        RememberName { users: ctx.users.clone() },
    );
    controller.hears(
        "recall_name",
        vec![Pattern::phrase("what is my name?")?],
        &[DirectMessage],
        RecallName { users: ctx.users.clone(), conversations: ctx.conversations.clone() },
    );
    controller.hears(
        "swear_jar",
        Pattern::phrases(SWEAR_WORDS)?,
        &[DirectMessage],
        SwearJar { users: ctx.users.clone() },
    );
    controller.hears(
        "kopi_time",
        vec![Pattern::phrase("kopi time")?],
        &[DirectMessage, DirectMention],
        KopiTime,
    );
    controller.hears(
        "open_doors",
        vec![Pattern::regex("open the (.*) doors")?],
        &[DirectMessage, DirectMention, Mention],
        OpenDoors,
    );

    Ok(())
}

/// Read path shared by the skills: storage failures read as "no record".
async fn load_user(users: &dyn UserRepository, user_id: &str) -> UserRecord {
    let id = UserId::from(user_id);
    match users.find_by_id(&id).await {
        Ok(Some(user)) => user,
        Ok(None) => UserRecord::new(id),
        Err(error) => {
            warn!(
                event_name = "storage.user_read_failed",
                user_id,
                error = %error,
                "user lookup failed; continuing with a fresh record"
            );
            UserRecord::new(id)
        }
    }
}

async fn store_user(users: &dyn UserRepository, user: UserRecord) {
    let user_id = user.id.clone();
    if let Err(error) = users.save(user).await {
        warn!(
            event_name = "storage.user_write_failed",
            user_id = %user_id,
            error = %error,
            "user save failed; replying anyway"
        );
    }
}

/// Fetch-or-default, overwrite the name, save. Returns the confirmation text.
pub(crate) async fn remember_name(
    users: &dyn UserRepository,
    user_id: &str,
    name: &str,
) -> String {
    let mut user = load_user(users, user_id).await;
    user.set_name(name);
    let reply = format!("Got it. I will call you {name} from now on.");
    store_user(users, user).await;
    reply
}

pub fn door_reply(door_type: &str) -> &'static str {
    if door_type.trim().eq_ignore_ascii_case("pod bay") {
        POD_BAY_REFUSAL
    } else {
        DOOR_ACK
    }
}

pub struct ChannelJoinGreeting;

#[async_trait]
impl EventHandler for ChannelJoinGreeting {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ChannelJoin
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ChannelJoin(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        Ok(HandlerResult::reply(OutboundMessage::plain(&event.channel_id, CHANNEL_JOIN_GREETING)))
    }
}

/// Opens a private conversation with whoever installed the app.
pub struct InstallationGreeting;

#[async_trait]
impl EventHandler for InstallationGreeting {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Installation
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Installation(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        let Some(installer) = event.installer_user_id.as_deref() else {
            debug!(team_id = %event.team_id, "installation without installer; nobody to greet");
            return Ok(HandlerResult::Processed);
        };

        Ok(HandlerResult::Responded(vec![
            OutboundMessage::plain(installer, INSTALLED_INTRO),
            OutboundMessage::plain(installer, INSTALLED_INVITE_HINT),
        ]))
    }
}

pub struct Greeting;

#[async_trait]
impl MessageHandler for Greeting {
    async fn handle(
        &self,
        heard: &HeardMessage,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        debug!(user_id = %heard.event.user_id, "ayee");
        Ok(HandlerResult::reply(OutboundMessage::plain(&heard.event.channel_id, GREETING_REPLY)))
    }
}

/// "call me X" / "my name is X": stores the name straight away, no confirmation.
pub struct RememberName {
    users: Arc<dyn UserRepository>,
}

#[async_trait]
impl MessageHandler for RememberName {
    async fn handle(
        &self,
        heard: &HeardMessage,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let reply =
            remember_name(self.users.as_ref(), &heard.event.user_id, heard.group(1)).await;
        Ok(HandlerResult::reply(OutboundMessage::plain(&heard.event.channel_id, reply)))
    }
}

/// "what is my name?": answers from storage or asks for a name.
pub struct RecallName {
    users: Arc<dyn UserRepository>,
    conversations: Arc<ConversationManager>,
}

#[async_trait]
impl MessageHandler for RecallName {
    async fn handle(
        &self,
        heard: &HeardMessage,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let channel = &heard.event.channel_id;
        let user = load_user(self.users.as_ref(), &heard.event.user_id).await;

        if let Some(name) = user.name.as_deref() {
            return Ok(HandlerResult::reply(OutboundMessage::plain(
                channel,
                format!("Your name is {name}"),
            )));
        }

        let key = ConversationKey::new(channel.as_str(), heard.event.user_id.as_str());
        let texts = self.conversations.start(key, None).await;
        Ok(HandlerResult::Responded(
            texts.into_iter().map(|text| OutboundMessage::plain(channel, text)).collect(),
        ))
    }
}

/// Counts profanity per sender; each user ID has its own jar.
pub struct SwearJar {
    users: Arc<dyn UserRepository>,
}

#[async_trait]
impl MessageHandler for SwearJar {
    async fn handle(
        &self,
        heard: &HeardMessage,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let mut user = load_user(self.users.as_ref(), &heard.event.user_id).await;
        let count = user.bump_counter();
        store_user(self.users.as_ref(), user).await;

        Ok(HandlerResult::reply(OutboundMessage::plain(
            &heard.event.channel_id,
            format!("+1 to the swear jarrr. Current swearjar count is {count}"),
        )))
    }
}

/// Posts the drink buttons. Presses come back as `order_drink` interactive
/// actions, which nothing handles yet.
pub struct KopiTime;

#[async_trait]
impl MessageHandler for KopiTime {
    async fn handle(
        &self,
        heard: &HeardMessage,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        Ok(HandlerResult::reply(drink_order_message(&heard.event.channel_id)))
    }
}

pub struct OpenDoors;

#[async_trait]
impl MessageHandler for OpenDoors {
    async fn handle(
        &self,
        heard: &HeardMessage,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        Ok(HandlerResult::reply(OutboundMessage::plain(
            &heard.event.channel_id,
            door_reply(heard.group(1)),
        )))
    }
}
