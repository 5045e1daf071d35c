use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::blocks::{OutboundMessage, DRINK_ORDER_CALLBACK_ID};
use crate::conversation::{ConversationKey, ConversationManager};
use crate::events::{
    DispatchError, EventContext, EventHandlerError, HandlerResult, MessageEvent, MessageKind,
    SlackEnvelope, SlackEvent, SlackEventType,
};
use crate::hears::{HearsTable, HeardMessage, MessageHandler, Pattern};

/// Handler for non-message events, keyed by event type.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

/// Routes every inbound envelope to at most one handler.
///
/// Messages go to the sender's open dialogue if there is one, otherwise to the
/// first matching `hears` route. Other events go to the handler registered
/// for their type with `on`.
pub struct Controller {
    hears: HearsTable,
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
    conversations: Arc<ConversationManager>,
}

impl Controller {
    pub fn new(conversations: Arc<ConversationManager>) -> Self {
        Self { hears: HearsTable::new(), handlers: HashMap::new(), conversations }
    }

    pub fn hears<H>(
        &mut self,
        name: &'static str,
        patterns: Vec<Pattern>,
        kinds: &[MessageKind],
        handler: H,
    ) where
        H: MessageHandler + 'static,
    {
        self.hears.register(name, patterns, kinds, handler);
    }

    /// Registers `handler` for its event type, replacing any earlier one.
    pub fn on<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        match &envelope.event {
            SlackEvent::Message(event) => self.dispatch_message(event, ctx).await,
            SlackEvent::InteractiveAction(action) if !self.has_handler(envelope) => {
                debug!(
                    correlation_id = %ctx.correlation_id,
                    callback_id = %action.callback_id,
                    action_name = %action.action_name,
                    known_callback = action.callback_id == DRINK_ORDER_CALLBACK_ID,
                    "interactive action has no handler"
                );
                Ok(HandlerResult::Ignored)
            }
            _ => {
                let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
                    return Ok(HandlerResult::Ignored);
                };
                handler.handle(envelope, ctx).await.map_err(DispatchError::from)
            }
        }
    }

    async fn dispatch_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let key = ConversationKey::new(event.channel_id.as_str(), event.user_id.as_str());
        if let Some(outcome) = self.conversations.resume(&key, &event.text).await {
            let texts = outcome.map_err(EventHandlerError::from)?;
            return Ok(HandlerResult::Responded(
                texts
                    .into_iter()
                    .map(|text| OutboundMessage::plain(event.channel_id.as_str(), text))
                    .collect(),
            ));
        }

        let Some(route) = self.hears.find(event) else {
            debug!(
                correlation_id = %ctx.correlation_id,
                kind = event.kind.as_str(),
                "no route matched message"
            );
            return Ok(HandlerResult::Ignored);
        };

        info!(
            event_name = "router.route_matched",
            correlation_id = %ctx.correlation_id,
            route = route.name,
            kind = event.kind.as_str(),
            user_id = %event.user_id,
            "message matched route"
        );

        let heard = HeardMessage { event: event.clone(), matches: route.matches };
        route.handler.handle(&heard, ctx).await.map_err(|error| {
            warn!(
                correlation_id = %ctx.correlation_id,
                route = route.name,
                error = %error,
                "route handler failed"
            );
            DispatchError::from(error)
        })
    }

    fn has_handler(&self, envelope: &SlackEnvelope) -> bool {
        self.handlers.contains_key(&envelope.event.event_type())
    }

    pub fn route_count(&self) -> usize {
        self.hears.len()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use kopibot_db::repositories::InMemoryUserRepository;

    use super::{Controller, EventHandler};
    use crate::blocks::OutboundMessage;
    use crate::conversation::{ConversationKey, ConversationManager};
    use crate::events::{
        EventContext, EventHandlerError, HandlerResult, MessageEvent, MessageKind, SlackEnvelope,
        SlackEvent, SlackEventType,
    };
    use crate::hears::{HeardMessage, MessageHandler, Pattern};

    struct Echo;

    #[async_trait]
    impl MessageHandler for Echo {
        async fn handle(
            &self,
            heard: &HeardMessage,
            _ctx: &EventContext,
        ) -> Result<HandlerResult, EventHandlerError> {
            Ok(HandlerResult::reply(OutboundMessage::plain(
                &heard.event.channel_id,
                format!("echo:{}", heard.group(1)),
            )))
        }
    }

    struct Failing;

    #[async_trait]
    impl MessageHandler for Failing {
        async fn handle(
            &self,
            _heard: &HeardMessage,
            _ctx: &EventContext,
        ) -> Result<HandlerResult, EventHandlerError> {
            Err(EventHandlerError::Handler { handler: "failing", message: "boom".to_owned() })
        }
    }

    struct UnsupportedCounter;

    #[async_trait]
    impl EventHandler for UnsupportedCounter {
        fn event_type(&self) -> SlackEventType {
            SlackEventType::Unsupported
        }

        async fn handle(
            &self,
            _envelope: &SlackEnvelope,
            _ctx: &EventContext,
        ) -> Result<HandlerResult, EventHandlerError> {
            Ok(HandlerResult::Processed)
        }
    }

    fn controller() -> (Controller, Arc<ConversationManager>) {
        let conversations =
            Arc::new(ConversationManager::new(Arc::new(InMemoryUserRepository::default())));
        (Controller::new(conversations.clone()), conversations)
    }

    fn message(text: &str) -> SlackEnvelope {
        SlackEnvelope {
            envelope_id: "env-1".to_owned(),
            event: SlackEvent::Message(MessageEvent {
                kind: MessageKind::DirectMessage,
                channel_id: "D1".to_owned(),
                user_id: "U1".to_owned(),
                text: text.to_owned(),
                ts: "1730000000.0001".to_owned(),
            }),
        }
    }

    #[tokio::test]
    async fn routes_message_to_matching_hears_handler() {
        let (mut controller, _) = controller();
        controller.hears(
            "echo",
            vec![Pattern::regex("say (.*)").expect("pattern")],
            &[MessageKind::DirectMessage],
            Echo,
        );

        let result = controller
            .dispatch(&message("say kopi-o"), &EventContext::default())
            .await
            .expect("ok");
        assert_eq!(result, HandlerResult::reply(OutboundMessage::plain("D1", "echo:kopi-o")));
    }

    #[tokio::test]
    async fn unmatched_messages_and_unknown_events_are_ignored() {
        let (controller, _) = controller();

        let result =
            controller.dispatch(&message("anything"), &EventContext::default()).await.expect("ok");
        assert_eq!(result, HandlerResult::Ignored);

        let unsupported = SlackEnvelope {
            envelope_id: "env-2".to_owned(),
            event: SlackEvent::Unsupported { event_type: "reaction_added".to_owned() },
        };
        let result =
            controller.dispatch(&unsupported, &EventContext::default()).await.expect("ok");
        assert_eq!(result, HandlerResult::Ignored);
    }

    #[tokio::test]
    async fn on_handlers_receive_their_event_type() {
        let (mut controller, _) = controller();
        controller.on(UnsupportedCounter);

        let unsupported = SlackEnvelope {
            envelope_id: "env-3".to_owned(),
            event: SlackEvent::Unsupported { event_type: "reaction_added".to_owned() },
        };
        let result =
            controller.dispatch(&unsupported, &EventContext::default()).await.expect("ok");
        assert_eq!(result, HandlerResult::Processed);
        assert_eq!(controller.handler_count(), 1);
    }

    #[tokio::test]
    async fn open_dialogue_takes_precedence_over_routes() {
        let (mut controller, conversations) = controller();
        controller.hears(
            "echo",
            vec![Pattern::regex("say (.*)").expect("pattern")],
            &[MessageKind::DirectMessage],
            Echo,
        );
        conversations.start(ConversationKey::new("D1", "U1"), None).await;

        let result =
            controller.dispatch(&message("say Ali"), &EventContext::default()).await.expect("ok");
        assert_eq!(result.messages()[0].text, "You want me to call you `say Ali`?");
    }

    #[tokio::test]
    async fn handler_errors_surface_as_dispatch_errors() {
        let (mut controller, _) = controller();
        controller.hears(
            "failing",
            Pattern::phrases(&["boom"]).expect("patterns"),
            &[MessageKind::DirectMessage],
            Failing,
        );

        let error = controller
            .dispatch(&message("boom"), &EventContext::default())
            .await
            .expect_err("handler failure");
        assert!(error.to_string().contains("failing handler failure"));
    }
}
