use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use kopibot_core::dialogue::{DialogueAction, DialogueError, DialogueState, NameCaptureFlow};
use kopibot_db::UserRepository;

use crate::skills::remember_name;

/// One open dialogue per user per channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub channel_id: String,
    pub user_id: String,
}

impl ConversationKey {
    pub fn new(channel_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { channel_id: channel_id.into(), user_id: user_id.into() }
    }
}

/// Suspended name-capture dialogues, resumed by the next message from the
/// same user in the same channel. Finished dialogues are dropped.
pub struct ConversationManager {
    flow: NameCaptureFlow,
    users: Arc<dyn UserRepository>,
    open: Mutex<HashMap<ConversationKey, DialogueState>>,
}

impl ConversationManager {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { flow: NameCaptureFlow::new(), users, open: Mutex::new(HashMap::new()) }
    }

    /// Opens (or restarts) a dialogue and returns the texts to send.
    pub async fn start(&self, key: ConversationKey, candidate: Option<String>) -> Vec<String> {
        let outcome = self.flow.start(candidate);
        info!(
            event_name = "dialogue.started",
            user_id = %key.user_id,
            channel_id = %key.channel_id,
            state = outcome.to.label(),
            "name capture dialogue opened"
        );
        let texts = self.perform(&key, outcome.actions).await;
        self.open.lock().await.insert(key, outcome.to);
        texts
    }

    /// Feeds `reply` into the open dialogue for `key`. `None` when no
    /// dialogue is open, so the message falls through to the hears table.
    pub async fn resume(
        &self,
        key: &ConversationKey,
        reply: &str,
    ) -> Option<Result<Vec<String>, DialogueError>> {
        let outcome = {
            let mut open = self.open.lock().await;
            let current = open.get(key)?;
            match self.flow.transition(current, reply) {
                Ok(outcome) => {
                    if outcome.to.is_terminal() {
                        open.remove(key);
                    } else {
                        open.insert(key.clone(), outcome.to.clone());
                    }
                    outcome
                }
                Err(error) => {
                    open.remove(key);
                    return Some(Err(error));
                }
            }
        };

        info!(
            event_name = "dialogue.transition",
            user_id = %key.user_id,
            channel_id = %key.channel_id,
            from = outcome.from.as_ref().map(DialogueState::label).unwrap_or("none"),
            to = outcome.to.label(),
            repeated = outcome.repeated,
            "name capture dialogue advanced"
        );

        Some(Ok(self.perform(key, outcome.actions).await))
    }

    pub async fn state(&self, key: &ConversationKey) -> Option<DialogueState> {
        self.open.lock().await.get(key).cloned()
    }

    pub async fn open_count(&self) -> usize {
        self.open.lock().await.len()
    }

    async fn perform(&self, key: &ConversationKey, actions: Vec<DialogueAction>) -> Vec<String> {
        let mut texts = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                DialogueAction::Say(text) | DialogueAction::Ask(text) => texts.push(text),
                DialogueAction::PersistName(name) => {
                    texts.push(remember_name(self.users.as_ref(), &key.user_id, &name).await);
                }
            }
        }
        texts
    }
}
