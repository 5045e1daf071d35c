use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueState {
    AskingName,
    ConfirmingName { candidate: String },
    Completed { name: String },
    Cancelled,
}

impl DialogueState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Cancelled)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AskingName => "asking_name",
            Self::ConfirmingName { .. } => "confirming_name",
            Self::Completed { .. } => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueAction {
    /// Plain statement; does not wait for a reply.
    Say(String),
    /// Prompt whose answer is the next reply fed into the flow.
    Ask(String),
    /// Terminal side effect: store the confirmed name on the user record.
    PersistName(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: Option<DialogueState>,
    pub to: DialogueState,
    pub actions: Vec<DialogueAction>,
    pub repeated: bool,
}
