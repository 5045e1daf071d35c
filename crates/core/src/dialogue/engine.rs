use thiserror::Error;

use crate::dialogue::states::{DialogueAction, DialogueState, TransitionOutcome};

pub const NO_NAME_YET: &str = "You haven't told me your name!";
pub const ASK_NAME: &str = "What is your name?";
pub const UPDATING_DOSSIER: &str = "Alright! I'm updating my dossier...";
pub const NEVERMIND: &str = "OK, nevermind!";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogueError {
    #[error("dialogue already finished in state `{0}`")]
    AlreadyFinished(&'static str),
}

pub fn confirm_prompt(candidate: &str) -> String {
    format!("You want me to call you `{candidate}`?")
}

/// Ask for a nickname, confirm it, and hand the result back for persistence.
///
/// Confirmation replies are matched the way the hears table matches phrases:
/// case-insensitive substring, `yes` tested before `no`.
#[derive(Clone, Debug, Default)]
pub struct NameCaptureFlow;

impl NameCaptureFlow {
    pub fn new() -> Self {
        Self
    }

    pub fn start(&self, candidate: Option<String>) -> TransitionOutcome {
        match candidate.map(|value| value.trim().to_owned()).filter(|value| !value.is_empty()) {
            Some(candidate) => TransitionOutcome {
                from: None,
                actions: vec![DialogueAction::Ask(confirm_prompt(&candidate))],
                to: DialogueState::ConfirmingName { candidate },
                repeated: false,
            },
            None => TransitionOutcome {
                from: None,
                to: DialogueState::AskingName,
                actions: vec![
                    DialogueAction::Say(NO_NAME_YET.to_owned()),
                    DialogueAction::Ask(ASK_NAME.to_owned()),
                ],
                repeated: false,
            },
        }
    }

    pub fn transition(
        &self,
        current: &DialogueState,
        reply: &str,
    ) -> Result<TransitionOutcome, DialogueError> {
        match current {
            DialogueState::AskingName => Ok(self.on_name(current, reply)),
            DialogueState::ConfirmingName { candidate } => {
                Ok(self.on_confirmation(current, candidate, reply))
            }
            DialogueState::Completed { .. } | DialogueState::Cancelled => {
                Err(DialogueError::AlreadyFinished(current.label()))
            }
        }
    }

    fn on_name(&self, current: &DialogueState, reply: &str) -> TransitionOutcome {
        let candidate = reply.trim();
        if candidate.is_empty() {
            return TransitionOutcome {
                from: Some(current.clone()),
                to: current.clone(),
                actions: vec![DialogueAction::Ask(ASK_NAME.to_owned())],
                repeated: true,
            };
        }

        TransitionOutcome {
            from: Some(current.clone()),
            to: DialogueState::ConfirmingName { candidate: candidate.to_owned() },
            actions: vec![DialogueAction::Ask(confirm_prompt(candidate))],
            repeated: false,
        }
    }

    fn on_confirmation(
        &self,
        current: &DialogueState,
        candidate: &str,
        reply: &str,
    ) -> TransitionOutcome {
        let normalized = reply.to_lowercase();

        if normalized.contains("yes") {
            return TransitionOutcome {
                from: Some(current.clone()),
                to: DialogueState::Completed { name: candidate.to_owned() },
                actions: vec![
                    DialogueAction::Say(UPDATING_DOSSIER.to_owned()),
                    DialogueAction::PersistName(candidate.to_owned()),
                ],
                repeated: false,
            };
        }

        if normalized.contains("no") {
            return TransitionOutcome {
                from: Some(current.clone()),
                to: DialogueState::Cancelled,
                actions: vec![DialogueAction::Say(NEVERMIND.to_owned())],
                repeated: false,
            };
        }

        TransitionOutcome {
            from: Some(current.clone()),
            to: current.clone(),
            actions: vec![DialogueAction::Ask(confirm_prompt(candidate))],
            repeated: true,
        }
    }
}
