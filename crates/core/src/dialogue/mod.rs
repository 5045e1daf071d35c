pub mod engine;
pub mod states;

pub use engine::{DialogueError, NameCaptureFlow};
pub use states::{DialogueAction, DialogueState, TransitionOutcome};
