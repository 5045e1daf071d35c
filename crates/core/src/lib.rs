//! Core types for kopibot: configuration, the persisted user record and the
//! name-capture dialogue state machine. Nothing in here touches the network.

pub mod config;
pub mod dialogue;
pub mod domain;

pub use config::{AppConfig, AuthMode, ConfigError, LoadOptions, StorageConfig};
pub use dialogue::{DialogueAction, DialogueError, DialogueState, NameCaptureFlow};
pub use domain::user::{UserId, UserRecord};
