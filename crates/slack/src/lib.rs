//! Slack side of kopibot.
//!
//! - **Events** (`events`) - envelopes the transport delivers and what handlers return
//! - **Routing** (`hears`, `controller`) - ordered pattern routes plus per-event handlers
//! - **Dialogues** (`conversation`) - open name-capture dialogues keyed by channel and user
//! - **Skills** (`skills`) - everything the bot actually says
//! - **Replies** (`blocks`, `reply`) - message payloads and where they are posted
//! - **Socket Mode** (`socket`) - connection loop with optional reconnection
//!
//! ```text
//! SocketTransport → SocketModeRunner → Controller → open dialogue | hears route | on handler
//!                          ↓
//!                     ReplySink ← OutboundMessage
//! ```

pub mod blocks;
pub mod controller;
pub mod conversation;
pub mod events;
pub mod hears;
pub mod reply;
pub mod skills;
pub mod socket;

pub use controller::{Controller, EventHandler};
pub use reply::{LogReplySink, ReplySink, WebApiReplySink};
pub use skills::{build_controller, BotContext};
pub use socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner, SocketTransport};
