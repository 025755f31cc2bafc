//! Business logic services for the bot.
//!
//! # Services
//!
//! - `session` - Pure recording state machine (debounce, duration cap, pause)
//! - `recorder` - Drives the camera from motion edges
//! - `notify` - Role-filtered fan-out of alerts and recordings
//! - `interactions` - Pending multi-step command flows

pub mod interactions;
pub mod notify;
pub mod recorder;
pub mod session;

pub use interactions::{Choice, Flow, Interactions, Pending, TOKEN_DAY_CHOICES, TokenStage};
pub use notify::{DeliveryReport, Notifier};
pub use recorder::{Recorder, RecorderStatus, START_ALERT};
pub use session::{Phase, Session, StopReason, TickOutcome};
