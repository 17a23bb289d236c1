//! Platform-agnostic core: simulation, signal protocol and shell state,
//! shared by the browser app and the headless CLI

pub mod achievements;
pub mod catalog;
pub mod chat;
pub mod collaborator;
pub mod config;
pub mod entities;
pub mod error;
pub mod gemini;
pub mod geo;
pub mod interaction;
pub mod messages;
pub mod modifiers;
pub mod publisher;
pub mod render;
pub mod rng;
pub mod session;
pub mod shell;
pub mod signal;
pub mod simulation;
pub mod store;
pub mod terminal;

pub use achievements::{AchievementId, Achievements};
pub use collaborator::{
    respond_or_fallback, summarize_or_fallback, Collaborator, GenerateRequest, RequestKind,
};
pub use config::SandboxConfig;
pub use entities::{EntityId, GeoCoord, Mode, Point, Rgb};
pub use error::{CollaboratorError, ConfigError, SignalError};
pub use geo::GeoStatus;
pub use interaction::{DropPayload, InteractionEvent, Placed};
pub use modifiers::{GlobalModifiers, Modifier, Modifiers};
pub use publisher::Snapshot;
pub use render::{DrawList, Rgba, Shape};
pub use rng::{RandomSource, SystemRandom};
pub use session::{FrameReport, SandboxSession};
pub use shell::Shell;
pub use signal::{Envelope, SignalBus, SignalEvent, CHANNEL_NAME};
pub use simulation::Bounds;
