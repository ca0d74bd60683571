//! CareCrew Core - real-time session engine
//!
//! Elders appear on the board asking for help; the player drags social
//! workers onto them. A worker whose attribute matches the request finishes
//! faster, every worker rests for a while afterwards, and the level is won
//! if enough requests were served before the countdown runs out.
//!
//! # Architecture
//!
//! - **Components**: plain data (workers, event definitions, service tasks)
//! - **Systems**: the service-time resolver, the cooldown ledger and the
//!   spawn controller
//! - **Session**: owns score, countdown and the board of live requests
//!   (an ECS `hecs::World`), and runs the systems in a fixed order
//! - **Clock**: turns host timestamps into a bounded per-frame delta
//! - **Engine**: composition root wiring the above to the host's scene and
//!   presentation layers
//!
//! # Example
//!
//! ```rust,no_run
//! use carecrew_core::prelude::*;
//! use std::time::Instant;
//!
//! struct Headless;
//! impl Scene for Headless {
//!     fn create_entity_for_event(&mut self, _target: TargetId, _event: &EventDefinition) {}
//!     fn hit_test(&self, _position: ScreenPos) -> Option<TargetId> { None }
//!     fn retire_entity(&mut self, _target: TargetId) {}
//! }
//!
//! let mut engine = GameEngine::new(GameConfig::default(), Headless, NullPresenter)?;
//! engine.start_level(1);
//! engine.start(Instant::now());
//!
//! loop {
//!     engine.frame(Instant::now());
//! }
//! # Ok::<(), ConfigError>(())
//! ```

pub mod clock;
pub mod components;
pub mod config;
pub mod engine;
pub mod interaction;
pub mod session;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::clock::{Clock, Updatable};
    pub use crate::components::*;
    pub use crate::config::{ConfigError, GameConfig, GameRules, LevelConfig, SpawnCadence};
    pub use crate::engine::{GameEngine, NullPresenter, Presenter};
    pub use crate::interaction::{DropOutcome, InteractionGateway, PickOutcome, Scene};
    pub use crate::session::{
        ServiceOutcome, Session, SessionEvent, SessionStatus, Verdict,
    };
}
