//! Systems - logic that runs against components each frame

mod cooldown;
mod service;
mod spawner;

pub use cooldown::*;
pub use service::*;
pub use spawner::*;
