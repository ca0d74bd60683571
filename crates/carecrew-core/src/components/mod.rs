//! Component definitions for the session engine.
//!
//! Components are pure data structs. Behavior lives in systems and in the
//! session that drives them.

mod common;
mod event;
mod worker;

pub use common::*;
pub use event::*;
pub use worker::*;
