//! Identifiers and small value types shared across the engine.

use std::fmt;
use std::time::Duration;

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Identifier of a worker, as written in the roster configuration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an event type (`E-01` ...), as written in the catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one live request on the board.
///
/// Allocated by the session when a request spawns; the scene is told this id
/// when it creates the visual and hands it back from hit tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl TargetId {
    pub(crate) fn from_entity(entity: Entity) -> Self {
        Self(entity.to_bits().get())
    }

    pub(crate) fn entity(self) -> Option<Entity> {
        Entity::from_bits(self.0)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

/// Pointer position in screen space, passed through to the scene's hit test
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

impl ScreenPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Serde adapter storing a `Duration` as fractional seconds.
///
/// Rejects negative, NaN, infinite and out-of-range values instead of
/// panicking in `Duration::from_secs_f64`.
pub mod duration_secs {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        super::secs_to_duration(secs)
            .ok_or_else(|| D::Error::custom(format!("invalid duration in seconds: {}", secs)))
    }
}

/// Convert seconds to a `Duration`. `None` for negative input, NaN, or
/// anything too large to represent.
pub fn secs_to_duration(secs: f64) -> Option<Duration> {
    if secs >= 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_id_entity_roundtrip() {
        let mut world = hecs::World::new();
        let entity = world.spawn(());
        let target = TargetId::from_entity(entity);
        assert_eq!(target.entity(), Some(entity));
    }

    #[test]
    fn test_zero_target_is_not_an_entity() {
        assert_eq!(TargetId(0).entity(), None);
    }

    #[test]
    fn test_secs_to_duration() {
        assert_eq!(secs_to_duration(2.5), Some(Duration::from_millis(2500)));
        assert_eq!(secs_to_duration(0.0), Some(Duration::ZERO));
        assert_eq!(secs_to_duration(-1.0), None);
        assert_eq!(secs_to_duration(f64::NAN), None);
        assert_eq!(secs_to_duration(f64::INFINITY), None);
    }

    #[test]
    fn test_secs_to_duration_too_large() {
        assert_eq!(secs_to_duration(1e20), None);
        assert_eq!(secs_to_duration(1e300), None);
        assert!(secs_to_duration(1e15).is_some());
    }
}
