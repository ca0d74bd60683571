//! Event components: what elders ask for, and the work in progress on them.

use std::collections::BTreeSet;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::common::{EventId, WorkerId};
use super::worker::WorkerAttribute;

/// A category of request. Loaded once from configuration, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: EventId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Bubble color hint for the scene (`#rrggbb`)
    #[serde(default)]
    pub color: String,
    /// Attributes that count as a perfect match. Any one of them is enough.
    #[serde(rename = "required")]
    pub required_attributes: BTreeSet<WorkerAttribute>,
}

impl EventDefinition {
    pub fn new(id: impl Into<String>, required: &[WorkerAttribute]) -> Self {
        Self {
            id: EventId::new(id),
            name: String::new(),
            description: String::new(),
            color: String::new(),
            required_attributes: required.iter().copied().collect(),
        }
    }

    pub fn with_display(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        self.name = name.into();
        self.description = description.into();
        self.color = color.into();
        self
    }

    /// Whether a worker with this attribute is a perfect match
    pub fn matches(&self, attribute: WorkerAttribute) -> bool {
        self.required_attributes.contains(&attribute)
    }
}

/// The configured set of event types, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCatalog {
    events: Vec<EventDefinition>,
}

impl EventCatalog {
    pub fn new(events: Vec<EventDefinition>) -> Self {
        Self { events }
    }

    pub fn get(&self, id: &EventId) -> Option<&EventDefinition> {
        self.events.iter().find(|e| &e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventDefinition> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pick an event type uniformly at random
    pub fn choose(&self, rng: &mut impl Rng) -> Option<&EventDefinition> {
        self.events.choose(rng)
    }
}

/// A live request on the board. Attached to every board entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub event_id: EventId,
    /// Session time at which the request appeared
    pub spawned_at: Duration,
}

/// Work in progress on a request - present only while a worker is serving it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTask {
    pub worker: WorkerId,
    pub assigned_attribute: WorkerAttribute,
    pub remaining: Duration,
    pub total: Duration,
}

impl ServiceTask {
    pub fn new(worker: WorkerId, assigned_attribute: WorkerAttribute, duration: Duration) -> Self {
        Self {
            worker,
            assigned_attribute,
            remaining: duration,
            total: duration,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Fraction of the work done, 0.0 to 1.0
    pub fn progress(&self) -> f32 {
        if self.total.is_zero() {
            return 1.0;
        }
        1.0 - self.remaining.as_secs_f32() / self.total.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_event_matches_any_required() {
        let event = EventDefinition::new(
            "E-05",
            &[WorkerAttribute::Strong, WorkerAttribute::Smart],
        );
        assert!(event.matches(WorkerAttribute::Strong));
        assert!(event.matches(WorkerAttribute::Smart));
        assert!(!event.matches(WorkerAttribute::Talkative));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = EventCatalog::new(vec![
            EventDefinition::new("E-01", &[WorkerAttribute::Strong]),
            EventDefinition::new("E-02", &[WorkerAttribute::Talkative]),
        ]);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get(&EventId::new("E-02")).is_some());
        assert!(catalog.get(&EventId::new("E-99")).is_none());
    }

    #[test]
    fn test_catalog_choose_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(EventCatalog::default().choose(&mut rng).is_none());
    }

    #[test]
    fn test_task_progress() {
        let mut task = ServiceTask::new(
            WorkerId::new("w"),
            WorkerAttribute::Strong,
            Duration::from_secs(4),
        );
        assert_eq!(task.progress(), 0.0);
        task.remaining = Duration::from_secs(1);
        assert!((task.progress() - 0.75).abs() < 0.001);
        assert!(!task.is_complete());
        task.remaining = Duration::ZERO;
        assert!(task.is_complete());
    }
}
