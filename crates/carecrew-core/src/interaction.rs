//! Pick-and-drop interaction: turns pointer input into service requests.
//!
//! Picking a worker only remembers a candidate. The cooldown check at pick
//! time is advisory (it lets the UI refuse the drag); the session checks
//! again when the drop arrives.

use std::time::Duration;

use crate::components::{EventDefinition, ScreenPos, TargetId, WorkerAttribute, WorkerId};
use crate::session::{ServiceOutcome, Session};

/// The host's scene graph, as far as the engine needs it
pub trait Scene {
    /// Create the visual for a freshly spawned request
    fn create_entity_for_event(&mut self, target: TargetId, event: &EventDefinition);

    /// Resolve a screen position to the request under it, if any
    fn hit_test(&self, position: ScreenPos) -> Option<TargetId>;

    /// Remove the visual of a request that left the board
    fn retire_entity(&mut self, target: TargetId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(WorkerAttribute),
    CoolingDown(Duration),
    UnknownWorker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing was being dragged
    NoCandidate,
    /// The drop did not land on a live request
    Miss,
    Resolved(ServiceOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    worker: WorkerId,
    attribute: WorkerAttribute,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionGateway {
    candidate: Option<Candidate>,
}

impl InteractionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer-down on a worker
    pub fn pick(&mut self, session: &Session, worker_id: &WorkerId) -> PickOutcome {
        let Some(worker) = session.worker(worker_id) else {
            log::debug!("Pick ignored: unknown worker {}", worker_id);
            self.candidate = None;
            return PickOutcome::UnknownWorker;
        };

        let cooldown = session.cooldown(worker_id);
        if !cooldown.is_zero() {
            log::debug!(
                "Worker {} is cooling down ({:.1}s)",
                worker_id,
                cooldown.as_secs_f32()
            );
            self.candidate = None;
            return PickOutcome::CoolingDown(cooldown);
        }

        let attribute = worker.attribute;
        self.candidate = Some(Candidate {
            worker: worker_id.clone(),
            attribute,
        });
        PickOutcome::Picked(attribute)
    }

    /// Drag released somewhere the engine does not care about
    pub fn cancel(&mut self) {
        self.candidate = None;
    }

    /// Worker currently being dragged
    pub fn candidate(&self) -> Option<&WorkerId> {
        self.candidate.as_ref().map(|c| &c.worker)
    }

    /// Pointer-up at `position`. Consumes the candidate either way.
    pub fn drop_at<S: Scene + ?Sized>(
        &mut self,
        session: &mut Session,
        scene: &S,
        position: ScreenPos,
    ) -> DropOutcome {
        let Some(candidate) = self.candidate.take() else {
            return DropOutcome::NoCandidate;
        };

        let Some(target) = scene.hit_test(position) else {
            log::debug!("Drop missed at ({:.0}, {:.0})", position.x, position.y);
            return DropOutcome::Miss;
        };

        let Some(event_id) = session.event_of(target) else {
            log::debug!("Drop on {} missed: request no longer on the board", target);
            return DropOutcome::Miss;
        };

        DropOutcome::Resolved(session.handle_service_request(
            target,
            &candidate.worker,
            candidate.attribute,
            &event_id,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EventCatalog, EventId, Worker};
    use crate::config::{GameRules, LevelConfig, SpawnCadence};

    /// Scene where everything is at the origin and one target can be hit
    #[derive(Default)]
    struct PinScene {
        under_pointer: Option<TargetId>,
    }

    impl Scene for PinScene {
        fn create_entity_for_event(&mut self, _target: TargetId, _event: &EventDefinition) {}

        fn hit_test(&self, _position: ScreenPos) -> Option<TargetId> {
            self.under_pointer
        }

        fn retire_entity(&mut self, _target: TargetId) {}
    }

    fn session() -> Session {
        let mut session = Session::new(
            GameRules::default(),
            EventCatalog::new(vec![
                EventDefinition::new("E-01", &[WorkerAttribute::Strong]),
                EventDefinition::new("E-03", &[WorkerAttribute::Smart]),
            ]),
        );
        let level = LevelConfig::new(1, Duration::from_secs(60), 3)
            .with_spawn(SpawnCadence::Fixed(1000.0))
            .with_seed(5);
        session.start_level(
            &level,
            &[
                Worker::new("a", WorkerAttribute::Strong, Duration::from_secs(3)),
                Worker::new("c", WorkerAttribute::Smart, Duration::from_secs(3)),
            ],
        );
        session
    }

    #[test]
    fn test_pick_and_drop_serves_target() {
        let mut session = session();
        let target = session.spawn_request(&EventId::new("E-03")).unwrap();
        let scene = PinScene { under_pointer: Some(target) };
        let mut gateway = InteractionGateway::new();

        assert_eq!(
            gateway.pick(&session, &WorkerId::new("c")),
            PickOutcome::Picked(WorkerAttribute::Smart)
        );
        let outcome = gateway.drop_at(&mut session, &scene, ScreenPos::new(10.0, 20.0));
        assert_eq!(
            outcome,
            DropOutcome::Resolved(ServiceOutcome::Started {
                duration: Duration::from_millis(2500)
            })
        );
        assert!(gateway.candidate().is_none());
        assert_eq!(session.cooldown(&WorkerId::new("c")), Duration::from_secs(3));
    }

    #[test]
    fn test_event_type_comes_from_the_board() {
        let mut session = session();
        let target = session.spawn_request(&EventId::new("E-01")).unwrap();
        let scene = PinScene { under_pointer: Some(target) };
        let mut gateway = InteractionGateway::new();

        // Smart worker on a Strong request: no match
        gateway.pick(&session, &WorkerId::new("c"));
        let outcome = gateway.drop_at(&mut session, &scene, ScreenPos::default());
        assert_eq!(
            outcome,
            DropOutcome::Resolved(ServiceOutcome::Started {
                duration: Duration::from_millis(5000)
            })
        );
    }

    #[test]
    fn test_miss_changes_nothing() {
        let mut session = session();
        session.spawn_request(&EventId::new("E-01")).unwrap();
        let scene = PinScene::default();
        let mut gateway = InteractionGateway::new();

        gateway.pick(&session, &WorkerId::new("a"));
        assert_eq!(
            gateway.drop_at(&mut session, &scene, ScreenPos::default()),
            DropOutcome::Miss
        );
        assert_eq!(session.active_task_count(), 0);
        assert_eq!(session.cooldown(&WorkerId::new("a")), Duration::ZERO);
    }

    #[test]
    fn test_stale_target_is_a_miss() {
        let mut session = session();
        let scene = PinScene { under_pointer: Some(TargetId(987654)) };
        let mut gateway = InteractionGateway::new();

        gateway.pick(&session, &WorkerId::new("a"));
        assert_eq!(
            gateway.drop_at(&mut session, &scene, ScreenPos::default()),
            DropOutcome::Miss
        );
    }

    #[test]
    fn test_drop_without_pick() {
        let mut session = session();
        let target = session.spawn_request(&EventId::new("E-01")).unwrap();
        let scene = PinScene { under_pointer: Some(target) };
        let mut gateway = InteractionGateway::new();

        assert_eq!(
            gateway.drop_at(&mut session, &scene, ScreenPos::default()),
            DropOutcome::NoCandidate
        );

        gateway.pick(&session, &WorkerId::new("a"));
        gateway.cancel();
        assert_eq!(
            gateway.drop_at(&mut session, &scene, ScreenPos::default()),
            DropOutcome::NoCandidate
        );
    }

    #[test]
    fn test_pick_refused_while_cooling_down() {
        let mut session = session();
        let first = session.spawn_request(&EventId::new("E-01")).unwrap();
        let scene = PinScene { under_pointer: Some(first) };
        let mut gateway = InteractionGateway::new();

        gateway.pick(&session, &WorkerId::new("a"));
        gateway.drop_at(&mut session, &scene, ScreenPos::default());

        assert_eq!(
            gateway.pick(&session, &WorkerId::new("a")),
            PickOutcome::CoolingDown(Duration::from_secs(3))
        );
        assert!(gateway.candidate().is_none());
        assert_eq!(
            gateway.pick(&session, &WorkerId::new("nobody")),
            PickOutcome::UnknownWorker
        );
    }

    #[test]
    fn test_cooldown_rechecked_at_drop() {
        let mut session = session();
        let first = session.spawn_request(&EventId::new("E-01")).unwrap();
        let second = session.spawn_request(&EventId::new("E-01")).unwrap();
        let mut gateway = InteractionGateway::new();
        let mut other = InteractionGateway::new();

        // Two drags of the same worker picked before either drop
        gateway.pick(&session, &WorkerId::new("a"));
        other.pick(&session, &WorkerId::new("a"));

        let scene = PinScene { under_pointer: Some(first) };
        assert!(matches!(
            gateway.drop_at(&mut session, &scene, ScreenPos::default()),
            DropOutcome::Resolved(ServiceOutcome::Started { .. })
        ));

        let scene = PinScene { under_pointer: Some(second) };
        assert_eq!(
            other.drop_at(&mut session, &scene, ScreenPos::default()),
            DropOutcome::Resolved(ServiceOutcome::CoolingDown(Duration::from_secs(3)))
        );
        assert!(!session.is_serving(second));
    }
}
