//! Session state - score, countdown, the board of live requests, and the
//! win/loss decision for one play-through.
//!
//! The board is an ECS world: every live request is an entity carrying a
//! [`ServiceRequest`], and a [`ServiceTask`] is attached while a worker is on
//! it. An entity can hold only one `ServiceTask`, so a request can never be
//! served twice at once.
//!
//! Nothing here calls out to rendering or UI. Everything the outside world
//! should hear about is queued as a [`SessionEvent`] and drained by the host
//! once per frame.

use std::time::Duration;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::Updatable;
use crate::components::{
    EventCatalog, EventId, ServiceRequest, ServiceTask, TargetId, Worker, WorkerAttribute,
    WorkerId,
};
use crate::config::{GameConfig, GameRules, LevelConfig};
use crate::systems::{service_duration, CooldownLedger, SpawnController};

/// Coarse lifecycle of a play-through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Idle,
    Playing,
    Finished,
}

/// Result of a finished level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Win,
    Lose,
}

/// Outbound notification, queued during `update`/`handle_service_request`
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LevelStarted { level: u32 },
    /// A new request appeared; the scene should create its visual
    Spawned { target: TargetId, event_id: EventId },
    /// A request left the board; the scene should remove its visual
    Retired { target: TargetId },
    ServiceStarted {
        target: TargetId,
        worker: WorkerId,
        duration: Duration,
    },
    ScoreChanged(u32),
    /// Countdown in `MM:SS`, only queued when the text changes
    CountdownChanged(String),
    CooldownChanged { worker: WorkerId, remaining: Duration },
    Finished { verdict: Verdict, score: u32 },
}

/// What happened to a service request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOutcome {
    Started { duration: Duration },
    NotPlaying,
    UnknownTarget,
    AlreadyServing,
    CoolingDown(Duration),
}

impl ServiceOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, ServiceOutcome::Started { .. })
    }
}

pub struct Session {
    rules: GameRules,
    catalog: EventCatalog,
    board: World,
    cooldowns: CooldownLedger,
    spawner: SpawnController,
    rng: StdRng,

    status: SessionStatus,
    verdict: Option<Verdict>,
    level_id: Option<u32>,
    score: u32,
    target_count: u32,
    time_remaining: Duration,
    elapsed: Duration,
    countdown_display: String,

    outbox: Vec<SessionEvent>,
}

impl Session {
    /// Create an idle session. Call [`Session::start_level`] to play.
    pub fn new(rules: GameRules, catalog: EventCatalog) -> Self {
        let mut rng = StdRng::from_entropy();
        let spawner =
            SpawnController::new(rules.default_cadence(), rules.max_active_requests, &mut rng);

        Self {
            rules,
            catalog,
            board: World::new(),
            cooldowns: CooldownLedger::new(),
            spawner,
            rng,
            status: SessionStatus::Idle,
            verdict: None,
            level_id: None,
            score: 0,
            target_count: 0,
            time_remaining: Duration::ZERO,
            elapsed: Duration::ZERO,
            countdown_display: format_countdown(Duration::ZERO),
            outbox: Vec::new(),
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.rules.clone(), config.events.clone())
    }

    /// Reset everything and enter `Playing`. Valid from any status.
    pub fn start_level(&mut self, level: &LevelConfig, roster: &[Worker]) {
        let live: Vec<Entity> = self.board.iter().map(|e| e.entity()).collect();
        for entity in live {
            self.outbox.push(SessionEvent::Retired {
                target: TargetId::from_entity(entity),
            });
        }
        self.board.clear();

        self.rng = match level.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.spawner = SpawnController::new(
            level.cadence(&self.rules),
            level.concurrency_cap(&self.rules),
            &mut self.rng,
        );
        self.cooldowns.reset(roster);

        self.status = SessionStatus::Playing;
        self.verdict = None;
        self.level_id = Some(level.id);
        self.score = 0;
        self.target_count = level.target_count;
        self.time_remaining = level.time_limit;
        self.elapsed = Duration::ZERO;
        self.countdown_display = format_countdown(self.time_remaining);

        log::info!(
            "Level {} started: {:.0}s, target {}, {} workers",
            level.id,
            level.time_limit.as_secs_f32(),
            level.target_count,
            roster.len()
        );

        self.outbox.push(SessionEvent::LevelStarted { level: level.id });
        self.outbox.push(SessionEvent::ScoreChanged(0));
        self.outbox
            .push(SessionEvent::CountdownChanged(self.countdown_display.clone()));
        for worker in roster {
            self.outbox.push(SessionEvent::CooldownChanged {
                worker: worker.id.clone(),
                remaining: Duration::ZERO,
            });
        }
    }

    /// Advance the session by `dt`. No-op unless `Playing`.
    ///
    /// Order per frame: countdown, spawning, cooldowns, service progress.
    /// When the countdown hits zero the level ends and the remaining steps
    /// are skipped.
    pub fn update(&mut self, dt: Duration) {
        if self.status != SessionStatus::Playing {
            return;
        }
        self.elapsed += dt;

        // Countdown
        self.time_remaining = self.time_remaining.saturating_sub(dt);
        self.refresh_countdown();
        if self.time_remaining.is_zero() {
            self.finish();
            return;
        }

        // Spawning
        let live = self.live_count();
        if let Some(event_id) = self.spawner.tick(dt, live, &self.catalog, &mut self.rng) {
            self.spawn(event_id);
        }

        // Cooldowns
        for (worker, remaining) in self.cooldowns.tick(dt) {
            self.outbox
                .push(SessionEvent::CooldownChanged { worker, remaining });
        }

        // Service progress
        let mut completed = Vec::new();
        for (entity, task) in self.board.query_mut::<&mut ServiceTask>() {
            task.remaining = task.remaining.saturating_sub(dt);
            if task.is_complete() {
                completed.push(entity);
            }
        }
        for entity in completed {
            self.complete_service(entity);
        }
    }

    /// Assign a worker to a live request.
    ///
    /// Rejected without any state change when the level is not running, the
    /// target is not on the board, the target is already being served, or
    /// the worker is still cooling down.
    pub fn handle_service_request(
        &mut self,
        target: TargetId,
        worker_id: &WorkerId,
        attribute: WorkerAttribute,
        event_id: &EventId,
    ) -> ServiceOutcome {
        if self.status != SessionStatus::Playing {
            log::debug!("Service request for {} ignored: level not running", target);
            return ServiceOutcome::NotPlaying;
        }

        let Some(entity) = target.entity().filter(|e| self.board.contains(*e)) else {
            log::debug!("Service request for {} ignored: not on the board", target);
            return ServiceOutcome::UnknownTarget;
        };

        if self.board.get::<&ServiceTask>(entity).is_ok() {
            log::debug!("Service request for {} ignored: already being served", target);
            return ServiceOutcome::AlreadyServing;
        }

        let cooldown = self.cooldowns.query(worker_id);
        if !cooldown.is_zero() {
            log::debug!(
                "Service request for {} ignored: worker {} cooling down ({:.1}s)",
                target,
                worker_id,
                cooldown.as_secs_f32()
            );
            return ServiceOutcome::CoolingDown(cooldown);
        }

        let duration = service_duration(attribute, event_id, &self.catalog, &self.rules);
        let task = ServiceTask::new(worker_id.clone(), attribute, duration);
        if self.board.insert_one(entity, task).is_err() {
            return ServiceOutcome::UnknownTarget;
        }

        if let Some(remaining) = self.cooldowns.start(worker_id) {
            self.outbox.push(SessionEvent::CooldownChanged {
                worker: worker_id.clone(),
                remaining,
            });
        }

        log::info!(
            "Service started: {} ({}) on {} [{}], {:.1}s",
            worker_id,
            attribute,
            target,
            event_id,
            duration.as_secs_f32()
        );
        self.outbox.push(SessionEvent::ServiceStarted {
            target,
            worker: worker_id.clone(),
            duration,
        });

        ServiceOutcome::Started { duration }
    }

    /// Put a request on the board directly, bypassing the spawn cadence
    /// (scripted levels, tutorials). Still honors the concurrency cap.
    pub fn spawn_request(&mut self, event_id: &EventId) -> Option<TargetId> {
        if self.status != SessionStatus::Playing {
            return None;
        }
        if self.catalog.get(event_id).is_none() {
            log::warn!("Cannot spawn unknown event type {}", event_id);
            return None;
        }
        if self.live_count() >= self.spawner.max_concurrent() {
            log::debug!("Scripted spawn of {} skipped: board is full", event_id);
            return None;
        }
        Some(self.spawn(event_id.clone()))
    }

    /// Take every queued notification, oldest first
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn spawn(&mut self, event_id: EventId) -> TargetId {
        let entity = self.board.spawn((ServiceRequest {
            event_id: event_id.clone(),
            spawned_at: self.elapsed,
        },));
        let target = TargetId::from_entity(entity);
        log::debug!("Spawned {} as {}", event_id, target);
        self.outbox.push(SessionEvent::Spawned { target, event_id });
        target
    }

    fn complete_service(&mut self, entity: Entity) {
        let target = TargetId::from_entity(entity);
        let task = self.board.remove_one::<ServiceTask>(entity).ok();
        let _ = self.board.despawn(entity);

        self.score = self.score.saturating_add(self.rules.score_per_event);
        if let Some(task) = task {
            log::info!(
                "Service complete: {} finished {}, score {}",
                task.worker,
                target,
                self.score
            );
        }

        self.outbox.push(SessionEvent::ScoreChanged(self.score));
        self.outbox.push(SessionEvent::Retired { target });
    }

    fn finish(&mut self) {
        self.status = SessionStatus::Finished;
        let verdict = if self.score >= self.target_count {
            Verdict::Win
        } else {
            Verdict::Lose
        };
        self.verdict = Some(verdict);

        log::info!(
            "Level {} finished: {:?} (score {}/{})",
            self.level_id.unwrap_or_default(),
            verdict,
            self.score,
            self.target_count
        );
        self.outbox.push(SessionEvent::Finished {
            verdict,
            score: self.score,
        });
    }

    fn refresh_countdown(&mut self) {
        let display = format_countdown(self.time_remaining);
        if display != self.countdown_display {
            self.countdown_display = display;
            self.outbox
                .push(SessionEvent::CountdownChanged(self.countdown_display.clone()));
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Set once the countdown has run out
    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    pub fn level_id(&self) -> Option<u32> {
        self.level_id
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn target_count(&self) -> u32 {
        self.target_count
    }

    pub fn time_remaining(&self) -> Duration {
        self.time_remaining
    }

    /// Session time played since the level started
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn countdown_display(&self) -> &str {
        &self.countdown_display
    }

    /// Requests currently on the board, served or not
    pub fn live_count(&self) -> usize {
        self.board.len() as usize
    }

    pub fn active_task_count(&self) -> usize {
        self.board.query::<&ServiceTask>().iter().count()
    }

    pub fn active_tasks(&self) -> Vec<(TargetId, ServiceTask)> {
        self.board
            .query::<&ServiceTask>()
            .iter()
            .map(|(entity, task)| (TargetId::from_entity(entity), task.clone()))
            .collect()
    }

    /// Every live request with its event type, in board order
    pub fn requests(&self) -> Vec<(TargetId, ServiceRequest)> {
        self.board
            .query::<&ServiceRequest>()
            .iter()
            .map(|(entity, request)| (TargetId::from_entity(entity), request.clone()))
            .collect()
    }

    pub fn task(&self, target: TargetId) -> Option<ServiceTask> {
        let entity = target.entity()?;
        self.board
            .get::<&ServiceTask>(entity)
            .ok()
            .map(|task| (*task).clone())
    }

    pub fn is_serving(&self, target: TargetId) -> bool {
        self.task(target).is_some()
    }

    /// Event type of a live request
    pub fn event_of(&self, target: TargetId) -> Option<EventId> {
        let entity = target.entity()?;
        self.board
            .get::<&ServiceRequest>(entity)
            .ok()
            .map(|request| request.event_id.clone())
    }

    pub fn cooldown(&self, worker_id: &WorkerId) -> Duration {
        self.cooldowns.query(worker_id)
    }

    pub fn worker(&self, worker_id: &WorkerId) -> Option<&Worker> {
        self.cooldowns.worker(worker_id)
    }

    pub fn cooldowns(&self) -> &CooldownLedger {
        &self.cooldowns
    }

    pub fn spawner(&self) -> &SpawnController {
        &self.spawner
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }
}

impl Updatable for Session {
    fn update(&mut self, dt: Duration) {
        Session::update(self, dt);
    }
}

/// Countdown text as shown on the HUD, whole seconds rounded down
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
