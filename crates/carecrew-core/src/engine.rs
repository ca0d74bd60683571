//! Game engine - composition root wiring clock, session and input to the
//! host's scene and presentation layers.

use std::time::{Duration, Instant};

use crate::clock::{Clock, Updatable};
use crate::components::{ScreenPos, TargetId, WorkerId};
use crate::config::{ConfigError, GameConfig};
use crate::interaction::{DropOutcome, InteractionGateway, PickOutcome, Scene};
use crate::session::{Session, SessionEvent, Verdict};

/// HUD and other one-way display hooks. Every method defaults to a no-op.
pub trait Presenter {
    fn score_changed(&mut self, _score: u32) {}

    fn countdown_changed(&mut self, _display: &str) {}

    fn cooldown_changed(&mut self, _worker: &WorkerId, _remaining: Duration) {}

    fn service_started(&mut self, _target: TargetId, _worker: &WorkerId, _duration: Duration) {}

    fn session_finished(&mut self, _verdict: Verdict, _score: u32) {}
}

/// Presenter that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

/// Main engine
pub struct GameEngine<S: Scene, P: Presenter> {
    config: GameConfig,
    clock: Clock,
    session: Session,
    gateway: InteractionGateway,
    scene: S,
    presenter: P,
}

impl<S: Scene, P: Presenter> GameEngine<S, P> {
    /// Validate `config` and build an engine with an idle session
    pub fn new(config: GameConfig, scene: S, presenter: P) -> Result<Self, ConfigError> {
        config.validate()?;
        let session = Session::from_config(&config);
        Ok(Self {
            config,
            clock: Clock::new(),
            session,
            gateway: InteractionGateway::new(),
            scene,
            presenter,
        })
    }

    /// Start (or restart) the level with the given id. Returns `false` for
    /// an unknown id, leaving the current session untouched.
    pub fn start_level(&mut self, level_id: u32) -> bool {
        let Some(level) = self.config.level(level_id) else {
            log::warn!("Unknown level {}", level_id);
            return false;
        };
        self.gateway.cancel();
        self.session.start_level(level, &self.config.workers);
        self.dispatch();
        true
    }

    /// Begin or resume frame ticking
    pub fn start(&mut self, now: Instant) {
        self.clock.start(now);
    }

    /// Pause frame ticking; the session is kept as is
    pub fn stop(&mut self) {
        self.clock.stop();
    }

    /// Run one frame. Returns the delta used, `None` while paused.
    pub fn frame(&mut self, now: Instant) -> Option<Duration> {
        let mut systems: [&mut dyn Updatable; 1] = [&mut self.session];
        let dt = self.clock.frame(now, &mut systems);
        self.dispatch();
        dt
    }

    /// Pointer-down on a worker portrait
    pub fn pick(&mut self, worker_id: &WorkerId) -> PickOutcome {
        self.gateway.pick(&self.session, worker_id)
    }

    /// Pointer-up over the play field
    pub fn drop_at(&mut self, position: ScreenPos) -> DropOutcome {
        let outcome = self.gateway.drop_at(&mut self.session, &self.scene, position);
        self.dispatch();
        outcome
    }

    pub fn cancel_drag(&mut self) {
        self.gateway.cancel();
    }

    /// Forward queued session notifications to the scene and presenter
    fn dispatch(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SessionEvent::LevelStarted { .. } => {}
                SessionEvent::Spawned { target, event_id } => {
                    match self.session.catalog().get(&event_id) {
                        Some(definition) => self.scene.create_entity_for_event(target, definition),
                        None => log::warn!("Spawned unknown event type {}", event_id),
                    }
                }
                SessionEvent::Retired { target } => self.scene.retire_entity(target),
                SessionEvent::ServiceStarted {
                    target,
                    worker,
                    duration,
                } => self.presenter.service_started(target, &worker, duration),
                SessionEvent::ScoreChanged(score) => self.presenter.score_changed(score),
                SessionEvent::CountdownChanged(display) => {
                    self.presenter.countdown_changed(&display)
                }
                SessionEvent::CooldownChanged { worker, remaining } => {
                    self.presenter.cooldown_changed(&worker, remaining)
                }
                SessionEvent::Finished { verdict, score } => {
                    self.presenter.session_finished(verdict, score)
                }
            }
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}
