//! CareCrew Headless Session Harness
//!
//! Validates session logic and the shipped game data without a renderer.
//! Runs entirely in-process: the scene is a table, the clock is fed
//! synthetic timestamps.
//!
//! Usage:
//!   cargo run -p carecrew-simtest
//!   cargo run -p carecrew-simtest -- --verbose

use std::time::{Duration, Instant};

use carecrew_core::clock::MAX_FRAME_DELTA;
use carecrew_core::prelude::*;
use carecrew_core::systems::{service_duration, CooldownLedger, SpawnController};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Game data (same JSON the host ships) ────────────────────────────────
const CONFIG_JSON: &str = include_str!("../../../data/game_config.json");

const FRAME: Duration = Duration::from_millis(100);

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();

    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== CareCrew Session Harness ===\n");

    let mut results = Vec::new();

    // 1. Game data validation
    let config = validate_config(verbose, &mut results).unwrap_or_default();

    // 2. Service time resolution
    results.extend(validate_resolver(verbose, &config));

    // 3. Cooldown decay
    results.extend(validate_cooldowns(verbose));

    // 4. Spawn cadence statistics
    results.extend(validate_spawn_cadence(verbose, &config));

    // 5. Frame clock
    results.extend(validate_clock(verbose));

    // 6. Scripted ten second level
    results.extend(validate_scripted_level(verbose));

    // 7. Autoplayed levels through the engine
    results.extend(validate_autoplay(verbose, &config));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Game Data ────────────────────────────────────────────────────────

fn validate_config(verbose: bool, results: &mut Vec<TestResult>) -> Option<GameConfig> {
    println!("--- Game Data ---");

    let config = match GameConfig::from_json_str(CONFIG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "config_parse".into(),
                passed: false,
                detail: format!("{}", e),
            });
            return None;
        }
    };

    results.push(TestResult {
        name: "config_parse".into(),
        passed: true,
        detail: format!(
            "{} levels, {} workers, {} event types",
            config.levels.len(),
            config.workers.len(),
            config.events.len()
        ),
    });

    let validation = config.validate();
    results.push(TestResult {
        name: "config_valid".into(),
        passed: validation.is_ok(),
        detail: match validation {
            Ok(()) => "all levels, workers and events consistent".into(),
            Err(e) => e.to_string(),
        },
    });

    results.push(TestResult {
        name: "config_matches_builtin".into(),
        passed: config == GameConfig::default(),
        detail: "shipped JSON equals GameConfig::default()".into(),
    });

    // Every attribute should be able to perfect-match something
    let uncovered: Vec<_> = WorkerAttribute::ALL
        .iter()
        .filter(|attr| !config.events.iter().any(|e| e.matches(**attr)))
        .collect();
    results.push(TestResult {
        name: "config_attribute_coverage".into(),
        passed: uncovered.is_empty(),
        detail: if uncovered.is_empty() {
            "every attribute has a matching event type".into()
        } else {
            format!("no event type wants: {:?}", uncovered)
        },
    });

    if verbose {
        println!("  Levels:");
        for level in &config.levels {
            let (min, max) = level.cadence(&config.rules).bounds();
            println!(
                "    {:>2} {:16} {:>4}s target {:>3}  spawn {:.1}-{:.1}s  cap {}",
                level.id,
                level.name,
                level.time_limit.as_secs(),
                level.target_count,
                min,
                max,
                level.concurrency_cap(&config.rules)
            );
        }
    }

    Some(config)
}

// ── 2. Service Time ─────────────────────────────────────────────────────

fn validate_resolver(_verbose: bool, config: &GameConfig) -> Vec<TestResult> {
    println!("--- Service Time ---");
    let mut results = Vec::new();

    let rules = GameRules::default();
    let catalog = EventCatalog::new(vec![
        EventDefinition::new("E-01", &[WorkerAttribute::Strong]),
        EventDefinition::new("E-03", &[WorkerAttribute::Smart]),
    ]);

    let cases = [
        (WorkerAttribute::Strong, "E-01", 2500),
        (WorkerAttribute::Talkative, "E-01", 5000),
        (WorkerAttribute::Smart, "E-03", 2500),
        (WorkerAttribute::Strong, "E-99", 5000),
    ];
    for (attr, event, expected_ms) in cases {
        let got = service_duration(attr, &EventId::new(event), &catalog, &rules);
        results.push(TestResult {
            name: format!("resolver_{}_{}", attr.label().to_lowercase(), event),
            passed: got == Duration::from_millis(expected_ms),
            detail: format!("{:?} (expected {}ms)", got, expected_ms),
        });
    }

    // Shipped rules: a match is never slower than a mismatch
    let base = config.rules.base_service_time();
    let mut slower = 0;
    for event in config.events.iter() {
        for attr in WorkerAttribute::ALL {
            let d = service_duration(attr, &event.id, &config.events, &config.rules);
            let unrewarded =
                event.matches(attr) && d == base && config.rules.perfect_match_factor > 0.0;
            if d > base || unrewarded {
                slower += 1;
            }
        }
    }
    results.push(TestResult {
        name: "resolver_match_never_slower".into(),
        passed: slower == 0,
        detail: format!("{} inconsistent attribute/event pairs", slower),
    });

    results
}

// ── 3. Cooldowns ────────────────────────────────────────────────────────

fn validate_cooldowns(_verbose: bool) -> Vec<TestResult> {
    println!("--- Cooldowns ---");
    let mut results = Vec::new();

    let a = WorkerId::new("Worker-A");
    let mut ledger = CooldownLedger::new();
    ledger.reset(&[Worker::new(
        "Worker-A",
        WorkerAttribute::Strong,
        Duration::from_secs(3),
    )]);

    let started = ledger.start(&a);
    results.push(TestResult {
        name: "cooldown_start".into(),
        passed: started == Some(Duration::from_secs(3)) && !ledger.is_ready(&a),
        detail: format!("{:?}", started),
    });

    // 3s of 100ms frames lands exactly on zero; the 31st frame stays there
    let mut ticks = 0;
    while !ledger.is_ready(&a) && ticks < 100 {
        ledger.tick(FRAME);
        ticks += 1;
    }
    ledger.tick(FRAME);
    results.push(TestResult {
        name: "cooldown_decay".into(),
        passed: ticks == 30 && ledger.query(&a) == Duration::ZERO,
        detail: format!("ready after {} frames", ticks),
    });

    let unknown = WorkerId::new("nobody");
    results.push(TestResult {
        name: "cooldown_unknown_worker".into(),
        passed: ledger.start(&unknown).is_none() && ledger.query(&unknown) == Duration::ZERO,
        detail: "unknown ids ignored".into(),
    });

    results
}

// ── 4. Spawn Cadence ────────────────────────────────────────────────────

fn validate_spawn_cadence(verbose: bool, config: &GameConfig) -> Vec<TestResult> {
    println!("--- Spawn Cadence ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(42);

    // Interval distribution
    let cadence = SpawnCadence::Range { min: 3.0, max: 7.0 };
    let spawner = SpawnController::new(cadence, 10, &mut rng);
    let samples = 10_000;
    let mut sum = 0.0;
    let mut out_of_range = 0;
    for _ in 0..samples {
        let secs = spawner.draw_interval(&mut rng).as_secs_f64();
        if !(3.0..=7.0).contains(&secs) {
            out_of_range += 1;
        }
        sum += secs;
    }
    let mean = sum / samples as f64;
    results.push(TestResult {
        name: "spawn_interval_range".into(),
        passed: out_of_range == 0,
        detail: format!("{} of {} samples outside 3-7s", out_of_range, samples),
    });
    results.push(TestResult {
        name: "spawn_interval_mean".into(),
        passed: (mean - 5.0).abs() < 0.1,
        detail: format!("mean {:.3}s over {} samples", mean, samples),
    });

    // Fixed rate over a minute
    let mut spawner = SpawnController::new(SpawnCadence::Fixed(2.0), 1000, &mut rng);
    let mut spawned = 0;
    for _ in 0..600 {
        if spawner.tick(FRAME, 0, &config.events, &mut rng).is_some() {
            spawned += 1;
        }
    }
    results.push(TestResult {
        name: "spawn_fixed_rate".into(),
        passed: spawned == 30,
        detail: format!("{} spawns in 60s at one per 2s", spawned),
    });

    // Cap
    let mut spawner = SpawnController::new(SpawnCadence::Fixed(0.1), 3, &mut rng);
    let mut live = 0;
    for _ in 0..100 {
        if spawner.tick(FRAME, live, &config.events, &mut rng).is_some() {
            live += 1;
        }
    }
    results.push(TestResult {
        name: "spawn_cap".into(),
        passed: live == 3,
        detail: format!("{} live requests with cap 3", live),
    });

    if verbose {
        let mut counts = vec![0u32; config.events.len()];
        let mut spawner = SpawnController::new(SpawnCadence::Fixed(0.1), usize::MAX, &mut rng);
        for _ in 0..5000 {
            if let Some(id) = spawner.tick(FRAME, 0, &config.events, &mut rng) {
                if let Some(i) = config.events.iter().position(|e| e.id == id) {
                    counts[i] += 1;
                }
            }
        }
        println!("  Event type distribution (5000 spawns):");
        for (event, count) in config.events.iter().zip(counts) {
            println!("    {:5} {:24} {}", event.id, event.name, count);
        }
    }

    results
}

// ── 5. Clock ────────────────────────────────────────────────────────────

fn validate_clock(_verbose: bool) -> Vec<TestResult> {
    println!("--- Clock ---");
    let mut results = Vec::new();

    let t0 = Instant::now();
    let mut clock = Clock::new();
    results.push(TestResult {
        name: "clock_idle_until_started".into(),
        passed: clock.advance(t0).is_none(),
        detail: "no delta before start".into(),
    });

    clock.start(t0);
    let normal = clock.advance(t0 + Duration::from_millis(16));
    let stalled = clock.advance(t0 + Duration::from_secs(5));
    results.push(TestResult {
        name: "clock_clamp".into(),
        passed: normal == Some(Duration::from_millis(16)) && stalled == Some(MAX_FRAME_DELTA),
        detail: format!("16ms -> {:?}, 5s stall -> {:?}", normal, stalled),
    });

    clock.stop();
    let paused = clock.advance(t0 + Duration::from_secs(6));
    clock.start(t0 + Duration::from_secs(6));
    let resumed = clock.advance(t0 + Duration::from_secs(6) + Duration::from_millis(20));
    results.push(TestResult {
        name: "clock_pause_resume".into(),
        passed: paused.is_none() && resumed == Some(Duration::from_millis(20)),
        detail: format!("paused {:?}, resumed {:?}", paused, resumed),
    });

    results
}

// ── 6. Scripted Level ───────────────────────────────────────────────────

/// Scene where the pointer always lands on one chosen target
#[derive(Default)]
struct PointerScene {
    under_pointer: Option<TargetId>,
}

impl Scene for PointerScene {
    fn create_entity_for_event(&mut self, _target: TargetId, _event: &EventDefinition) {}

    fn hit_test(&self, _position: ScreenPos) -> Option<TargetId> {
        self.under_pointer
    }

    fn retire_entity(&mut self, _target: TargetId) {}
}

fn validate_scripted_level(verbose: bool) -> Vec<TestResult> {
    println!("--- Scripted Level ---");
    let mut results = Vec::new();

    // One Strong worker, one Strong event type, 10s to serve one request.
    // Random spawns are pushed past the end of the level.
    let level = LevelConfig::new(1, Duration::from_secs(10), 1)
        .with_spawn(SpawnCadence::Fixed(600.0))
        .with_seed(7);
    let roster = [Worker::new(
        "Worker-A",
        WorkerAttribute::Strong,
        Duration::from_secs(3),
    )];
    let catalog = EventCatalog::new(vec![EventDefinition::new(
        "E-01",
        &[WorkerAttribute::Strong],
    )]);
    let mut session = Session::new(GameRules::default(), catalog);
    session.start_level(&level, &roster);

    let worker = WorkerId::new("Worker-A");
    let mut gateway = InteractionGateway::new();
    let mut scene = PointerScene::default();

    let Some(target) = session.spawn_request(&EventId::new("E-01")) else {
        results.push(TestResult {
            name: "scripted_spawn".into(),
            passed: false,
            detail: "scripted request was refused".into(),
        });
        return results;
    };
    scene.under_pointer = Some(target);

    gateway.pick(&session, &worker);
    let outcome = gateway.drop_at(&mut session, &scene, ScreenPos::default());
    results.push(TestResult {
        name: "scripted_assignment".into(),
        passed: outcome
            == DropOutcome::Resolved(ServiceOutcome::Started {
                duration: Duration::from_millis(2500),
            }),
        detail: format!("{:?}", outcome),
    });

    let mut clock = Clock::new();
    let mut now = Instant::now();
    clock.start(now);
    let mut step = |session: &mut Session, frames: usize| {
        for _ in 0..frames {
            now += FRAME;
            let mut systems: [&mut dyn Updatable; 1] = [&mut *session];
            clock.frame(now, &mut systems);
        }
    };

    step(&mut session, 25);
    results.push(TestResult {
        name: "scripted_service_completes".into(),
        passed: session.score() == 1 && session.live_count() == 0,
        detail: format!(
            "t=2.5s score {} live {} cooldown {:?}",
            session.score(),
            session.live_count(),
            session.cooldown(&worker)
        ),
    });

    step(&mut session, 5);
    results.push(TestResult {
        name: "scripted_cooldown_expires".into(),
        passed: session.cooldown(&worker) == Duration::ZERO,
        detail: format!("t=3.0s cooldown {:?}", session.cooldown(&worker)),
    });

    step(&mut session, 70);
    results.push(TestResult {
        name: "scripted_verdict".into(),
        passed: session.status() == SessionStatus::Finished
            && session.verdict() == Some(Verdict::Win)
            && session.time_remaining() == Duration::ZERO,
        detail: format!(
            "t=10s status {:?} verdict {:?}",
            session.status(),
            session.verdict()
        ),
    });

    if verbose {
        for event in session.drain_events() {
            if let SessionEvent::Finished { verdict, score } = event {
                println!("  Scripted level finished: {:?} with {}", verdict, score);
            }
        }
    }

    results
}

// ── 7. Autoplay ─────────────────────────────────────────────────────────

/// Lays requests out in a row, one per 100px
#[derive(Default)]
struct RowScene {
    row: Vec<(TargetId, EventDefinition)>,
    created: usize,
}

impl RowScene {
    fn position_of(&self, target: TargetId) -> Option<ScreenPos> {
        self.row
            .iter()
            .position(|(t, _)| *t == target)
            .map(|i| ScreenPos::new(i as f32 * 100.0 + 50.0, 0.0))
    }
}

impl Scene for RowScene {
    fn create_entity_for_event(&mut self, target: TargetId, event: &EventDefinition) {
        self.row.push((target, event.clone()));
        self.created += 1;
    }

    fn hit_test(&self, position: ScreenPos) -> Option<TargetId> {
        if position.x < 0.0 {
            return None;
        }
        self.row
            .get((position.x / 100.0) as usize)
            .map(|(target, _)| *target)
    }

    fn retire_entity(&mut self, target: TargetId) {
        self.row.retain(|(t, _)| *t != target);
    }
}

#[derive(Default)]
struct Tally {
    services: u32,
    finished: Option<(Verdict, u32)>,
}

impl Presenter for Tally {
    fn service_started(&mut self, _target: TargetId, _worker: &WorkerId, _duration: Duration) {
        self.services += 1;
    }

    fn session_finished(&mut self, verdict: Verdict, score: u32) {
        self.finished = Some((verdict, score));
    }
}

/// Send every rested worker to an idle request, matching attributes first
fn autoplay_step(engine: &mut GameEngine<RowScene, Tally>) {
    let workers: Vec<Worker> = engine.config().workers.clone();
    for worker in &workers {
        if !engine.session().cooldown(&worker.id).is_zero() {
            continue;
        }

        let idle: Vec<(TargetId, bool)> = engine
            .scene()
            .row
            .iter()
            .filter(|(target, _)| !engine.session().is_serving(*target))
            .map(|(target, event)| (*target, event.matches(worker.attribute)))
            .collect();
        let Some((target, _)) = idle
            .iter()
            .find(|(_, matched)| *matched)
            .or_else(|| idle.first())
            .copied()
        else {
            return;
        };

        let Some(position) = engine.scene().position_of(target) else {
            continue;
        };
        if let PickOutcome::Picked(_) = engine.pick(&worker.id) {
            engine.drop_at(position);
        }
    }
}

fn validate_autoplay(verbose: bool, config: &GameConfig) -> Vec<TestResult> {
    println!("--- Autoplay ---");
    let mut results = Vec::new();

    for level in &config.levels {
        let mut config = config.clone();
        if let Some(l) = config.levels.iter_mut().find(|l| l.id == level.id) {
            l.seed = Some(2024);
        }

        let mut engine = match GameEngine::new(config, RowScene::default(), Tally::default()) {
            Ok(engine) => engine,
            Err(e) => {
                results.push(TestResult {
                    name: format!("autoplay_level_{}", level.id),
                    passed: false,
                    detail: format!("config rejected: {}", e),
                });
                continue;
            }
        };
        if !engine.start_level(level.id) {
            results.push(TestResult {
                name: format!("autoplay_level_{}", level.id),
                passed: false,
                detail: "level failed to start".into(),
            });
            continue;
        }

        let mut now = Instant::now();
        engine.start(now);
        let budget = (level.time_limit.as_millis() / FRAME.as_millis()) as usize + 1;
        let mut max_live = 0;
        for _ in 0..budget {
            now += FRAME;
            engine.frame(now);
            autoplay_step(&mut engine);
            max_live = max_live.max(engine.session().live_count());
        }

        let session = engine.session();
        let cap = level.concurrency_cap(&engine.config().rules);
        let tally = engine.presenter();
        let consistent = tally.finished == session.verdict().map(|v| (v, session.score()));

        results.push(TestResult {
            name: format!("autoplay_level_{}_finishes", level.id),
            passed: session.status() == SessionStatus::Finished && consistent,
            detail: format!(
                "{:?} score {}/{} after {} assignments",
                session.verdict(),
                session.score(),
                session.target_count(),
                tally.services
            ),
        });
        results.push(TestResult {
            name: format!("autoplay_level_{}_cap", level.id),
            passed: max_live <= cap && engine.scene().row.len() == session.live_count(),
            detail: format!("peak {} live requests (cap {})", max_live, cap),
        });

        if verbose {
            println!(
                "  Level {} ({}): {} spawned, {} served, {:?}",
                level.id,
                level.name,
                engine.scene().created,
                session.score(),
                session.verdict()
            );
        }
    }

    results
}
