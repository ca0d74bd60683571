//! Spawn controller - decides when a new request appears and which kind.
//!
//! Spawns are best-effort: a firing that lands while the board is full is
//! dropped, and the next randomly drawn interval governs the next attempt.

use std::time::Duration;

use rand::Rng;

use crate::components::{secs_to_duration, EventCatalog, EventId};
use crate::config::SpawnCadence;

#[derive(Debug, Clone)]
pub struct SpawnController {
    cadence: SpawnCadence,
    max_concurrent: usize,
    timer: Duration,
}

impl SpawnController {
    /// Create a controller with its first interval already drawn
    pub fn new(cadence: SpawnCadence, max_concurrent: usize, rng: &mut impl Rng) -> Self {
        let mut controller = Self {
            cadence,
            max_concurrent,
            timer: Duration::ZERO,
        };
        controller.reseed(rng);
        controller
    }

    /// Draw a fresh interval from the cadence
    pub fn reseed(&mut self, rng: &mut impl Rng) {
        self.timer = self.draw_interval(rng);
    }

    /// One interval drawn uniformly from `[min, max]`.
    ///
    /// A cadence that cannot be expressed as a `Duration` (negative, NaN,
    /// infinite or too large) yields `Duration::MAX`, so the controller
    /// never fires.
    pub fn draw_interval(&self, rng: &mut impl Rng) -> Duration {
        let (min, max) = self.cadence.bounds();
        let secs = if min.is_finite() && max.is_finite() && max > min {
            rng.gen_range(min..=max)
        } else {
            min
        };
        secs_to_duration(secs).unwrap_or_else(|| {
            log::warn!(
                "Spawn interval {}s is not a valid duration, spawning disabled",
                secs
            );
            Duration::MAX
        })
    }

    /// Advance the timer. When it runs out, pick an event type (unless the
    /// board already holds `max_concurrent` requests) and reseed.
    pub fn tick(
        &mut self,
        dt: Duration,
        live_count: usize,
        catalog: &EventCatalog,
        rng: &mut impl Rng,
    ) -> Option<EventId> {
        self.timer = self.timer.saturating_sub(dt);
        if !self.timer.is_zero() {
            return None;
        }

        self.reseed(rng);

        if live_count >= self.max_concurrent {
            log::debug!(
                "Spawn skipped: {} requests on board (cap {})",
                live_count,
                self.max_concurrent
            );
            return None;
        }

        match catalog.choose(rng) {
            Some(event) => Some(event.id.clone()),
            None => {
                log::warn!("Spawn skipped: event catalog is empty");
                None
            }
        }
    }

    /// Time until the next firing
    pub fn timer(&self) -> Duration {
        self.timer
    }

    pub fn cadence(&self) -> SpawnCadence {
        self.cadence
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EventDefinition, WorkerAttribute};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> EventCatalog {
        EventCatalog::new(vec![
            EventDefinition::new("E-01", &[WorkerAttribute::Strong]),
            EventDefinition::new("E-02", &[WorkerAttribute::Talkative]),
            EventDefinition::new("E-03", &[WorkerAttribute::Smart]),
        ])
    }

    #[test]
    fn test_intervals_stay_in_range_and_center_on_midpoint() {
        let mut rng = StdRng::seed_from_u64(42);
        let cadence = SpawnCadence::Range { min: 3.0, max: 7.0 };
        let controller = SpawnController::new(cadence, 10, &mut rng);

        let samples = 10_000;
        let mut sum = 0.0;
        for _ in 0..samples {
            let secs = controller.draw_interval(&mut rng).as_secs_f64();
            assert!((3.0..=7.0).contains(&secs), "interval {} out of range", secs);
            sum += secs;
        }

        // Uniform on [3, 7]: sd = 4 / sqrt(12) ~ 1.155, standard error ~ 0.012
        let mean = sum / samples as f64;
        assert!((mean - 5.0).abs() < 0.06, "mean {} too far from midpoint", mean);
    }

    #[test]
    fn test_fixed_rate_fires_on_schedule() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut controller = SpawnController::new(SpawnCadence::Fixed(1.0), 10, &mut rng);
        assert_eq!(controller.timer(), Duration::from_secs(1));

        let catalog = catalog();
        let mut fired = 0;
        for _ in 0..50 {
            if controller.tick(Duration::from_millis(100), 0, &catalog, &mut rng).is_some() {
                fired += 1;
            }
        }
        assert_eq!(fired, 5);
    }

    #[test]
    fn test_cap_skips_but_reseeds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut controller = SpawnController::new(SpawnCadence::Fixed(0.5), 2, &mut rng);
        let catalog = catalog();

        let spawned = controller.tick(Duration::from_millis(500), 2, &catalog, &mut rng);
        assert!(spawned.is_none());
        assert_eq!(controller.timer(), Duration::from_millis(500));

        let spawned = controller.tick(Duration::from_millis(500), 1, &catalog, &mut rng);
        assert!(spawned.is_some());
    }

    #[test]
    fn test_spawned_types_come_from_catalog() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut controller = SpawnController::new(SpawnCadence::Fixed(0.1), 100, &mut rng);
        let catalog = catalog();
        let mut seen = std::collections::BTreeSet::new();

        for _ in 0..300 {
            if let Some(id) = controller.tick(Duration::from_millis(100), 0, &catalog, &mut rng) {
                assert!(catalog.get(&id).is_some());
                seen.insert(id);
            }
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_unrepresentable_cadence_disables_spawning() {
        let mut rng = StdRng::seed_from_u64(5);
        let catalog = catalog();

        let cadences = [
            SpawnCadence::Fixed(f64::INFINITY),
            SpawnCadence::Fixed(f64::NAN),
            SpawnCadence::Fixed(-1.0),
            SpawnCadence::Range { min: 1.0, max: 1e300 },
        ];
        for cadence in cadences {
            let mut controller = SpawnController::new(cadence, 10, &mut rng);
            for _ in 0..50 {
                controller.reseed(&mut rng);
            }
            for _ in 0..10 {
                let _ = controller.tick(Duration::from_secs(3600), 0, &catalog, &mut rng);
            }
        }

        let mut controller =
            SpawnController::new(SpawnCadence::Fixed(f64::INFINITY), 10, &mut rng);
        assert_eq!(controller.timer(), Duration::MAX);
        assert!(controller.tick(Duration::from_secs(3600), 0, &catalog, &mut rng).is_none());
    }

    #[test]
    fn test_empty_catalog_never_spawns() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut controller = SpawnController::new(SpawnCadence::Fixed(0.1), 10, &mut rng);
        let empty = EventCatalog::default();
        for _ in 0..10 {
            assert!(controller.tick(Duration::from_millis(100), 0, &empty, &mut rng).is_none());
        }
    }
}
