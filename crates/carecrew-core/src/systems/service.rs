//! Service time resolution - how long a worker takes on a request.
//!
//! Pure functions: identical inputs always give identical output.

use std::time::Duration;

use crate::components::{EventCatalog, EventId, WorkerAttribute};
use crate::config::GameRules;

/// Shortest service time ever handed out, whatever the rules say
pub const MIN_SERVICE_TIME: Duration = Duration::from_millis(1);

/// Compute the service time for a worker attribute against an event type.
///
/// A perfect match (the attribute is one of the event's required
/// attributes) takes `base * (1 - perfect_match_factor)`; anything else
/// takes `base`. An unknown event id falls back to `base` and logs a warning.
/// The result is never below [`MIN_SERVICE_TIME`].
pub fn service_duration(
    attribute: WorkerAttribute,
    event_id: &EventId,
    catalog: &EventCatalog,
    rules: &GameRules,
) -> Duration {
    let base = rules.base_service_time().max(MIN_SERVICE_TIME);

    let Some(event) = catalog.get(event_id) else {
        log::warn!("Unknown event type {}, using base service time", event_id);
        return base;
    };

    if event.matches(attribute) {
        let factor = if rules.perfect_match_factor.is_nan() {
            0.0
        } else {
            rules.perfect_match_factor.clamp(0.0, 1.0)
        };
        base.mul_f64(1.0 - factor).max(MIN_SERVICE_TIME)
    } else {
        base
    }
}
