//! Worker components: the social workers the player drags onto requests.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::common::{duration_secs, WorkerId};

/// What a worker is good at. Matching a request's requirement halves the
/// service time under the default rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkerAttribute {
    /// Lifting, carrying, helping someone back up
    Strong,
    /// Conversation, reading aloud, accompanying to the doctor
    Talkative,
    /// Repairs and diagnosis
    Smart,
}

impl WorkerAttribute {
    pub const ALL: [WorkerAttribute; 3] = [
        WorkerAttribute::Strong,
        WorkerAttribute::Talkative,
        WorkerAttribute::Smart,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WorkerAttribute::Strong => "Strong",
            WorkerAttribute::Talkative => "Talkative",
            WorkerAttribute::Smart => "Smart",
        }
    }
}

impl fmt::Display for WorkerAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A worker from the roster. Read-only to the engine; the remaining
/// cooldown is tracked separately by the cooldown ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    #[serde(default)]
    pub name: String,
    pub attribute: WorkerAttribute,
    /// Rest time after each assignment
    #[serde(rename = "cooldown", with = "duration_secs")]
    pub cooldown_max: Duration,
}

impl Worker {
    pub fn new(id: impl Into<String>, attribute: WorkerAttribute, cooldown_max: Duration) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: WorkerId(id),
            attribute,
            cooldown_max,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}
