use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Id;

/// The shape of a [`Metric`]'s value: a monotonic counter, a point-in-time
/// gauge, or a duration timer (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Counter,
    Gauge,
    Timer,
}

/// A named, numeric, typed measurement attached to a task and optionally a
/// specific run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub task_id: Id,
    pub run_id: Option<Id>,
    pub name: String,
    pub kind: MetricKind,
    pub value: f64,
    pub labels: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    pub fn counter(task_id: Id, name: impl Into<String>, value: f64) -> Self {
        Metric {
            task_id,
            run_id: None,
            name: name.into(),
            kind: MetricKind::Counter,
            value,
            labels: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_run(mut self, run_id: Id) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}
