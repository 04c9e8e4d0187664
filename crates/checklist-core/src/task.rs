use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub completed: bool,

    /// Fields written by other tools; carried through every rewrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Task {
    pub fn new_pending(id: String, title: String) -> Self {
        Self {
            id,
            title,
            completed: false,
            extra: BTreeMap::new(),
        }
    }

    /// Copy of this task with a different title.
    pub fn with_title(&self, title: String) -> Self {
        Self {
            title,
            ..self.clone()
        }
    }

    /// Copy of this task with `completed` flipped.
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }
}

/// Timestamp-derived id that does not collide with any of `taken`.
pub fn next_task_id<'a, I>(now: DateTime<Utc>, taken: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidate = now.timestamp_millis();
    let taken: Vec<&str> = taken.into_iter().collect();
    while taken.contains(&candidate.to_string().as_str()) {
        candidate += 1;
    }
    candidate.to_string()
}
