use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// View selector over the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Completed,
    Pending,
}

impl Filter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" | "done" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            other => Err(anyhow!(
                "unknown filter '{other}', expected all, completed or pending"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Filter;
    use crate::task::Task;

    fn sample() -> Vec<Task> {
        let mut done = Task::new_pending("2".to_string(), "File taxes".to_string());
        done.completed = true;
        vec![
            Task::new_pending("1".to_string(), "Buy milk".to_string()),
            done,
            Task::new_pending("3".to_string(), "Call mom".to_string()),
        ]
    }

    #[test]
    fn completed_and_pending_partition_all() {
        let tasks = sample();
        for task in &tasks {
            assert!(Filter::All.matches(task));
            assert_ne!(Filter::Completed.matches(task), Filter::Pending.matches(task));
        }
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Pending".parse::<Filter>().unwrap(), Filter::Pending);
        assert_eq!(" all ".parse::<Filter>().unwrap(), Filter::All);
        assert_eq!("done".parse::<Filter>().unwrap(), Filter::Completed);
        assert!("someday".parse::<Filter>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Filter::Completed).unwrap(), "\"completed\"");
    }
}
