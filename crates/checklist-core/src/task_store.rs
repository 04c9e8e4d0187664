use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::filter::Filter;
use crate::storage::Storage;
use crate::task::{Task, next_task_id};

pub const TASKS_KEY: &str = "exp10_tasks";

/// Ordered task list mirrored to storage after every mutation.
#[derive(Debug)]
pub struct TaskStore<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
}

impl<S: Storage> TaskStore<S> {
    /// Store with an empty list; call [`TaskStore::load`] to pick up saved
    /// tasks.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            tasks: vec![],
        }
    }

    /// Replaces the in-memory list with the persisted one. A missing,
    /// unreadable or unparseable blob yields an empty list.
    #[tracing::instrument(skip(self))]
    pub fn load(&mut self) {
        self.tasks = match self.storage.get_item(TASKS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => tasks,
                Err(error) => {
                    warn!(%error, "stored task list is corrupt; starting empty");
                    vec![]
                }
            },
            Ok(None) => vec![],
            Err(error) => {
                warn!(error = %format!("{error:#}"), "failed reading stored task list; starting empty");
                vec![]
            }
        };
        info!(count = self.tasks.len(), "loaded tasks");
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Appends a pending task and returns its id.
    pub fn add(&mut self, title: &str) -> anyhow::Result<String> {
        self.add_at(title, Utc::now())
    }

    #[tracing::instrument(skip(self, title, now))]
    pub fn add_at(&mut self, title: &str, now: DateTime<Utc>) -> anyhow::Result<String> {
        let id = next_task_id(now, self.tasks.iter().map(|t| t.id.as_str()));
        debug!(id = %id, "adding task");
        self.tasks
            .push(Task::new_pending(id.clone(), title.to_string()));
        self.save()?;
        Ok(id)
    }

    #[tracing::instrument(skip(self, new_title))]
    pub fn update(&mut self, id: &str, new_title: &str) -> anyhow::Result<()> {
        self.replace(id, |task| task.with_title(new_title.to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: &str) -> anyhow::Result<()> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            debug!("delete of unknown task ignored");
        }
        self.save()
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle_completed(&mut self, id: &str) -> anyhow::Result<()> {
        self.replace(id, Task::toggled)
    }

    /// Tasks passing `filter`, in insertion order. The iterator is lazy and
    /// can be cloned to walk the view again.
    pub fn filtered_view(&self, filter: Filter) -> impl Iterator<Item = &Task> + Clone + '_ {
        self.tasks.iter().filter(move |t| filter.matches(t))
    }

    fn replace<F>(&mut self, id: &str, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&Task) -> Task,
    {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(slot) => {
                let updated = f(slot);
                *slot = updated;
            }
            None => debug!(id, "mutation of unknown task ignored"),
        }
        self.save()
    }

    fn save(&self) -> anyhow::Result<()> {
        let serialized =
            serde_json::to_string(&self.tasks).context("failed to serialize task list")?;
        self.storage
            .set_item(TASKS_KEY, &serialized)
            .context("failed to persist task list")
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{TASKS_KEY, TaskStore};
    use crate::filter::Filter;
    use crate::storage::{MemoryStorage, Storage};
    use crate::task::Task;

    fn persisted(storage: &MemoryStorage) -> Vec<Task> {
        let raw = storage.get_item(TASKS_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    fn seeded(tasks: &[Task]) -> (MemoryStorage, TaskStore<MemoryStorage>) {
        let storage = MemoryStorage::new();
        storage
            .set_item(TASKS_KEY, &serde_json::to_string(tasks).unwrap())
            .unwrap();
        let mut store = TaskStore::new(storage.clone());
        store.load();
        (storage, store)
    }

    #[test]
    fn toggle_flips_and_persists() {
        let (storage, mut store) =
            seeded(&[Task::new_pending("1".to_string(), "Buy milk".to_string())]);

        store.toggle_completed("1").unwrap();

        let expected = Task {
            completed: true,
            ..Task::new_pending("1".to_string(), "Buy milk".to_string())
        };
        assert_eq!(store.tasks(), &[expected.clone()]);
        assert_eq!(persisted(&storage), vec![expected]);
    }

    #[test]
    fn toggle_twice_is_identity() {
        let original = Task::new_pending("1".to_string(), "Buy milk".to_string());
        let (_, mut store) = seeded(&[original.clone()]);

        store.toggle_completed("1").unwrap();
        store.toggle_completed("1").unwrap();

        assert_eq!(store.get("1"), Some(&original));
    }

    #[test]
    fn add_appends_once_at_the_end() {
        let (storage, mut store) =
            seeded(&[Task::new_pending("1".to_string(), "Buy milk".to_string())]);

        let id = store.add("Walk dog").unwrap();

        let all: Vec<&Task> = store.filtered_view(Filter::All).collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, id);
        assert_eq!(all[1].title, "Walk dog");
        assert!(!all[1].completed);
        assert_eq!(all.iter().filter(|t| t.id == id).count(), 1);
        assert_eq!(persisted(&storage), store.tasks());
    }

    #[test]
    fn rapid_adds_get_distinct_ids() {
        let mut store = TaskStore::new(MemoryStorage::new());
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

        let a = store.add_at("one", now).unwrap();
        let b = store.add_at("two", now).unwrap();
        let c = store.add_at("three", now).unwrap();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn update_keeps_completion() {
        let mut done = Task::new_pending("1".to_string(), "Buy milk".to_string());
        done.completed = true;
        let (storage, mut store) = seeded(&[done]);

        store.update("1", "Buy oat milk").unwrap();

        let task = store.get("1").unwrap();
        assert_eq!(task.title, "Buy oat milk");
        assert!(task.completed);
        assert_eq!(persisted(&storage), store.tasks());
    }

    #[test]
    fn unknown_ids_leave_the_list_unchanged() {
        let tasks = vec![
            Task::new_pending("1".to_string(), "Buy milk".to_string()),
            Task::new_pending("2".to_string(), "Walk dog".to_string()),
        ];
        let (storage, mut store) = seeded(&tasks);

        store.update("99", "nope").unwrap();
        store.delete("99").unwrap();
        store.toggle_completed("99").unwrap();

        assert_eq!(store.tasks(), tasks.as_slice());
        assert_eq!(persisted(&storage), tasks);
    }

    #[test]
    fn delete_removes_only_the_match() {
        let (storage, mut store) = seeded(&[
            Task::new_pending("1".to_string(), "Buy milk".to_string()),
            Task::new_pending("2".to_string(), "Walk dog".to_string()),
        ]);

        store.delete("1").unwrap();

        assert_eq!(store.len(), 1);
        assert!(!store.contains("1"));
        assert!(store.contains("2"));
        assert_eq!(persisted(&storage), store.tasks());
    }

    #[test]
    fn corrupt_blob_loads_empty() {
        let storage = MemoryStorage::new();
        storage.set_item(TASKS_KEY, "{not json").unwrap();
        let mut store = TaskStore::new(storage);
        store.load();
        assert!(store.is_empty());
    }

    #[test]
    fn filtered_view_is_restartable_and_ordered() {
        let mut store = TaskStore::new(MemoryStorage::new());
        let a = store.add("a").unwrap();
        let b = store.add("b").unwrap();
        let c = store.add("c").unwrap();
        store.toggle_completed(&b).unwrap();

        let pending = store.filtered_view(Filter::Pending);
        let first: Vec<&str> = pending.clone().map(|t| t.id.as_str()).collect();
        let second: Vec<&str> = pending.map(|t| t.id.as_str()).collect();
        assert_eq!(first, vec![a.as_str(), c.as_str()]);
        assert_eq!(first, second);

        let completed: Vec<&str> =
            store.filtered_view(Filter::Completed).map(|t| t.id.as_str()).collect();
        assert_eq!(completed, vec![b.as_str()]);
    }
}
