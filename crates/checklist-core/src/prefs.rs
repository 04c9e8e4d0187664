use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::filter::Filter;
use crate::storage::Storage;

pub const PREFS_KEY: &str = "exp10_prefs";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(anyhow!("unknown theme '{other}', expected light or dark")),
        }
    }
}

/// Complete preference record. Keys this build does not know about are kept
/// in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub filter: Filter,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Preferences {
    /// Shallow merge of a saved JSON object over the defaults. A known key
    /// whose value does not parse keeps its default.
    pub fn merged_over_defaults(mut saved: Map<String, Value>) -> Self {
        let theme = take_field(&mut saved, "theme");
        let filter = take_field(&mut saved, "filter");
        Self {
            theme,
            filter,
            extra: saved,
        }
    }
}

fn take_field<T>(saved: &mut Map<String, Value>, key: &str) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    saved
        .remove(key)
        .and_then(|value| match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                warn!(key, %error, "ignoring unrecognised preference value");
                None
            }
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct PreferenceStore<S: Storage> {
    storage: S,
}

impl<S: Storage> PreferenceStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Always a complete record; anything unreadable falls back to defaults.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Preferences {
        let raw = match self.storage.get_item(PREFS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Preferences::default(),
            Err(error) => {
                warn!(error = %format!("{error:#}"), "failed reading preferences; using defaults");
                return Preferences::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(saved)) => Preferences::merged_over_defaults(saved),
            Ok(other) => {
                warn!(kind = %json_kind(&other), "stored preferences are not an object; using defaults");
                Preferences::default()
            }
            Err(error) => {
                warn!(%error, "stored preferences are corrupt; using defaults");
                Preferences::default()
            }
        }
    }

    #[tracing::instrument(skip(self, prefs), fields(theme = %prefs.theme, filter = %prefs.filter))]
    pub fn save(&self, prefs: &Preferences) -> anyhow::Result<()> {
        let serialized =
            serde_json::to_string(prefs).context("failed to serialize preferences")?;
        self.storage
            .set_item(PREFS_KEY, &serialized)
            .context("failed to persist preferences")
    }

    pub fn set_theme(&self, theme: Theme) -> anyhow::Result<Preferences> {
        self.modify(|prefs| prefs.theme = theme)
    }

    pub fn set_filter(&self, filter: Filter) -> anyhow::Result<Preferences> {
        self.modify(|prefs| prefs.filter = filter)
    }

    // Read-modify-write; fine while a single session owns the storage.
    fn modify<F>(&self, f: F) -> anyhow::Result<Preferences>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut prefs = self.load();
        f(&mut prefs);
        self.save(&prefs)?;
        debug!(theme = %prefs.theme, filter = %prefs.filter, "preferences updated");
        Ok(prefs)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PREFS_KEY, PreferenceStore, Preferences, Theme};
    use crate::filter::Filter;
    use crate::storage::{MemoryStorage, Storage};

    fn stored(storage: &MemoryStorage) -> serde_json::Value {
        let raw = storage.get_item(PREFS_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn empty_storage_yields_defaults() {
        let prefs = PreferenceStore::new(MemoryStorage::new()).load();
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.filter, Filter::All);
        assert!(prefs.extra.is_empty());
    }

    #[test]
    fn partial_blob_is_filled_from_defaults() {
        let storage = MemoryStorage::new();
        storage.set_item(PREFS_KEY, r#"{"theme":"dark"}"#).unwrap();

        let prefs = PreferenceStore::new(storage).load();
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.filter, Filter::All);
    }

    #[test]
    fn unknown_keys_survive_updates() {
        let storage = MemoryStorage::new();
        storage
            .set_item(PREFS_KEY, r#"{"theme":"light","fontSize":14}"#)
            .unwrap();
        let store = PreferenceStore::new(storage.clone());

        store.set_filter(Filter::Pending).unwrap();
        store.set_theme(Theme::Dark).unwrap();

        assert_eq!(
            stored(&storage),
            json!({"theme": "dark", "filter": "pending", "fontSize": 14})
        );
    }

    #[test]
    fn bad_values_and_corrupt_blobs_fall_back() {
        let storage = MemoryStorage::new();
        let store = PreferenceStore::new(storage.clone());

        storage
            .set_item(PREFS_KEY, r#"{"theme":"sepia","filter":"completed"}"#)
            .unwrap();
        let prefs = store.load();
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.filter, Filter::Completed);

        storage.set_item(PREFS_KEY, "[1,2,3]").unwrap();
        assert_eq!(store.load(), Preferences::default());

        storage.set_item(PREFS_KEY, "{{{").unwrap();
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn save_writes_the_complete_record() {
        let storage = MemoryStorage::new();
        let store = PreferenceStore::new(storage.clone());

        store.save(&Preferences::default()).unwrap();
        assert_eq!(stored(&storage), json!({"theme": "light", "filter": "all"}));
    }
}
