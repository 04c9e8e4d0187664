use tracing::{debug, info};

use crate::edit::{FormState, SubmitOutcome};
use crate::filter::Filter;
use crate::prefs::{PreferenceStore, Preferences, Theme};
use crate::storage::Storage;
use crate::task::Task;
use crate::task_store::TaskStore;
use crate::tips::{TipsPanel, TipsSource};

/// Everything one editing session owns. Each `on_*` method is the handler
/// for one UI event; mutating handlers have persisted before they return,
/// so the caller can re-render straight from [`Session::visible_tasks`].
#[derive(Debug)]
pub struct Session<S: Storage> {
    tasks: TaskStore<S>,
    prefs: PreferenceStore<S>,
    pub form: FormState,
    pub tips: TipsPanel,
}

impl<S: Storage> Session<S> {
    #[tracing::instrument(skip(storage))]
    pub fn open(storage: S) -> Self {
        let mut tasks = TaskStore::new(storage.clone());
        tasks.load();
        let prefs = PreferenceStore::new(storage);
        let loaded = prefs.load();
        info!(theme = %loaded.theme, filter = %loaded.filter, "session opened");

        Self {
            tasks,
            prefs,
            form: FormState::default(),
            tips: TipsPanel::default(),
        }
    }

    pub fn tasks(&self) -> &TaskStore<S> {
        &self.tasks
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs.load()
    }

    pub fn filter(&self) -> Filter {
        self.preferences().filter
    }

    /// Tasks under the current filter preference.
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> + Clone + '_ {
        self.tasks.filtered_view(self.filter())
    }

    pub fn on_submit(&mut self, title: &str) -> anyhow::Result<SubmitOutcome> {
        self.form.submit(&mut self.tasks, title)
    }

    pub fn on_start_edit(&mut self, id: &str) -> bool {
        self.form.start_edit(&self.tasks, id)
    }

    pub fn on_cancel_edit(&mut self) {
        self.form.cancel();
    }

    #[tracing::instrument(skip(self))]
    pub fn on_toggle(&mut self, id: &str) -> anyhow::Result<()> {
        self.tasks.toggle_completed(id)
    }

    /// Deleting the task under edit also leaves edit mode.
    #[tracing::instrument(skip(self))]
    pub fn on_delete(&mut self, id: &str) -> anyhow::Result<()> {
        self.tasks.delete(id)?;
        self.form.forget(id);
        Ok(())
    }

    pub fn on_theme_change(&mut self, theme: Theme) -> anyhow::Result<Preferences> {
        debug!(%theme, "theme change");
        self.prefs.set_theme(theme)
    }

    pub fn on_filter_change(&mut self, filter: Filter) -> anyhow::Result<Preferences> {
        debug!(%filter, "filter change");
        self.prefs.set_filter(filter)
    }

    pub async fn on_load_tips<T: TipsSource>(&mut self, source: &T) -> bool {
        self.tips.load(source).await
    }
}
