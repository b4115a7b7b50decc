use std::path::Path;

use crate::{
    foundation::error::{MeltError, MeltResult},
    render::texture::TextureBackend,
    table::persist::{LoadSummary, SaveSummary, TablesFile},
    table::store::TableStore,
    transition::instance::{MeltTransition, UpdateOutcome},
    transition::settings::MeltSettings,
};

/// Module-level state of the transition plugin: the shared table store and where it persists.
///
/// Host callbacks map onto the methods here: module load/unload, instance create/update/
/// destroy, transition start and the "refresh table" button. Persistence failures are logged
/// and never reach the host; the transition keeps working with regenerated tables.
#[derive(Debug)]
pub struct MeltPlugin {
    store: TableStore,
    file: TablesFile,
    load_outcome: MeltResult<LoadSummary>,
}

impl MeltPlugin {
    /// Module load: resolve `<config_dir>/TABLES1.WAD` and read every table from it.
    #[tracing::instrument(skip_all, fields(config_dir = %config_dir.display()))]
    pub fn load(config_dir: &Path) -> Self {
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "booting up plugin");
        let file = TablesFile::in_config_dir(config_dir).unwrap_or_else(|err| {
            tracing::error!(error = %err, "cannot create config dir, tables will not persist");
            TablesFile::new(config_dir.join(crate::foundation::core::TABLES_FILE_NAME))
        });
        Self::with_store(TableStore::new(), file)
    }

    /// Load `file` into `store`. Used by [`MeltPlugin::load`] and by tests with injected stores.
    pub fn with_store(mut store: TableStore, file: TablesFile) -> Self {
        let load_outcome = file.load(&mut store);
        if let Err(err) = &load_outcome {
            tracing::warn!(error = %err, kept = store.len(), "continuing with the readable tables");
        }
        Self {
            store,
            file,
            load_outcome,
        }
    }

    /// Shared table store.
    pub fn store(&self) -> &TableStore {
        &self.store
    }

    /// Mutable access to the shared table store.
    pub fn store_mut(&mut self) -> &mut TableStore {
        &mut self.store
    }

    /// Where the store is saved.
    pub fn tables_file(&self) -> &TablesFile {
        &self.file
    }

    /// Result of the load performed at construction.
    pub fn load_outcome(&self) -> Result<&LoadSummary, &MeltError> {
        self.load_outcome.as_ref()
    }

    /// New transition instance configured from `settings` (which may get a table UUID).
    pub fn create_instance(&mut self, settings: &mut MeltSettings) -> MeltResult<MeltTransition> {
        let mut transition = MeltTransition::new();
        self.update_instance(&mut transition, settings)?;
        Ok(transition)
    }

    /// Settings changed. The store is saved when table values were rebuilt.
    pub fn update_instance(
        &mut self,
        transition: &mut MeltTransition,
        settings: &mut MeltSettings,
    ) -> MeltResult<UpdateOutcome> {
        let outcome = transition.update(&mut self.store, settings)?;
        if outcome.regenerated {
            self.save();
        }
        Ok(outcome)
    }

    /// "Refresh table" button: new values for the instance's table, then save.
    pub fn refresh_instance(&mut self, transition: &mut MeltTransition) -> MeltResult<()> {
        if transition.refresh_table(&mut self.store)? {
            self.save();
        }
        Ok(())
    }

    /// Transition start; see [`MeltTransition::start`].
    pub fn start_instance(
        &mut self,
        transition: &mut MeltTransition,
        backend: &mut dyn TextureBackend,
    ) -> MeltResult<()> {
        transition.start(&mut self.store, backend)
    }

    /// Instance destroyed by the host: its table reference is released.
    pub fn destroy_instance(&mut self, transition: MeltTransition) {
        transition.destroy(&mut self.store);
    }

    /// Save the store, logging instead of returning failures.
    pub fn save(&self) -> Option<SaveSummary> {
        tracing::info!("saving tables");
        match self.file.save(&self.store) {
            Ok(summary) => Some(summary),
            Err(err) => {
                tracing::error!(error = %err, "tables not saved");
                None
            }
        }
    }

    /// Module unload: save, then free every table.
    pub fn unload(self) -> MeltResult<SaveSummary> {
        tracing::info!("shutting down");
        let saved = self.file.save(&self.store);
        let freed = self.store.len();
        drop(self.store);
        tracing::info!(freed, "finished shutting down");
        saved
    }
}

#[cfg(test)]
#[path = "../tests/unit/plugin.rs"]
mod tests;
