use crate::{
    foundation::core::TableUuid,
    foundation::error::{MeltError, MeltResult},
    foundation::math::Rng64,
    render::texture::TextureBackend,
    table::generate::{LEGACY_VALUES, ValueSource, fill_values, generate_offsets},
    table::store::{TableLease, TableStore},
    transition::settings::{MeltParams, MeltSettings},
    transition::uniforms::MeltUniforms,
};

/// Cursor the offsets walk restarts from whenever the values are rebuilt.
const WALK_START: u16 = 2;

/// What an [`MeltTransition::update`] did to the table store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// No usable table was bound, so a new one was created and its UUID written to the settings.
    pub created_table: bool,
    /// The values buffer was rebuilt; the store should be saved.
    pub regenerated: bool,
}

/// One configured transition, bound to a shared melt table.
#[derive(Debug)]
pub struct MeltTransition {
    lease: Option<TableLease>,
    params: Option<MeltParams>,
    rng: Rng64,
}

impl Default for MeltTransition {
    fn default() -> Self {
        Self::new()
    }
}

impl MeltTransition {
    /// Unconfigured transition with a clock-seeded generator.
    pub fn new() -> Self {
        Self::with_rng(Rng64::from_time())
    }

    /// Unconfigured transition drawing random values from `rng`.
    pub fn with_rng(rng: Rng64) -> Self {
        Self {
            lease: None,
            params: None,
            rng,
        }
    }

    /// Bound table, once an update succeeded.
    pub fn table_uuid(&self) -> Option<TableUuid> {
        self.lease.as_ref().map(TableLease::uuid)
    }

    /// Parameters of the last successful update.
    pub fn params(&self) -> Option<&MeltParams> {
        self.params.as_ref()
    }

    /// Apply new settings.
    ///
    /// Binds the table named by `settings.uuid`, creating one (and writing its UUID back) when
    /// the id is unset or unknown. Any parameter change marks the table dirty; a change of the
    /// table geometry or value source also rebuilds the values.
    pub fn update(
        &mut self,
        store: &mut TableStore,
        settings: &mut MeltSettings,
    ) -> MeltResult<UpdateOutcome> {
        let params = settings.resolve()?;
        let mut outcome = UpdateOutcome::default();

        let uuid = match store.lookup(settings.uuid) {
            Some(table) => table.uuid(),
            None => {
                if settings.uuid != 0 {
                    tracing::warn!(uuid = settings.uuid, "missing table, needs to be rebuilt");
                }
                let uuid = store.create();
                settings.uuid = uuid.get();
                outcome.created_table = true;
                uuid
            }
        };

        if self.table_uuid() != Some(uuid) {
            match self.lease.take() {
                Some(old) => {
                    tracing::info!(%uuid, from = %old.uuid(), "reassigning table");
                    store.leave(old);
                }
                None => tracing::info!(%uuid, "assigning table"),
            }
            self.lease = store.join(uuid);
        }

        let prev = self.params.replace(params);
        let geometry = params.geometry();
        let table = store
            .get(uuid)
            .ok_or_else(|| MeltError::validation(format!("table {uuid} vanished during update")))?;
        let stale_values = table.values_size() != geometry.values_size
            || table.offsets_size() != geometry.offsets_size
            || (params.value_source == ValueSource::Legacy
                && table.values_buffer()[..LEGACY_VALUES.len()] != LEGACY_VALUES)
            || prev.is_some_and(|p| params.changes_values(&p));

        if prev != Some(params) {
            store.mark_dirty(uuid);
        }
        if stale_values {
            self.rebuild_values(store, uuid, &params)?;
            outcome.regenerated = true;
        }
        Ok(outcome)
    }

    /// Rebuild the values of the bound table with the current parameters.
    ///
    /// Returns false when the transition has not been configured yet.
    pub fn refresh_table(&mut self, store: &mut TableStore) -> MeltResult<bool> {
        let (Some(uuid), Some(params)) = (self.table_uuid(), self.params) else {
            return Ok(false);
        };
        self.rebuild_values(store, uuid, &params)?;
        Ok(true)
    }

    /// Transition start: dynamic tables get new values, then offsets and texture are rebuilt.
    ///
    /// Every start advances the walk, so consecutive transitions melt differently.
    pub fn start(
        &mut self,
        store: &mut TableStore,
        backend: &mut dyn TextureBackend,
    ) -> MeltResult<()> {
        let (Some(uuid), Some(params)) = (self.table_uuid(), self.params) else {
            return Ok(());
        };
        if params.value_source == ValueSource::Dynamic {
            self.rebuild_values(store, uuid, &params)?;
        }
        store.mark_dirty(uuid);
        self.prepare(store, backend)?;
        Ok(())
    }

    /// Regenerate offsets and texture if the table is dirty or has no texture yet.
    ///
    /// Returns whether anything was rebuilt.
    pub fn prepare(
        &mut self,
        store: &mut TableStore,
        backend: &mut dyn TextureBackend,
    ) -> MeltResult<bool> {
        let (Some(uuid), Some(params)) = (self.table_uuid(), self.params) else {
            return Ok(false);
        };
        let table = store
            .get_mut(uuid)
            .ok_or_else(|| MeltError::validation(format!("bound table {uuid} is missing")))?;
        if !table.is_dirty() && table.texture().is_some() {
            return Ok(false);
        }

        generate_offsets(table, params.offset_params())?;

        let resolution = params.geometry().texture_resolution;
        let texels = (resolution * resolution) as usize;
        let texture = backend.create_r8(resolution, &table.offsets_buffer()[..texels])?;
        table.set_texture(Some(texture));
        table.clear_dirty();
        Ok(true)
    }

    /// Shader parameters at progress `t`, once configured.
    pub fn uniforms(&self, t: f32) -> Option<MeltUniforms> {
        let p = self.params?;
        Some(MeltUniforms::new(
            p.factor,
            p.slices,
            p.geometry().texture_resolution,
            p.direction.vector(),
            t,
        ))
    }

    /// Audio gains `(outgoing, incoming)` at progress `t`.
    pub fn audio_gains(&self, t: f32) -> (f32, f32) {
        let p = self.params.unwrap_or_else(MeltParams::original);
        p.audio_mode.gains(t, p.swap_point)
    }

    /// Release the bound table.
    pub fn destroy(mut self, store: &mut TableStore) {
        if let Some(lease) = self.lease.take() {
            store.leave(lease);
        }
    }

    fn rebuild_values(
        &mut self,
        store: &mut TableStore,
        uuid: TableUuid,
        params: &MeltParams,
    ) -> MeltResult<()> {
        let table = store
            .get_mut(uuid)
            .ok_or_else(|| MeltError::validation(format!("bound table {uuid} is missing")))?;
        let geometry = params.geometry();
        table.set_sizes(geometry.values_size, geometry.offsets_size);
        table.position = WALK_START;
        fill_values(table, params.value_source, &mut self.rng);
        store.mark_dirty(uuid);
        tracing::debug!(%uuid, values = geometry.values_size, "rebuilt table values");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/instance.rs"]
mod tests;
