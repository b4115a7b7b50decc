use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::*;
use crate::render::texture::TableTexture;
use crate::transition::settings::{Direction, TableSize};

#[derive(Debug)]
struct CountedTexture {
    resolution: u32,
    live: Arc<AtomicUsize>,
}

impl TableTexture for CountedTexture {
    fn resolution(&self) -> u32 {
        self.resolution
    }
}

impl Drop for CountedTexture {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct CountingBackend {
    created: usize,
    live: Arc<AtomicUsize>,
    last_texels: Vec<u8>,
}

impl TextureBackend for CountingBackend {
    fn create_r8(
        &mut self,
        resolution: u32,
        texels: &[u8],
    ) -> MeltResult<Box<dyn TableTexture>> {
        assert_eq!(texels.len(), (resolution * resolution) as usize);
        self.created += 1;
        self.live.fetch_add(1, Ordering::SeqCst);
        self.last_texels = texels.to_vec();
        Ok(Box::new(CountedTexture {
            resolution,
            live: Arc::clone(&self.live),
        }))
    }
}

fn store() -> TableStore {
    TableStore::with_clock(|| 500)
}

fn transition() -> MeltTransition {
    MeltTransition::with_rng(Rng64::new(11))
}

#[test]
fn first_update_creates_and_binds_a_table() {
    let mut store = store();
    let mut settings = MeltSettings::default();
    let mut tr = transition();

    let outcome = tr.update(&mut store, &mut settings).unwrap();
    assert!(outcome.created_table);
    assert!(outcome.regenerated);
    assert_ne!(settings.uuid, 0);
    assert_eq!(tr.table_uuid().map(TableUuid::get), Some(settings.uuid));

    let table = store.lookup(settings.uuid).unwrap();
    assert_eq!(table.reference_count(), 1);
    assert!(!table.is_dead());
    assert!(table.is_dirty());
    assert_eq!(table.values_size(), 256);
    assert_eq!(table.offsets_size(), 160);
    assert_eq!(table.position, 2);
    assert_eq!(table.values(), &LEGACY_VALUES[..]);
}

#[test]
fn unknown_uuid_is_replaced() {
    let mut store = store();
    let mut settings = MeltSettings {
        uuid: 987_654,
        ..MeltSettings::default()
    };
    let mut tr = transition();
    let outcome = tr.update(&mut store, &mut settings).unwrap();
    assert!(outcome.created_table);
    assert_ne!(settings.uuid, 987_654);
    assert_eq!(store.len(), 1);
}

#[test]
fn unchanged_update_is_a_noop() {
    let mut store = store();
    let mut settings = MeltSettings::default();
    let mut tr = transition();
    tr.update(&mut store, &mut settings).unwrap();
    let uuid = tr.table_uuid().unwrap();
    store.get_mut(uuid).unwrap().clear_dirty();

    let outcome = tr.update(&mut store, &mut settings).unwrap();
    assert_eq!(outcome, UpdateOutcome::default());
    assert!(!store.get(uuid).unwrap().is_dirty());
    assert_eq!(store.get(uuid).unwrap().reference_count(), 1);
}

#[test]
fn walk_parameter_change_marks_dirty_without_rebuilding_values() {
    let mut store = store();
    let mut settings = MeltSettings {
        random_type: ValueSource::Fixed,
        ..MeltSettings::default()
    };
    let mut tr = transition();
    tr.update(&mut store, &mut settings).unwrap();
    let uuid = tr.table_uuid().unwrap();
    let before = store.get(uuid).unwrap().values().to_vec();
    store.get_mut(uuid).unwrap().clear_dirty();

    settings.steps = 32;
    let outcome = tr.update(&mut store, &mut settings).unwrap();
    assert!(!outcome.regenerated);
    assert!(store.get(uuid).unwrap().is_dirty());
    assert_eq!(store.get(uuid).unwrap().values(), before.as_slice());
}

#[test]
fn geometry_change_rebuilds_values() {
    let mut store = store();
    let mut settings = MeltSettings {
        random_type: ValueSource::Fixed,
        ..MeltSettings::default()
    };
    let mut tr = transition();
    tr.update(&mut store, &mut settings).unwrap();

    settings.table_size = TableSize::Edge32;
    let outcome = tr.update(&mut store, &mut settings).unwrap();
    assert!(outcome.regenerated);
    assert!(!outcome.created_table);
    assert_eq!(store.lookup(settings.uuid).unwrap().values_size(), 1024);
}

#[test]
fn rebinding_moves_the_reference() {
    let mut store = store();
    let mut a_settings = MeltSettings::default();
    let mut a = transition();
    a.update(&mut store, &mut a_settings).unwrap();
    let first = a.table_uuid().unwrap();

    let other = store.create();
    a_settings.uuid = other.get();
    a.update(&mut store, &mut a_settings).unwrap();

    assert_eq!(store.get(first).unwrap().reference_count(), 0);
    assert_eq!(store.get(other).unwrap().reference_count(), 1);
    assert_eq!(store.consistency_warnings(), 0);
}

#[test]
fn two_instances_share_one_table() {
    let mut store = store();
    let mut settings = MeltSettings::default();
    let mut a = transition();
    a.update(&mut store, &mut settings).unwrap();

    let mut copy = settings.clone();
    let mut b = transition();
    let outcome = b.update(&mut store, &mut copy).unwrap();
    assert!(!outcome.created_table);
    assert_eq!(copy.uuid, settings.uuid);
    assert_eq!(store.lookup(settings.uuid).unwrap().reference_count(), 2);

    a.destroy(&mut store);
    assert_eq!(store.lookup(settings.uuid).unwrap().reference_count(), 1);
    b.destroy(&mut store);
    assert_eq!(store.lookup(settings.uuid).unwrap().reference_count(), 0);
    assert_eq!(store.consistency_warnings(), 0);
}

#[test]
fn start_builds_offsets_and_texture_and_advances_walk() {
    let mut store = store();
    let mut settings = MeltSettings::default();
    let mut tr = transition();
    let mut backend = CountingBackend::default();
    tr.update(&mut store, &mut settings).unwrap();
    let uuid = tr.table_uuid().unwrap();

    tr.start(&mut store, &mut backend).unwrap();
    let table = store.get(uuid).unwrap();
    assert!(!table.is_dirty());
    assert_eq!(table.texture().unwrap().resolution(), 16);
    assert_eq!(backend.last_texels.len(), 256);
    assert_eq!(&backend.last_texels[..160], table.offsets());
    // Legacy walk from position 2 over 160 slices.
    assert_eq!(table.position, 161);
    assert_eq!(table.offsets()[0], 130);

    tr.start(&mut store, &mut backend).unwrap();
    assert_eq!(store.get(uuid).unwrap().position, 64);
    assert_eq!(backend.created, 2);
    // The replaced texture was dropped.
    assert_eq!(backend.live.load(Ordering::SeqCst), 1);
}

#[test]
fn prepare_skips_clean_tables() {
    let mut store = store();
    let mut settings = MeltSettings::default();
    let mut tr = transition();
    let mut backend = CountingBackend::default();
    tr.update(&mut store, &mut settings).unwrap();

    assert!(tr.prepare(&mut store, &mut backend).unwrap());
    assert!(!tr.prepare(&mut store, &mut backend).unwrap());
    assert_eq!(backend.created, 1);

    settings.factor = 90;
    tr.update(&mut store, &mut settings).unwrap();
    assert!(tr.prepare(&mut store, &mut backend).unwrap());
    assert_eq!(backend.created, 2);
}

#[test]
fn dynamic_tables_get_new_values_on_every_start() {
    let mut store = store();
    let mut settings = MeltSettings {
        random_type: ValueSource::Dynamic,
        ..MeltSettings::default()
    };
    let mut tr = transition();
    let mut backend = CountingBackend::default();
    tr.update(&mut store, &mut settings).unwrap();
    let uuid = tr.table_uuid().unwrap();

    let before = store.get(uuid).unwrap().values().to_vec();
    tr.start(&mut store, &mut backend).unwrap();
    let after = store.get(uuid).unwrap().values().to_vec();
    assert_ne!(before, after);
    // Rebuilding values restarts the walk at 2.
    assert_eq!(store.get(uuid).unwrap().position, 161);
}

#[test]
fn refresh_table_requires_configuration() {
    let mut store = store();
    let mut tr = transition();
    assert!(!tr.refresh_table(&mut store).unwrap());

    let mut settings = MeltSettings {
        random_type: ValueSource::Fixed,
        ..MeltSettings::default()
    };
    tr.update(&mut store, &mut settings).unwrap();
    let uuid = tr.table_uuid().unwrap();
    let before = store.get(uuid).unwrap().values().to_vec();
    assert!(tr.refresh_table(&mut store).unwrap());
    assert_ne!(store.get(uuid).unwrap().values(), before.as_slice());
}

#[test]
fn invalid_settings_leave_the_store_alone() {
    let mut store = store();
    let mut settings = MeltSettings {
        slices: 0,
        ..MeltSettings::default()
    };
    let mut tr = transition();
    assert!(tr.update(&mut store, &mut settings).is_err());
    assert!(store.is_empty());
    assert!(tr.table_uuid().is_none());
}

#[test]
fn uniforms_follow_parameters() {
    let mut store = store();
    let mut settings = MeltSettings {
        direction: Direction::Left,
        factor: 50,
        slices: 100,
        ..MeltSettings::default()
    };
    let mut tr = transition();
    assert!(tr.uniforms(0.5).is_none());
    tr.update(&mut store, &mut settings).unwrap();

    let u = tr.uniforms(0.5).unwrap();
    assert_eq!(u.factor, [0.5, 2.0]);
    assert_eq!(u.sizes, [100.0, 16.0, 0.01, 1.0 / 16.0]);
    assert_eq!(u.dir, [-1.0, 0.0]);
    assert_eq!(u.dir_mask, [1.0, 0.0, -1.0]);
    assert_eq!(u.progress, [0.5, 0.75]);
}

#[test]
fn audio_gains_use_configured_mode() {
    let mut store = store();
    let tr = transition();
    assert_eq!(tr.audio_gains(0.5), (0.0, 0.0));

    let mut settings = MeltSettings {
        audio_mode: crate::audio::crossfade::AudioMode::Linear,
        ..MeltSettings::default()
    };
    let mut tr = transition();
    tr.update(&mut store, &mut settings).unwrap();
    assert_eq!(tr.audio_gains(0.25), (0.75, 0.25));
}
