//! Core of a "melting screen" wipe transition.
//!
//! The outgoing picture is cut into slices that slide away at slightly different speeds. The
//! per-slice offsets come from a noise table that is shared between transition instances and
//! persisted across sessions:
//!
//! - [`TableStore`] owns every [`MeltTable`] and hands out [`TableLease`]s to instances
//! - [`TablesFile`] saves and loads the store (`TABLES1.WAD`)
//! - [`MeltTransition`] maps user settings onto a table and rebuilds offsets per start
//! - [`MeltPlugin`] ties the above to host load/unload and instance callbacks
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod audio;
pub(crate) mod plugin;
pub(crate) mod render;
pub(crate) mod table;
pub(crate) mod transition;

pub use crate::foundation::core::{
    HEADER_SIZE, MAX_BUFFER_SIZE, MAX_SLICES, MAX_STEPS, MIN_SLICES, MIN_STEPS,
    PERSISTED_VALUES_LEN, StateFlags, TABLES_FILE_NAME, TableUuid,
};
pub use crate::foundation::error::{MeltError, MeltResult};
pub use crate::foundation::math::{Rng64, unix_nanos};

pub use crate::audio::crossfade::AudioMode;
pub use crate::plugin::MeltPlugin;
pub use crate::render::texture::{CpuTexture, CpuTextureBackend, TableTexture, TextureBackend};
pub use crate::table::codec::{FORMAT_VERSION, PackedRecord, RECORD_SIZE, header_notice};
pub use crate::table::generate::{
    LEGACY_VALUES, OffsetParams, ValueSource, fill_legacy_values, fill_values, generate_offsets,
    generate_values,
};
pub use crate::table::model::MeltTable;
pub use crate::table::persist::{
    LoadSummary, SaveSummary, TablesFile, decode_tables, encode_tables, load_all, save_all,
};
pub use crate::table::store::{TableLease, TableStore};
pub use crate::transition::instance::{MeltTransition, UpdateOutcome};
pub use crate::transition::settings::{
    Direction, MeltParams, MeltSettings, TableGeometry, TableSize,
};
pub use crate::transition::uniforms::MeltUniforms;
