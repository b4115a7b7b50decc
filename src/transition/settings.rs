use crate::{
    audio::crossfade::AudioMode,
    foundation::core::{MAX_STEPS, MAX_SLICES, MIN_SLICES, MIN_STEPS},
    foundation::error::{MeltError, MeltResult},
    foundation::math::square_edge_for,
    table::generate::{OffsetParams, ValueSource},
};

/// Direction the slices melt towards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Slices move up.
    Up,
    /// Slices move right.
    Right,
    /// Slices move down, like the classic melt.
    #[default]
    Down,
    /// Slices move left.
    Left,
}

impl Direction {
    /// Unit vector in texture space (y grows downwards).
    pub fn vector(self) -> [f32; 2] {
        match self {
            Self::Up => [0.0, -1.0],
            Self::Right => [1.0, 0.0],
            Self::Down => [0.0, 1.0],
            Self::Left => [-1.0, 0.0],
        }
    }
}

/// Edge length of the square noise table.
///
/// Stored by hosts as an integer: `-1` for auto, otherwise the edge length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TableSize {
    /// Smallest square that fits the slice count.
    Auto,
    /// 8x8 table.
    Edge8,
    /// 16x16 table, the classic size.
    #[default]
    Edge16,
    /// 32x32 table.
    Edge32,
    /// 64x64 table.
    Edge64,
}

impl TableSize {
    /// Fixed edge length, `None` for [`TableSize::Auto`].
    pub fn edge(self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::Edge8 => Some(8),
            Self::Edge16 => Some(16),
            Self::Edge32 => Some(32),
            Self::Edge64 => Some(64),
        }
    }
}

impl TryFrom<i64> for TableSize {
    type Error = String;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(Self::Auto),
            8 => Ok(Self::Edge8),
            16 => Ok(Self::Edge16),
            32 => Ok(Self::Edge32),
            64 => Ok(Self::Edge64),
            other => Err(format!(
                "table_size must be -1, 8, 16, 32 or 64, got {other}"
            )),
        }
    }
}

impl From<TableSize> for i64 {
    fn from(v: TableSize) -> Self {
        v.edge().map_or(-1, i64::from)
    }
}

/// Host-editable settings of one transition, as stored in the host's settings object.
///
/// Integer fields keep the host's slider units: `factor` and `swap_point` are percentages,
/// `increment` is in 1/400 units. Missing fields take the classic melt defaults.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MeltSettings {
    /// Bound table; 0 until a table has been assigned.
    pub uuid: u64,
    /// Ignore every other field and use the classic parameters.
    pub use_original: bool,
    /// Number of slices the picture is cut into.
    pub slices: u16,
    /// How far behind a slice may lag, in percent of the picture.
    pub factor: u8,
    /// Distinct offset levels.
    pub steps: u16,
    /// Walk step size, in 1/400 of `steps`.
    pub increment: u8,
    /// Direction the slices move in.
    pub direction: Direction,
    /// Where the table values come from.
    pub random_type: ValueSource,
    /// Noise table edge length.
    pub table_size: TableSize,
    /// How audio is mixed during the transition.
    pub audio_mode: AudioMode,
    /// Progress in percent at which [`AudioMode::Swap`] cuts over.
    pub swap_point: u8,
}

impl Default for MeltSettings {
    fn default() -> Self {
        Self {
            uuid: 0,
            use_original: false,
            slices: 160,
            factor: 60,
            steps: 16,
            increment: 25,
            direction: Direction::Down,
            random_type: ValueSource::Legacy,
            table_size: TableSize::Edge16,
            audio_mode: AudioMode::Mute,
            swap_point: 50,
        }
    }
}

impl MeltSettings {
    /// Parse host settings JSON. Missing keys take defaults, unknown keys are ignored.
    pub fn from_json_str(s: &str) -> MeltResult<Self> {
        serde_json::from_str(s).map_err(|e| MeltError::serde(format!("melt settings: {e}")))
    }

    /// Parse settings from an already decoded JSON value.
    pub fn from_json_value(v: serde_json::Value) -> MeltResult<Self> {
        serde_json::from_value(v).map_err(|e| MeltError::serde(format!("melt settings: {e}")))
    }

    /// Settings as a JSON value, in the shape the host stores.
    pub fn to_json_value(&self) -> MeltResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| MeltError::serde(format!("melt settings: {e}")))
    }

    /// Check every field against the host slider ranges.
    pub fn validate(&self) -> MeltResult<()> {
        if !(MIN_SLICES..=MAX_SLICES).contains(&self.slices) {
            return Err(MeltError::validation(format!(
                "slices must be in {MIN_SLICES}..={MAX_SLICES}, got {}",
                self.slices
            )));
        }
        if !(MIN_STEPS..=MAX_STEPS).contains(&self.steps) {
            return Err(MeltError::validation(format!(
                "steps must be in {MIN_STEPS}..={MAX_STEPS}, got {}",
                self.steps
            )));
        }
        for (name, v) in [
            ("factor", self.factor),
            ("increment", self.increment),
            ("swap_point", self.swap_point),
        ] {
            if !(1..=100).contains(&v) {
                return Err(MeltError::validation(format!(
                    "{name} must be in 1..=100, got {v}"
                )));
            }
        }
        Ok(())
    }

    /// Effective parameters. `use_original` wins over every other field.
    pub fn resolve(&self) -> MeltResult<MeltParams> {
        if self.use_original {
            return Ok(MeltParams::original());
        }
        self.validate()?;
        Ok(MeltParams {
            slices: self.slices,
            factor: 0.01 * f32::from(self.factor),
            steps: self.steps,
            increment: 0.0025 * f32::from(self.increment),
            direction: self.direction,
            value_source: self.random_type,
            table_size: self.table_size,
            audio_mode: self.audio_mode,
            swap_point: 0.01 * f32::from(self.swap_point),
        })
    }
}

/// Resolved transition parameters in render units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeltParams {
    /// Number of slices.
    pub slices: u16,
    /// Fraction of the picture a slice may lag behind, `0..=1`.
    pub factor: f32,
    /// Distinct offset levels.
    pub steps: u16,
    /// Walk step as a fraction of `steps`.
    pub increment: f32,
    /// Direction the slices move in.
    pub direction: Direction,
    /// Where the table values come from.
    pub value_source: ValueSource,
    /// Noise table edge length.
    pub table_size: TableSize,
    /// Audio mixing mode.
    pub audio_mode: AudioMode,
    /// Swap progress in `0..=1`.
    pub swap_point: f32,
}

impl MeltParams {
    /// The classic melt: 160 slices falling down, 16 steps, canonical values, muted audio.
    pub fn original() -> Self {
        Self {
            slices: 160,
            factor: 0.6,
            steps: 16,
            increment: 0.0625,
            direction: Direction::Down,
            value_source: ValueSource::Legacy,
            table_size: TableSize::Edge16,
            audio_mode: AudioMode::Mute,
            swap_point: 0.5,
        }
    }

    /// Parameters of the offsets walk.
    pub fn offset_params(&self) -> OffsetParams {
        OffsetParams {
            steps: self.steps,
            increment: self.increment,
            factor: self.factor,
        }
    }

    /// Table and texture sizes these parameters need.
    pub fn geometry(&self) -> TableGeometry {
        TableGeometry::new(self.slices, self.table_size)
    }

    /// True when switching from `prev` to `self` changes the table's values buffer.
    pub(crate) fn changes_values(&self, prev: &Self) -> bool {
        self.value_source != prev.value_source || self.geometry() != prev.geometry()
    }
}

/// Sizes a table and its texture need for a given slice count and table size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableGeometry {
    /// Edge of the smallest power-of-two square holding the slices.
    pub slice_resolution: u32,
    /// Edge of the noise (values) square.
    pub noise_resolution: u32,
    /// Edge of the offsets texture.
    pub texture_resolution: u32,
    /// `noise_resolution` squared.
    pub values_size: u16,
    /// One offset per slice.
    pub offsets_size: u16,
}

impl TableGeometry {
    /// Geometry for `slices` slices and the requested table size.
    pub fn new(slices: u16, table_size: TableSize) -> Self {
        let slice_resolution = square_edge_for(u32::from(slices));
        let noise_resolution = table_size.edge().unwrap_or(slice_resolution);
        Self {
            slice_resolution,
            noise_resolution,
            texture_resolution: slice_resolution.max(noise_resolution),
            values_size: (noise_resolution * noise_resolution) as u16,
            offsets_size: slices,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/settings.rs"]
mod tests;
