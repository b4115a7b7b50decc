use crate::{
    foundation::error::{MeltError, MeltResult},
    foundation::math::Rng64,
    table::model::MeltTable,
};

/// Canonical 256-entry value table of the classic melt effect.
pub const LEGACY_VALUES: [u8; 256] = [
    0, 8, 109, 220, 222, 241, 149, 107, 75, 248, 254, 140, 16, 66, 74, 21, 211, 47, 80, 242, 154,
    27, 205, 128, 161, 89, 77, 36, 95, 110, 85, 48, 212, 140, 211, 249, 22, 79, 200, 50, 28, 188,
    52, 140, 202, 120, 68, 145, 62, 70, 184, 190, 91, 197, 152, 224, 149, 104, 25, 178, 252, 182,
    202, 182, 141, 197, 4, 81, 181, 242, 145, 42, 39, 227, 156, 198, 225, 193, 219, 93, 122, 175,
    249, 0, 175, 143, 70, 239, 46, 246, 163, 53, 163, 109, 168, 135, 2, 235, 25, 92, 20, 145, 138,
    77, 69, 166, 78, 176, 173, 212, 166, 113, 94, 161, 41, 50, 239, 49, 111, 164, 70, 60, 2, 37,
    171, 75, 136, 156, 11, 56, 42, 146, 138, 229, 73, 146, 77, 61, 98, 196, 135, 106, 63, 197, 195,
    86, 96, 203, 113, 101, 170, 247, 181, 113, 80, 250, 108, 7, 255, 237, 129, 226, 79, 107, 112,
    166, 103, 241, 24, 223, 239, 120, 198, 58, 60, 82, 128, 3, 184, 66, 143, 224, 145, 224, 81,
    206, 163, 45, 63, 90, 168, 114, 59, 33, 159, 95, 28, 139, 123, 98, 125, 196, 15, 70, 194, 253,
    54, 14, 109, 226, 71, 17, 161, 93, 186, 87, 244, 138, 20, 52, 123, 251, 26, 36, 17, 46, 52,
    231, 232, 76, 31, 221, 84, 37, 216, 165, 212, 106, 197, 242, 98, 43, 39, 175, 254, 145, 190,
    84, 118, 222, 187, 136, 120, 163, 236, 249,
];

/// Where a table's values come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// The canonical [`LEGACY_VALUES`] table.
    #[default]
    Legacy,
    /// Random values, generated once and kept across transitions.
    Fixed,
    /// Random values, regenerated at every transition start.
    Dynamic,
}

/// Fill `values[..values_size]` with uniform random bytes.
pub fn generate_values(table: &mut MeltTable, rng: &mut Rng64) {
    let size = usize::from(table.values_size);
    rng.fill_bytes(&mut table.values[..size]);
}

/// Copy the canonical legacy table into the values buffer.
pub fn fill_legacy_values(table: &mut MeltTable) {
    table.values[..LEGACY_VALUES.len()].copy_from_slice(&LEGACY_VALUES);
}

/// Regenerate values according to `source`.
pub fn fill_values(table: &mut MeltTable, source: ValueSource, rng: &mut Rng64) {
    match source {
        ValueSource::Legacy => fill_legacy_values(table),
        ValueSource::Fixed | ValueSource::Dynamic => generate_values(table, rng),
    }
}

/// Parameters of the offsets walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OffsetParams {
    /// Number of distinct offset levels; at least 2.
    pub steps: u16,
    /// Walk step magnitude as a fraction of `steps`.
    pub increment: f32,
    /// Fraction of the full 0..=255 displacement range the walk may use.
    pub factor: f32,
}

impl OffsetParams {
    /// Reject parameters the walk cannot use.
    pub fn validate(&self) -> MeltResult<()> {
        if !(2..=256).contains(&self.steps) {
            return Err(MeltError::validation(format!(
                "offset steps must be in 2..=256, got {}",
                self.steps
            )));
        }
        if !self.increment.is_finite() || self.increment < 0.0 {
            return Err(MeltError::validation(
                "offset increment must be finite and >= 0",
            ));
        }
        if !self.factor.is_finite() || self.factor < 0.0 {
            return Err(MeltError::validation(
                "offset factor must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// Derive `offsets[..offsets_size]` from the values buffer with a bounded random walk.
///
/// The walk starts at `table.position` and leaves the cursor where it stopped, so the next call
/// continues the same noise sequence. Each step moves by `values[pos] % inc_modulo - inc_value`
/// (so within `-inc_value..=inc_value`), clamped to `0..=steps - 1`. Levels are finally scaled
/// to display units by `round(255 * factor / (steps - 1))`.
pub fn generate_offsets(table: &mut MeltTable, params: OffsetParams) -> MeltResult<()> {
    params.validate()?;
    let size = usize::from(table.values_size);
    if size == 0 {
        return Err(MeltError::validation(format!(
            "table {} has no values to derive offsets from",
            table.uuid
        )));
    }
    let slices = usize::from(table.offsets_size);
    if slices == 0 {
        return Ok(());
    }

    let steps = i32::from(params.steps);
    let max_step = steps - 1;
    let step_size = (255.0 * f64::from(params.factor) / f64::from(max_step)).round() as u8;
    // A step larger than the whole level range behaves like `max_step`.
    let inc_value =
        ((f32::from(params.steps) * params.increment).round() as i32).clamp(1, max_step);
    let inc_modulo = (inc_value * 2 + 1).max(3);

    let values = &table.values;
    let offsets = &mut table.offsets;

    let mut pos = usize::from(table.position) % size;
    offsets[0] = (i32::from(values[pos]) % steps) as u8;

    for i in 1..slices {
        let prev = i32::from(offsets[i - 1]);
        pos += 1;
        if pos == size {
            pos = 0;
        }
        let delta = i32::from(values[pos]) % inc_modulo - inc_value;
        offsets[i] = (prev - delta).clamp(0, max_step) as u8;
    }

    table.position = pos as u16;

    for offset in &mut offsets[..slices] {
        *offset = offset.saturating_mul(step_size);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/table/generate.rs"]
mod tests;
