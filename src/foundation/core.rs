use std::num::NonZeroU64;

/// Smallest slice count a transition accepts.
pub const MIN_SLICES: u16 = 2;
/// Largest slice count a transition accepts.
pub const MAX_SLICES: u16 = 1600;
/// Smallest walk step count a transition accepts.
pub const MIN_STEPS: u16 = 4;
/// Largest walk step count a transition accepts.
pub const MAX_STEPS: u16 = 64;
/// Capacity of every table buffer (values and offsets), in bytes.
///
/// A 64x64 noise table is the largest configurable resolution.
pub const MAX_BUFFER_SIZE: usize = 4096;
/// Size of the values block stored after each record in the tables file.
pub const PERSISTED_VALUES_LEN: usize = MAX_BUFFER_SIZE;
/// Size of the human-readable notice at the start of the tables file.
pub const HEADER_SIZE: usize = 48;
/// File name of the tables file inside the plugin config directory.
pub const TABLES_FILE_NAME: &str = "TABLES1.WAD";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Non-zero 64-bit identifier of a melt table.
pub struct TableUuid(NonZeroU64);

impl TableUuid {
    /// Wrap a raw id; `None` for zero, which always means "no table".
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Access raw 64-bit identifier.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for TableUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Table state bitset. `DIRTY` and `DEAD` are independent.
pub struct StateFlags(u8);

impl StateFlags {
    /// Offsets/texture are stale and must be regenerated before the next render.
    pub const DIRTY: Self = Self(0b0000_0001);
    /// No owner claimed the table; dropped at the next save if still unreferenced.
    pub const DEAD: Self = Self(0b0000_0010);

    /// Empty flag set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for StateFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
