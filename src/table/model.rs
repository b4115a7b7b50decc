use crate::{
    foundation::core::{MAX_BUFFER_SIZE, StateFlags, TableUuid},
    render::texture::TableTexture,
};

/// One shared noise table: a values buffer, the offsets derived from it, and bookkeeping.
#[derive(Debug)]
pub struct MeltTable {
    pub(crate) uuid: TableUuid,
    /// Cursor into `values` where the next offsets walk starts.
    pub position: u16,
    pub(crate) reference_count: u32,
    pub(crate) flags: StateFlags,
    pub(crate) values_size: u16,
    pub(crate) offsets_size: u16,
    pub(crate) values: Box<[u8]>,
    pub(crate) offsets: Box<[u8]>,
    pub(crate) texture: Option<Box<dyn TableTexture>>,
}

impl MeltTable {
    /// Fresh unreferenced table: zeroed buffers at full capacity, no content yet.
    pub(crate) fn new(uuid: TableUuid) -> Self {
        Self::with_values(uuid, vec![0u8; MAX_BUFFER_SIZE].into_boxed_slice())
    }

    pub(crate) fn with_values(uuid: TableUuid, values: Box<[u8]>) -> Self {
        debug_assert_eq!(values.len(), MAX_BUFFER_SIZE);
        Self {
            uuid,
            position: 0,
            reference_count: 0,
            flags: StateFlags::DIRTY | StateFlags::DEAD,
            values_size: 0,
            offsets_size: 0,
            values,
            offsets: vec![0u8; MAX_BUFFER_SIZE].into_boxed_slice(),
            texture: None,
        }
    }

    /// Identifier of the table.
    pub fn uuid(&self) -> TableUuid {
        self.uuid
    }

    /// Number of transitions currently holding the table.
    pub fn reference_count(&self) -> u32 {
        self.reference_count
    }

    /// Current state bits.
    pub fn flags(&self) -> StateFlags {
        self.flags
    }

    /// Offsets and texture need to be rebuilt.
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(StateFlags::DIRTY)
    }

    /// No owner claimed the table since it was loaded or created.
    pub fn is_dead(&self) -> bool {
        self.flags.contains(StateFlags::DEAD)
    }

    /// Unreferenced and dead: dropped by the next save.
    pub fn is_collectable(&self) -> bool {
        self.reference_count == 0 && self.is_dead()
    }

    /// Used bytes of the values buffer.
    pub fn values_size(&self) -> u16 {
        self.values_size
    }

    /// Used bytes of the offsets buffer, one per slice.
    pub fn offsets_size(&self) -> u16 {
        self.offsets_size
    }

    /// Resize the used portion of both buffers.
    ///
    /// Sizes are clamped to the buffer capacity.
    pub fn set_sizes(&mut self, values_size: u16, offsets_size: u16) {
        let cap = MAX_BUFFER_SIZE as u16;
        self.values_size = values_size.min(cap);
        self.offsets_size = offsets_size.min(cap);
    }

    /// Used part of the values buffer.
    pub fn values(&self) -> &[u8] {
        &self.values[..usize::from(self.values_size)]
    }

    /// Used part of the offsets buffer.
    pub fn offsets(&self) -> &[u8] {
        &self.offsets[..usize::from(self.offsets_size)]
    }

    /// Whole values buffer, regardless of `values_size`.
    pub fn values_buffer(&self) -> &[u8] {
        &self.values
    }

    /// Whole values buffer for in-place generation.
    pub fn values_buffer_mut(&mut self) -> &mut [u8] {
        &mut self.values
    }

    /// Whole offsets buffer, regardless of `offsets_size`.
    pub fn offsets_buffer(&self) -> &[u8] {
        &self.offsets
    }

    /// Texture built from the offsets, if any.
    pub fn texture(&self) -> Option<&dyn TableTexture> {
        self.texture.as_deref()
    }

    /// Replace the texture; the previous one is dropped here.
    pub fn set_texture(&mut self, texture: Option<Box<dyn TableTexture>>) {
        self.texture = texture;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.flags.remove(StateFlags::DIRTY);
    }
}
