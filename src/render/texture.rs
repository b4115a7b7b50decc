use crate::foundation::error::MeltResult;

/// GPU resource built from a table's offsets buffer.
///
/// Dropping the value must release the underlying resource.
pub trait TableTexture: Send + std::fmt::Debug {
    /// Edge length in texels of the square single-channel texture.
    fn resolution(&self) -> u32;
}

/// Seam to the host graphics layer.
pub trait TextureBackend {
    /// Create a square R8 texture of `resolution x resolution` texels from `texels`.
    ///
    /// `texels.len()` is exactly `resolution * resolution`.
    fn create_r8(&mut self, resolution: u32, texels: &[u8]) -> MeltResult<Box<dyn TableTexture>>;
}

#[derive(Debug)]
/// CPU-side copy of a table texture, for hosts without a graphics context and for tooling.
pub struct CpuTexture {
    /// Edge length in texels.
    pub resolution: u32,
    /// Row-major R8 texels.
    pub texels: Vec<u8>,
}

impl TableTexture for CpuTexture {
    fn resolution(&self) -> u32 {
        self.resolution
    }
}

#[derive(Clone, Copy, Debug, Default)]
/// Backend producing [`CpuTexture`] values.
pub struct CpuTextureBackend;

impl TextureBackend for CpuTextureBackend {
    fn create_r8(&mut self, resolution: u32, texels: &[u8]) -> MeltResult<Box<dyn TableTexture>> {
        Ok(Box::new(CpuTexture {
            resolution,
            texels: texels.to_vec(),
        }))
    }
}
