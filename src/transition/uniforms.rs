use crate::foundation::math::lerp;

/// Per-frame parameter block fed to the melt shader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeltUniforms {
    /// `[factor, 1 / factor]`.
    pub factor: [f32; 2],
    /// `[slices, texture_resolution, 1 / slices, 1 / texture_resolution]`.
    pub sizes: [f32; 4],
    /// Melt direction as a unit vector.
    pub dir: [f32; 2],
    /// `[|x|, |y|, lerp(x, y, |y|)]`: axis selector plus signed direction along that axis.
    pub dir_mask: [f32; 3],
    /// `[t, t * (1 + factor)]`.
    pub progress: [f32; 2],
}

impl MeltUniforms {
    /// Parameters at progress `t` in `0..=1`.
    pub fn new(factor: f32, slices: u16, texture_resolution: u32, dir: [f32; 2], t: f32) -> Self {
        let slices = f32::from(slices);
        let res = texture_resolution as f32;
        let [x, y] = dir;
        Self {
            factor: [factor, 1.0 / factor],
            sizes: [slices, res, 1.0 / slices, 1.0 / res],
            dir,
            dir_mask: [x.abs(), y.abs(), lerp(x, y, y.abs())],
            progress: [t, t * (1.0 + factor)],
        }
    }
}
