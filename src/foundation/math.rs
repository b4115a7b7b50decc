#[derive(Clone, Copy, Debug)]
/// Small deterministic generator used for noise tables.
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    /// Seed the generator. Any value, including zero, is a valid seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the wall clock (nanoseconds since the Unix epoch).
    pub fn from_time() -> Self {
        Self::new(unix_nanos())
    }

    /// Next 64 uniformly distributed bits.
    pub fn next_u64(&mut self) -> u64 {
        // SplitMix64
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Next uniformly distributed byte.
    pub fn next_u8(&mut self) -> u8 {
        (self.next_u64() >> 56) as u8
    }

    /// Fill `dst` with uniform bytes.
    pub fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Wall-clock time in nanoseconds since the Unix epoch, saturating to 0 before it.
pub fn unix_nanos() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Smallest power of two `>= value`, never below 2.
pub(crate) fn next_power_of_two_min2(value: u32) -> u32 {
    let mut v = 2u32;
    while v < value {
        v *= 2;
    }
    v
}

/// `next_power_of_two_min2(floor(sqrt(value)))`: edge of a square that holds `value` slices.
pub(crate) fn square_edge_for(value: u32) -> u32 {
    next_power_of_two_min2(f64::from(value).sqrt() as u32)
}

pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (1.0 - t) * a + t * b
}
