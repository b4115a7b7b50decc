/// How the outgoing (`a`) and incoming (`b`) audio are mixed during the transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    /// Cubic ease-in-out crossfade.
    Smooth,
    /// Linear crossfade.
    Linear,
    /// Hard cut at the swap point.
    Swap,
    /// Outgoing audio silenced; incoming audio only once the transition has finished.
    #[default]
    Mute,
}

impl AudioMode {
    /// Gains `(a, b)` at progress `t` in `0..=1`.
    ///
    /// `swap_point` is only used by [`AudioMode::Swap`].
    pub fn gains(self, t: f32, swap_point: f32) -> (f32, f32) {
        match self {
            Self::Smooth => {
                let e = cubic_ease_in_out(t);
                (1.0 - e, e)
            }
            Self::Linear => (1.0 - t, t),
            Self::Swap => {
                if t < swap_point {
                    (1.0, 0.0)
                } else {
                    (0.0, 1.0)
                }
            }
            Self::Mute => (0.0, t.floor()),
        }
    }
}

fn cubic_ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = 2.0 * t - 2.0;
        (t - 1.0) * u * u + 1.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/crossfade.rs"]
mod tests;
