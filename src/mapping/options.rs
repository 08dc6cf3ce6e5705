use serde::{Deserialize, Serialize};

/// Per-[`Mapping`](super::Mapping) query settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingOptions {
    /// Report failures as `Failed { path, stage, reason }` instead of `Unmapped`.
    pub debug: bool,

    /// Samples along a UV-space track, endpoints included.
    pub interpolation_steps: usize,

    /// Largest distance from the source point at which a normal projection may hit.
    pub ray_length: f64,
}

impl MappingOptions {
    #[must_use]
    pub const fn debug() -> Self {
        Self {
            debug: true,
            interpolation_steps: 10,
            ray_length: f64::INFINITY,
        }
    }

    #[must_use]
    pub const fn with_interpolation_steps(mut self, steps: usize) -> Self {
        self.interpolation_steps = steps;
        self
    }

    #[must_use]
    pub const fn with_ray_length(mut self, ray_length: f64) -> Self {
        self.ray_length = ray_length;
        self
    }
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            debug: false,
            ..Self::debug()
        }
    }
}
