//! Per-segment rule identifiers.
//!
//! Numeric identifiers follow the order of the variants and are stable, so
//! configurations stored as integers keep their meaning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::MappingError;

/// How a point is projected from one layer onto the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingRule {
    /// Nearest point on the next layer.
    Euclid,
    /// Surface normal at the nearest point of the current layer, projected onto the next layer.
    Normal,
    /// Area-uniform random point on the next layer.
    Random,
    /// Same barycentric position on the same triangle of the next layer.
    Topological,
    /// Same UV coordinate on the next layer.
    Uv,
    /// Keep the point if it lies inside the next layer's volume.
    Mask,
}

impl MappingRule {
    pub const ALL: [Self; 6] = [
        Self::Euclid,
        Self::Normal,
        Self::Random,
        Self::Topological,
        Self::Uv,
        Self::Mask,
    ];

    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Euclid => "euclid",
            Self::Normal => "normal",
            Self::Random => "random",
            Self::Topological => "topological",
            Self::Uv => "uv",
            Self::Mask => "mask",
        }
    }
}

/// How the path is extended between the current point and the projected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceRule {
    /// Straight line to the projected point.
    Euclid,
    /// Straight line; the UV distance is accounted on the terminal layer.
    EuclidUv,
    /// Jump to the next layer, then follow its UV space.
    JumpUv,
    /// Follow the current layer's UV space, then jump.
    UvJump,
    /// Follow the normal onto the next layer, then its UV space.
    NormalUv,
    /// Follow the current layer's UV space to the normal foot of the projected point.
    UvNormal,
}

impl DistanceRule {
    pub const ALL: [Self; 6] = [
        Self::Euclid,
        Self::EuclidUv,
        Self::JumpUv,
        Self::UvJump,
        Self::NormalUv,
        Self::UvNormal,
    ];

    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Euclid => "euclid",
            Self::EuclidUv => "euclid_uv",
            Self::JumpUv => "jump_uv",
            Self::UvJump => "uv_jump",
            Self::NormalUv => "normal_uv",
            Self::UvNormal => "uv_normal",
        }
    }
}

impl TryFrom<u8> for MappingRule {
    type Error = MappingError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(MappingError::UnknownMappingRule(id))
    }
}

impl TryFrom<u8> for DistanceRule {
    type Error = MappingError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(MappingError::UnknownDistanceRule(id))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

impl FromStr for MappingRule {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "top" | "topology" => Ok(Self::Topological),
            "mask3d" | "mask_3d" => Ok(Self::Mask),
            "euclidean" => Ok(Self::Euclid),
            key => Self::ALL
                .into_iter()
                .find(|rule| rule.name() == key)
                .ok_or_else(|| MappingError::UnknownRuleName(s.to_string())),
        }
    }
}

impl FromStr for DistanceRule {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        Self::ALL
            .into_iter()
            .find(|rule| rule.name() == key || rule.name().replace('_', "") == key)
            .ok_or_else(|| MappingError::UnknownRuleName(s.to_string()))
    }
}

impl fmt::Display for MappingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for DistanceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
