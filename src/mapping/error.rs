use thiserror::Error;

/// Invalid mapping configuration, rejected when a [`Mapping`](super::Mapping) is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("a mapping needs at least two layers, got {0}")]
    TooFewLayers(usize),

    #[error(
        "{layers} layers need {} rule pairs, got {mapping_rules} mapping and {distance_rules} distance rules",
        .layers.saturating_sub(1)
    )]
    RuleCountMismatch {
        layers: usize,
        mapping_rules: usize,
        distance_rules: usize,
    },

    #[error("topological mapping at stage {stage} needs equal topology: '{from}' has {from_triangles} triangles, '{to}' has {to_triangles}")]
    TopologyMismatch {
        stage: usize,
        from: String,
        from_triangles: usize,
        to: String,
        to_triangles: usize,
    },

    #[error("unknown mapping rule id {0}")]
    UnknownMappingRule(u8),

    #[error("unknown distance rule id {0}")]
    UnknownDistanceRule(u8),

    #[error("unknown rule name '{0}'")]
    UnknownRuleName(String),
}

/// Geometric reason a single point could not be carried through the layers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingFailure {
    #[error("projection along the surface normal hit nothing")]
    NoIntersection,

    #[error("uv coordinate lies on no triangle of the target layer")]
    EmptyUvResolution,

    #[error("point lies outside the masking layer")]
    OutsideMask,

    #[error("layer surface has no usable triangles")]
    Degenerate,
}
