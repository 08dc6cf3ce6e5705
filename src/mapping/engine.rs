//! The layer-by-layer mapping state machine.
//!
//! A [`Mapping`] fixes an ordered chain of layers and one (mapping rule,
//! distance rule) pair per segment. Rule pairs are resolved to step functions
//! once, when the mapping is built; a query then walks the chain, stopping at
//! the first geometric failure.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geom::{AreaWeightedSampler, EngineMetrics, Point3, SurfaceSampler, TimingBucket, UvPoint, path_length};

use super::distance::{ExtendFn, extension};
use super::projection::{ProjectFn, Segment, Trace, projection};
use super::{DistanceRule, Layer, MappingError, MappingFailure, MappingOptions, MappingRule};

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Result of mapping one point through the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingOutcome {
    /// Every stage succeeded.
    Mapped {
        path: Vec<Point3>,
        /// UV coordinate of the mapped point on the last layer.
        uv: UvPoint,
        /// Sum of distances between consecutive path points.
        length: f64,
    },
    /// Stage `stage` failed; only reported with [`MappingOptions::debug`].
    Failed {
        path: Vec<Point3>,
        stage: usize,
        reason: MappingFailure,
    },
    /// Some stage failed.
    Unmapped,
}

impl MappingOutcome {
    #[must_use]
    pub const fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped { .. })
    }

    #[must_use]
    pub const fn uv(&self) -> Option<UvPoint> {
        match self {
            Self::Mapped { uv, .. } => Some(*uv),
            _ => None,
        }
    }

    #[must_use]
    pub const fn length(&self) -> Option<f64> {
        match self {
            Self::Mapped { length, .. } => Some(*length),
            _ => None,
        }
    }

    /// The full path when mapped, the partial path when failed in debug mode.
    #[must_use]
    pub fn path(&self) -> Option<&[Point3]> {
        match self {
            Self::Mapped { path, .. } | Self::Failed { path, .. } => Some(path),
            Self::Unmapped => None,
        }
    }

    #[must_use]
    pub const fn failure(&self) -> Option<(usize, MappingFailure)> {
        match self {
            Self::Failed { stage, reason, .. } => Some((*stage, *reason)),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mapping
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Stage {
    mapping: MappingRule,
    distance: DistanceRule,
    project: ProjectFn,
    extend: ExtendFn,
}

/// A validated layer chain with its per-segment rules.
#[derive(Debug, Clone)]
pub struct Mapping {
    layers: Vec<Layer>,
    stages: Vec<Stage>,
    options: MappingOptions,
}

impl Mapping {
    /// Validates the chain and resolves each rule pair to its steps.
    ///
    /// `n` layers need `n - 1` mapping rules and `n - 1` distance rules; the
    /// last pair is treated as the terminal (synaptic) segment.
    pub fn new(
        layers: Vec<Layer>,
        mapping_rules: &[MappingRule],
        distance_rules: &[DistanceRule],
        options: MappingOptions,
    ) -> Result<Self, MappingError> {
        if layers.len() < 2 {
            return Err(MappingError::TooFewLayers(layers.len()));
        }
        let segments = layers.len() - 1;
        if mapping_rules.len() != segments || distance_rules.len() != segments {
            return Err(MappingError::RuleCountMismatch {
                layers: layers.len(),
                mapping_rules: mapping_rules.len(),
                distance_rules: distance_rules.len(),
            });
        }

        let mut stages = Vec::with_capacity(segments);
        for (index, (&mapping, &distance)) in mapping_rules.iter().zip(distance_rules).enumerate() {
            let (from, to) = (&layers[index], &layers[index + 1]);
            if mapping == MappingRule::Topological
                && from.mesh().triangle_count() != to.mesh().triangle_count()
            {
                return Err(MappingError::TopologyMismatch {
                    stage: index,
                    from: from.name().to_string(),
                    from_triangles: from.mesh().triangle_count(),
                    to: to.name().to_string(),
                    to_triangles: to.mesh().triangle_count(),
                });
            }
            stages.push(Stage {
                mapping,
                distance,
                project: projection(mapping),
                extend: extension(mapping, distance, index + 1 == segments),
            });
        }

        log::debug!(
            "mapping over {} layers: {}",
            layers.len(),
            stages
                .iter()
                .map(|s| format!("{}/{}", s.mapping, s.distance))
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(Self { layers, stages, options })
    }

    /// Like [`Mapping::new`], with rules given by their numeric identifiers.
    pub fn from_ids(
        layers: Vec<Layer>,
        mapping_ids: &[u8],
        distance_ids: &[u8],
        options: MappingOptions,
    ) -> Result<Self, MappingError> {
        let mapping_rules = mapping_ids
            .iter()
            .map(|&id| MappingRule::try_from(id))
            .collect::<Result<Vec<_>, _>>()?;
        let distance_rules = distance_ids
            .iter()
            .map(|&id| DistanceRule::try_from(id))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(layers, &mapping_rules, &distance_rules, options)
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub const fn options(&self) -> &MappingOptions {
        &self.options
    }

    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn rules(&self) -> impl Iterator<Item = (MappingRule, DistanceRule)> + '_ {
        self.stages.iter().map(|s| (s.mapping, s.distance))
    }

    /// Maps `point`, which should lie on the first layer, through every stage.
    pub fn compute(&self, point: Point3, sampler: &mut dyn SurfaceSampler) -> MappingOutcome {
        let mut metrics = EngineMetrics::default();
        self.compute_with_metrics(point, sampler, &mut metrics)
    }

    pub fn compute_with_metrics(
        &self,
        point: Point3,
        sampler: &mut dyn SurfaceSampler,
        metrics: &mut EngineMetrics,
    ) -> MappingOutcome {
        let mut trace = Trace::new(point, self.options, sampler);
        let mut mapped = point;

        for (index, stage) in self.stages.iter().enumerate() {
            let segment = Segment {
                layer: &self.layers[index],
                next: &self.layers[index + 1],
            };
            let step = metrics
                .time(TimingBucket::MappingRule, || (stage.project)(&segment, &mut trace))
                .and_then(|next| {
                    metrics.time(TimingBucket::DistanceRule, || (stage.extend)(&segment, &mut trace, next))?;
                    Ok(next)
                });
            match step {
                Ok(next) => mapped = next,
                Err(reason) => return self.fail(trace, index, reason),
            }
        }

        let terminal = &self.layers[self.stages.len()];
        match metrics.time(TimingBucket::UvResolve, || terminal.map_3d_point_to_uv(mapped)) {
            Ok(uv) => {
                let path = trace.into_path();
                let length = path_length(&path);
                MappingOutcome::Mapped { path, uv, length }
            }
            Err(reason) => self.fail(trace, self.stages.len() - 1, reason),
        }
    }

    fn fail(&self, trace: Trace<'_>, stage: usize, reason: MappingFailure) -> MappingOutcome {
        log::debug!(
            "mapping failed at stage {stage} ({} -> {}): {reason}",
            self.layers[stage].name(),
            self.layers[stage + 1].name()
        );
        if self.options.debug {
            MappingOutcome::Failed {
                path: trace.into_path(),
                stage,
                reason,
            }
        } else {
            MappingOutcome::Unmapped
        }
    }

    /// Maps every point with its own sampler seeded from `seed` and the
    /// point's index, so results do not depend on evaluation order.
    #[must_use]
    pub fn compute_batch(&self, points: &[Point3], seed: u64) -> Vec<MappingOutcome> {
        let map_one = |(index, point): (usize, &Point3)| {
            let mut sampler = AreaWeightedSampler::seeded(point_seed(seed, index));
            self.compute(*point, &mut sampler)
        };
        map_indexed(points, map_one)
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        fn map_indexed<F>(points: &[Point3], f: F) -> Vec<MappingOutcome>
        where
            F: Fn((usize, &Point3)) -> MappingOutcome + Sync + Send,
        {
            points.par_iter().enumerate().map(f).collect()
        }
    } else {
        fn map_indexed<F>(points: &[Point3], f: F) -> Vec<MappingOutcome>
        where
            F: Fn((usize, &Point3)) -> MappingOutcome,
        {
            points.iter().enumerate().map(f).collect()
        }
    }
}

fn point_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// One-shot mapping of a single point.
pub fn compute_mapping(
    layers: &[Layer],
    mapping_rules: &[MappingRule],
    distance_rules: &[DistanceRule],
    point: Point3,
    sampler: &mut dyn SurfaceSampler,
    debug: bool,
) -> Result<MappingOutcome, MappingError> {
    let options = MappingOptions {
        debug,
        ..MappingOptions::default()
    };
    let mapping = Mapping::new(layers.to_vec(), mapping_rules, distance_rules, options)?;
    Ok(mapping.compute(point, sampler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Mesh, Polygon, Vertex};

    fn sheet(name: &str, z: f64) -> Layer {
        let v = |x: f64, y: f64| Vertex::new(Point3::new(x, y, z), UvPoint::new(x, y));
        Layer::new(
            Mesh::build(name, &[Polygon::Quad([v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)])])
                .expect("mesh"),
        )
    }

    fn small_sheet(name: &str, z: f64) -> Layer {
        let v = |x: f64, y: f64| Vertex::new(Point3::new(x, y, z), UvPoint::new(x, y));
        Layer::new(Mesh::build(name, &[Polygon::Triangle([v(0.0, 0.0), v(0.2, 0.0), v(0.0, 0.2)])]).expect("mesh"))
    }

    #[test]
    fn rejects_bad_configurations() {
        let layers = vec![sheet("a", 0.0), sheet("b", 1.0)];
        assert_eq!(
            Mapping::new(vec![sheet("a", 0.0)], &[], &[], MappingOptions::default()).err(),
            Some(MappingError::TooFewLayers(1))
        );
        assert!(matches!(
            Mapping::new(layers.clone(), &[MappingRule::Euclid], &[], MappingOptions::default()),
            Err(MappingError::RuleCountMismatch { layers: 2, mapping_rules: 1, distance_rules: 0 })
        ));
        assert_eq!(
            Mapping::from_ids(layers, &[9], &[0], MappingOptions::default()).err(),
            Some(MappingError::UnknownMappingRule(9))
        );
    }

    #[test]
    fn topological_rule_needs_matching_triangle_counts() {
        let err = Mapping::new(
            vec![sheet("a", 0.0), small_sheet("b", 1.0)],
            &[MappingRule::Topological],
            &[DistanceRule::Euclid],
            MappingOptions::default(),
        )
        .err();
        assert!(matches!(err, Some(MappingError::TopologyMismatch { stage: 0, .. })));
    }

    #[test]
    fn last_pair_uses_terminal_table() {
        let mapping = Mapping::new(
            vec![sheet("a", 0.0), sheet("b", 1.0), sheet("c", 3.0)],
            &[MappingRule::Euclid, MappingRule::Euclid],
            &[DistanceRule::Euclid, DistanceRule::Euclid],
            MappingOptions::default(),
        )
        .expect("mapping");
        let outcome = mapping.compute(Point3::new(0.3, 0.6, 0.0), &mut AreaWeightedSampler::seeded(0));
        // The terminal Euclid/Euclid segment leaves the synaptic point off the path.
        assert_eq!(outcome.path().map(<[Point3]>::len), Some(2));
        assert!((outcome.length().expect("length") - 1.0).abs() < 1e-9);
        let uv = outcome.uv().expect("uv");
        assert!((uv.u - 0.3).abs() < 1e-9 && (uv.v - 0.6).abs() < 1e-9);
        assert_eq!(mapping.rules().count(), 2);
    }

    #[test]
    fn failure_reports_stage_only_in_debug() {
        let layers = vec![sheet("a", 0.0), sheet("b", 1.0), small_sheet("c", 2.0)];
        let rules = [MappingRule::Euclid, MappingRule::Mask];
        let distances = [DistanceRule::Euclid, DistanceRule::Euclid];
        let start = Point3::new(0.7, 0.6, 0.0);

        let quiet = Mapping::new(layers.clone(), &rules, &distances, MappingOptions::default()).expect("mapping");
        assert_eq!(quiet.compute(start, &mut AreaWeightedSampler::seeded(0)), MappingOutcome::Unmapped);

        let loud = Mapping::new(layers, &rules, &distances, MappingOptions::debug()).expect("mapping");
        let outcome = loud.compute(start, &mut AreaWeightedSampler::seeded(0));
        assert_eq!(outcome.failure(), Some((1, MappingFailure::OutsideMask)));
        assert_eq!(outcome.path().map(<[Point3]>::len), Some(2));
    }

    #[test]
    fn batch_is_reproducible() {
        let mapping = Mapping::new(
            vec![sheet("a", 0.0), sheet("b", 1.0)],
            &[MappingRule::Random],
            &[DistanceRule::EuclidUv],
            MappingOptions::default(),
        )
        .expect("mapping");
        let points = [Point3::new(0.1, 0.2, 0.0), Point3::new(0.6, 0.3, 0.0), Point3::new(0.9, 0.8, 0.0)];
        let first = mapping.compute_batch(&points, 42);
        let second = mapping.compute_batch(&points, 42);
        assert_eq!(first, second);
        assert!(first.iter().all(MappingOutcome::is_mapped));
        assert_ne!(first[0].uv(), first[1].uv());
    }

    #[test]
    fn free_function_matches_mapping() {
        let layers = [sheet("a", 0.0), sheet("b", 2.0)];
        let outcome = compute_mapping(
            &layers,
            &[MappingRule::Normal],
            &[DistanceRule::NormalUv],
            Point3::new(0.25, 0.5, 0.0),
            &mut AreaWeightedSampler::seeded(0),
            false,
        )
        .expect("config");
        assert!((outcome.length().expect("length") - 2.0).abs() < 1e-9);
    }
}
