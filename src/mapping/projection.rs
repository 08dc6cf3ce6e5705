//! Mapping-rule steps: where a point lands on the next layer.

use crate::geom::{Point3, SurfaceSampler};

use super::{Layer, MappingFailure, MappingOptions, MappingRule};

/// The two layers a stage maps between.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Segment<'a> {
    pub layer: &'a Layer,
    pub next: &'a Layer,
}

/// Mutable state of one query: the path so far and the random source.
pub(crate) struct Trace<'s> {
    start: Point3,
    path: Vec<Point3>,
    pub options: MappingOptions,
    pub sampler: &'s mut dyn SurfaceSampler,
}

impl<'s> Trace<'s> {
    pub fn new(start: Point3, options: MappingOptions, sampler: &'s mut dyn SurfaceSampler) -> Self {
        Self {
            start,
            path: vec![start],
            options,
            sampler,
        }
    }

    pub fn last(&self) -> Point3 {
        self.path.last().copied().unwrap_or(self.start)
    }

    pub fn push(&mut self, point: Point3) {
        self.path.push(point);
    }

    pub fn extend(&mut self, points: impl IntoIterator<Item = Point3>) {
        self.path.extend(points);
    }

    pub fn into_path(self) -> Vec<Point3> {
        self.path
    }
}

pub(crate) type ProjectFn = fn(&Segment<'_>, &mut Trace<'_>) -> Result<Point3, MappingFailure>;

pub(crate) fn projection(rule: MappingRule) -> ProjectFn {
    match rule {
        MappingRule::Euclid => euclid,
        MappingRule::Normal => normal,
        MappingRule::Random => random,
        MappingRule::Topological => topological,
        MappingRule::Uv => uv,
        MappingRule::Mask => mask,
    }
}

fn euclid(segment: &Segment<'_>, trace: &mut Trace<'_>) -> Result<Point3, MappingFailure> {
    Ok(segment.next.closest_point(trace.last())?.point)
}

fn normal(segment: &Segment<'_>, trace: &mut Trace<'_>) -> Result<Point3, MappingFailure> {
    normal_landing(segment, trace)
}

/// Where the normal line through the current layer's closest point to the
/// path's last point meets the next layer.
pub(crate) fn normal_landing(segment: &Segment<'_>, trace: &Trace<'_>) -> Result<Point3, MappingFailure> {
    let from = segment.layer.closest_point(trace.last())?;
    segment
        .next
        .project(from.point, from.normal, trace.options.ray_length)
}

fn random(segment: &Segment<'_>, trace: &mut Trace<'_>) -> Result<Point3, MappingFailure> {
    trace
        .sampler
        .select_random_point(segment.next.mesh())
        .map(|sample| sample.point)
        .ok_or(MappingFailure::Degenerate)
}

fn topological(segment: &Segment<'_>, trace: &mut Trace<'_>) -> Result<Point3, MappingFailure> {
    segment
        .layer
        .mesh()
        .transfer_point(segment.next.mesh(), trace.last())
        .ok_or(MappingFailure::Degenerate)
}

fn uv(segment: &Segment<'_>, trace: &mut Trace<'_>) -> Result<Point3, MappingFailure> {
    let uv = segment.layer.map_3d_point_to_uv(trace.last())?;
    segment.next.map_uv_point_to_3d(uv)
}

fn mask(segment: &Segment<'_>, trace: &mut Trace<'_>) -> Result<Point3, MappingFailure> {
    let last = trace.last();
    if segment.next.contains_point(last) {
        Ok(last)
    } else {
        Err(MappingFailure::OutsideMask)
    }
}
