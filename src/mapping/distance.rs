//! Distance-rule steps: how the path grows between two layers.
//!
//! Every (mapping rule, distance rule) pair resolves to one step, with a
//! separate table for the terminal segment. For most pairs the terminal table
//! leaves the final point off the path; it is reported as a UV coordinate.

use crate::geom::Point3;

use super::projection::{Segment, Trace, normal_landing};
use super::{DistanceRule, MappingFailure, MappingRule};

pub(crate) type ExtendFn = fn(&Segment<'_>, &mut Trace<'_>, Point3) -> Result<(), MappingFailure>;

/// Step for `mapping` followed by `distance`; `terminal` selects the table
/// for the segment ending on the last layer.
pub(crate) fn extension(mapping: MappingRule, distance: DistanceRule, terminal: bool) -> ExtendFn {
    use DistanceRule as D;
    use MappingRule as M;

    match (terminal, mapping, distance) {
        (_, M::Mask, _) => append,

        (false, _, D::Euclid | D::EuclidUv)
        | (false, M::Euclid, D::JumpUv | D::UvNormal)
        | (false, M::Normal, D::NormalUv | D::UvNormal) => append,
        (false, _, D::JumpUv) => jump_uv,
        (false, _, D::UvJump) => uv_jump,
        (false, _, D::NormalUv) => normal_uv,
        (false, _, D::UvNormal) => uv_normal,

        (true, _, D::Euclid | D::UvJump | D::UvNormal) => skip,
        (true, _, D::EuclidUv) | (true, M::Euclid, D::JumpUv) | (true, M::Normal, D::NormalUv) => append,
        (true, _, D::JumpUv) => jump_synaptic,
        (true, _, D::NormalUv) => normal_synaptic,
    }
}

fn append(_: &Segment<'_>, trace: &mut Trace<'_>, mapped: Point3) -> Result<(), MappingFailure> {
    trace.push(mapped);
    Ok(())
}

fn skip(_: &Segment<'_>, _: &mut Trace<'_>, _: Point3) -> Result<(), MappingFailure> {
    Ok(())
}

/// Nearest point on the next layer, then along its UV space.
fn jump_uv(segment: &Segment<'_>, trace: &mut Trace<'_>, mapped: Point3) -> Result<(), MappingFailure> {
    let landing = segment.next.closest_point(trace.last())?.point;
    let track = segment
        .next
        .interpolate_uv_track(landing, mapped, trace.options.interpolation_steps)?;
    trace.push(landing);
    trace.extend(track);
    trace.push(mapped);
    Ok(())
}

/// Along the current layer's UV space to the point under `mapped`, then across.
fn uv_jump(segment: &Segment<'_>, trace: &mut Trace<'_>, mapped: Point3) -> Result<(), MappingFailure> {
    let takeoff = segment.layer.closest_point(mapped)?.point;
    let track = segment
        .layer
        .interpolate_uv_track(trace.last(), takeoff, trace.options.interpolation_steps)?;
    trace.extend(track);
    trace.push(mapped);
    Ok(())
}

/// Along the current layer's normal onto the next layer, then along its UV space.
fn normal_uv(segment: &Segment<'_>, trace: &mut Trace<'_>, mapped: Point3) -> Result<(), MappingFailure> {
    let landing = normal_landing(segment, trace)?;
    let track = segment
        .next
        .interpolate_uv_track(landing, mapped, trace.options.interpolation_steps)?;
    trace.push(landing);
    trace.extend(track);
    trace.push(mapped);
    Ok(())
}

/// Along the current layer's UV space to where the next layer's normal at
/// `mapped` meets it, then across.
fn uv_normal(segment: &Segment<'_>, trace: &mut Trace<'_>, mapped: Point3) -> Result<(), MappingFailure> {
    let foot = segment.next.closest_point(mapped)?;
    let takeoff = segment
        .layer
        .project(foot.point, foot.normal, trace.options.ray_length)?;
    let track = segment
        .layer
        .interpolate_uv_track(trace.last(), takeoff, trace.options.interpolation_steps)?;
    trace.extend(track);
    trace.push(takeoff);
    trace.push(mapped);
    Ok(())
}

fn jump_synaptic(segment: &Segment<'_>, trace: &mut Trace<'_>, _: Point3) -> Result<(), MappingFailure> {
    let landing = segment.next.closest_point(trace.last())?.point;
    trace.push(landing);
    Ok(())
}

fn normal_synaptic(segment: &Segment<'_>, trace: &mut Trace<'_>, _: Point3) -> Result<(), MappingFailure> {
    let landing = normal_landing(segment, trace)?;
    trace.push(landing);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{AreaWeightedSampler, Mesh, Polygon, UvPoint, Vertex};
    use crate::mapping::{Layer, MappingOptions};

    fn plane(z: f64) -> Layer {
        let v = |x: f64, y: f64| Vertex::new(Point3::new(x, y, z), UvPoint::new(x / 2.0, y / 2.0));
        Layer::new(
            Mesh::build(
                format!("plane{z}"),
                &[Polygon::Quad([v(0.0, 0.0), v(2.0, 0.0), v(2.0, 2.0), v(0.0, 2.0)])],
            )
            .expect("mesh"),
        )
    }

    fn extend(
        mapping: MappingRule,
        distance: DistanceRule,
        terminal: bool,
        start: Point3,
        mapped: Point3,
    ) -> Result<Vec<Point3>, MappingFailure> {
        let top = plane(1.0);
        let bottom = plane(0.0);
        let mut sampler = AreaWeightedSampler::seeded(5);
        let options = MappingOptions::default().with_interpolation_steps(4);
        let mut trace = Trace::new(start, options, &mut sampler);
        extension(mapping, distance, terminal)(&Segment { layer: &top, next: &bottom }, &mut trace, mapped)?;
        Ok(trace.into_path())
    }

    const START: Point3 = Point3::new(0.3, 0.4, 1.0);
    const MAPPED: Point3 = Point3::new(1.5, 1.2, 0.0);

    #[test]
    fn append_and_skip() {
        let path = extend(MappingRule::Uv, DistanceRule::Euclid, false, START, MAPPED).expect("path");
        assert_eq!(path, vec![START, MAPPED]);

        let path = extend(MappingRule::Uv, DistanceRule::Euclid, true, START, MAPPED).expect("path");
        assert_eq!(path, vec![START]);

        let path = extend(MappingRule::Uv, DistanceRule::EuclidUv, true, START, MAPPED).expect("path");
        assert_eq!(path, vec![START, MAPPED]);
    }

    #[test]
    fn mask_always_appends() {
        for distance in DistanceRule::ALL {
            for terminal in [false, true] {
                let path = extend(MappingRule::Mask, distance, terminal, START, START).expect("path");
                assert_eq!(path, vec![START, START], "{distance} terminal={terminal}");
            }
        }
    }

    #[test]
    fn jump_uv_lands_then_follows_next_layer() {
        let path = extend(MappingRule::Random, DistanceRule::JumpUv, false, START, MAPPED).expect("path");
        // start, landing, 4 track samples, mapped
        assert_eq!(path.len(), 7);
        assert!(path[1].distance_to(Point3::new(0.3, 0.4, 0.0)) < 1e-9);
        assert!(path[1..].iter().all(|p| p.z.abs() < 1e-12));
        assert_eq!(path[6], MAPPED);
    }

    #[test]
    fn uv_jump_follows_current_layer_first() {
        let path = extend(MappingRule::Uv, DistanceRule::UvJump, false, START, MAPPED).expect("path");
        assert_eq!(path.len(), 1 + 4 + 1);
        assert!(path[1..5].iter().all(|p| (p.z - 1.0).abs() < 1e-12));
        assert!(path[4].distance_to(Point3::new(1.5, 1.2, 1.0)) < 1e-9);
        assert_eq!(path[5], MAPPED);
    }

    #[test]
    fn normal_uv_and_uv_normal_mirror_each_other() {
        let down = extend(MappingRule::Topological, DistanceRule::NormalUv, false, START, MAPPED).expect("path");
        assert!(down[1].distance_to(Point3::new(0.3, 0.4, 0.0)) < 1e-9);
        assert_eq!(down.last(), Some(&MAPPED));

        let across = extend(MappingRule::Topological, DistanceRule::UvNormal, false, START, MAPPED).expect("path");
        let takeoff = across[across.len() - 2];
        assert!(takeoff.distance_to(Point3::new(1.5, 1.2, 1.0)) < 1e-9);
        assert_eq!(across.last(), Some(&MAPPED));
    }

    #[test]
    fn synaptic_variants_push_only_the_landing() {
        let path = extend(MappingRule::Uv, DistanceRule::JumpUv, true, START, MAPPED).expect("path");
        assert_eq!(path.len(), 2);
        assert!(path[1].distance_to(Point3::new(0.3, 0.4, 0.0)) < 1e-9);

        let path = extend(MappingRule::Random, DistanceRule::NormalUv, true, START, MAPPED).expect("path");
        assert_eq!(path.len(), 2);
        assert!(path[1].distance_to(Point3::new(0.3, 0.4, 0.0)) < 1e-9);
    }

    #[test]
    fn rule_specific_exceptions() {
        let path = extend(MappingRule::Euclid, DistanceRule::JumpUv, false, START, MAPPED).expect("path");
        assert_eq!(path, vec![START, MAPPED]);
        let path = extend(MappingRule::Normal, DistanceRule::NormalUv, true, START, MAPPED).expect("path");
        assert_eq!(path, vec![START, MAPPED]);
        let path = extend(MappingRule::Euclid, DistanceRule::UvNormal, true, START, MAPPED).expect("path");
        assert_eq!(path, vec![START]);
    }
}
