//! Geometric mapping between layered surface meshes.
//!
//! [`geom`] holds the mesh type with its spatial indices and the geometry
//! kernel underneath; [`mapping`] carries points from one layer to the next
//! under configurable rules and reports the path, its length and the UV
//! coordinate reached on the last layer.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod mapping;

pub use geom::{Mesh, MeshError, MeshOptions, Point3, Polygon, UvPoint, Vec3, Vertex};
pub use mapping::{DistanceRule, Layer, Mapping, MappingError, MappingFailure, MappingOptions, MappingOutcome, MappingRule};

/// Any configuration error raised while setting up meshes or mappings.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
