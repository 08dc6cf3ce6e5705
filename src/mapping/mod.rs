//! Mapping of points through an ordered chain of layers.
//!
//! Each segment between two consecutive layers carries a [`MappingRule`]
//! (where the point lands on the next layer) and a [`DistanceRule`] (how the
//! path between the two is recorded). The last layer is the synaptic layer:
//! there the mapped point is reported as a UV coordinate.
//!
//! ```ignore
//! use pam_engine::mapping::{DistanceRule, Layer, Mapping, MappingOptions, MappingRule};
//!
//! let mapping = Mapping::new(
//!     vec![Layer::new(pre), Layer::new(cortex)],
//!     &[MappingRule::Euclid],
//!     &[DistanceRule::EuclidUv],
//!     MappingOptions::default(),
//! )?;
//! let outcome = mapping.compute(neuron, &mut AreaWeightedSampler::seeded(7));
//! ```

mod distance;
mod engine;
mod error;
mod layer;
mod options;
mod projection;
mod rules;

pub use engine::{Mapping, MappingOutcome, compute_mapping};
pub use error::{MappingError, MappingFailure};
pub use layer::Layer;
pub use options::MappingOptions;
pub use rules::{DistanceRule, MappingRule};
