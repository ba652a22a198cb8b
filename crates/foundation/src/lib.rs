pub mod boundary;
pub mod bounds;
pub mod geo;
pub mod ids;

// Foundation crate: small, well-tested primitives only.
pub use boundary::*;
pub use bounds::*;
pub use geo::*;
pub use ids::*;
