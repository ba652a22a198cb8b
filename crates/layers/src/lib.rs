pub mod boundaries;
pub mod layer;
pub mod source;
pub mod symbology;

pub use boundaries::*;
pub use layer::*;
pub use source::*;
