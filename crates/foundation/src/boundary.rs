use crate::geo::Polygon;
use crate::ids::BoundaryId;

/// A named polygonal region of interest. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    id: BoundaryId,
    name: String,
    geometry: Polygon,
}

impl Boundary {
    pub fn new(id: impl Into<BoundaryId>, name: impl Into<String>, geometry: Polygon) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            geometry,
        }
    }

    pub fn id(&self) -> &BoundaryId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &Polygon {
        &self.geometry
    }
}
