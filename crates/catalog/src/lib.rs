use std::collections::BTreeSet;
use std::path::Path;

use formats::FeatureCollection;
use foundation::{Boundary, BoundaryId, Polygon};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    DuplicateId(BoundaryId),
    Invalid(String),
    Io(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::DuplicateId(id) => write!(f, "duplicate boundary id: {id}"),
            CatalogError::Invalid(msg) => write!(f, "invalid boundary data: {msg}"),
            CatalogError::Io(msg) => write!(f, "boundary source error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Source of the boundary regions shown by the map.
///
/// The widget only ever calls [`BoundaryProvider::list_boundaries`]; the data
/// behind it can be the built-in sample set, a file, or a test fixture.
pub trait BoundaryProvider {
    fn list_boundaries(&self) -> Result<Vec<Boundary>, CatalogError>;
}

impl<P: BoundaryProvider + ?Sized> BoundaryProvider for Box<P> {
    fn list_boundaries(&self) -> Result<Vec<Boundary>, CatalogError> {
        (**self).list_boundaries()
    }
}

impl<P: BoundaryProvider + ?Sized> BoundaryProvider for std::rc::Rc<P> {
    fn list_boundaries(&self) -> Result<Vec<Boundary>, CatalogError> {
        (**self).list_boundaries()
    }
}

/// Ensures every boundary id is non-empty and appears once, so features map
/// 1:1 onto boundaries and every click resolves to a lookup.
pub fn validate_unique_ids(boundaries: &[Boundary]) -> Result<(), CatalogError> {
    let mut seen: BTreeSet<&BoundaryId> = BTreeSet::new();
    for b in boundaries {
        if b.id().as_str().is_empty() {
            return Err(CatalogError::Invalid(format!(
                "boundary {:?} has an empty id",
                b.name()
            )));
        }
        if !seen.insert(b.id()) {
            return Err(CatalogError::DuplicateId(b.id().clone()));
        }
    }
    Ok(())
}

type SampleRow = (&'static str, &'static str, [[f64; 2]; 5]);

// Six overlapping regions around Vancouver, BC.
const SAMPLE_BOUNDARIES: [SampleRow; 6] = [
    (
        "b1",
        "Boundary 1",
        [
            [-123.0, 49.2],
            [-123.0, 49.3],
            [-122.9, 49.3],
            [-122.9, 49.2],
            [-123.0, 49.2],
        ],
    ),
    (
        "b2",
        "Boundary 2",
        [
            [-123.05, 49.25],
            [-123.05, 49.35],
            [-122.95, 49.35],
            [-122.95, 49.25],
            [-123.05, 49.25],
        ],
    ),
    (
        "b3",
        "Boundary 3",
        [
            [-123.1, 49.3],
            [-123.1, 49.4],
            [-122.98, 49.4],
            [-122.98, 49.3],
            [-123.1, 49.3],
        ],
    ),
    (
        "b4",
        "Boundary 4",
        [
            [-123.1, 49.2],
            [-123.1, 49.25],
            [-122.95, 49.25],
            [-122.95, 49.2],
            [-123.1, 49.2],
        ],
    ),
    (
        "b5",
        "Boundary 5",
        [
            [-122.95, 49.15],
            [-123.05, 49.15],
            [-123.05, 49.2],
            [-122.95, 49.2],
            [-122.95, 49.15],
        ],
    ),
    (
        "b6",
        "Boundary 6",
        [
            [-123.08, 49.22],
            [-123.08, 49.3],
            [-122.98, 49.3],
            [-122.98, 49.22],
            [-123.08, 49.22],
        ],
    ),
];

/// Built-in sample regions, standing in for a remote boundary service.
#[derive(Debug, Default, Copy, Clone)]
pub struct StaticBoundaryProvider;

impl StaticBoundaryProvider {
    pub fn new() -> Self {
        Self
    }
}

impl BoundaryProvider for StaticBoundaryProvider {
    fn list_boundaries(&self) -> Result<Vec<Boundary>, CatalogError> {
        let mut out = Vec::with_capacity(SAMPLE_BOUNDARIES.len());
        for (id, name, coords) in &SAMPLE_BOUNDARIES {
            let polygon = Polygon::from_coords(coords)
                .map_err(|e| CatalogError::Invalid(format!("{id}: {e}")))?;
            out.push(Boundary::new(*id, *name, polygon));
        }
        Ok(out)
    }
}

/// Fixed list supplied by the caller. Ids are validated once on construction.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoundaryProvider {
    boundaries: Vec<Boundary>,
}

impl InMemoryBoundaryProvider {
    pub fn new(boundaries: Vec<Boundary>) -> Result<Self, CatalogError> {
        validate_unique_ids(&boundaries)?;
        Ok(Self { boundaries })
    }
}

impl BoundaryProvider for InMemoryBoundaryProvider {
    fn list_boundaries(&self) -> Result<Vec<Boundary>, CatalogError> {
        Ok(self.boundaries.clone())
    }
}

/// Boundaries read from a GeoJSON FeatureCollection document.
#[derive(Debug, Clone)]
pub struct GeoJsonBoundaryProvider {
    boundaries: Vec<Boundary>,
}

impl GeoJsonBoundaryProvider {
    pub fn from_geojson_str(payload: &str) -> Result<Self, CatalogError> {
        let fc = FeatureCollection::from_geojson_str(payload)
            .map_err(|e| CatalogError::Invalid(e.to_string()))?;
        let boundaries = fc
            .to_boundaries()
            .map_err(|e| CatalogError::Invalid(e.to_string()))?;
        validate_unique_ids(&boundaries)?;
        Ok(Self { boundaries })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let payload = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("read {}: {e}", path.display())))?;
        Self::from_geojson_str(&payload)
    }
}

impl BoundaryProvider for GeoJsonBoundaryProvider {
    fn list_boundaries(&self) -> Result<Vec<Boundary>, CatalogError> {
        Ok(self.boundaries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BoundaryProvider, CatalogError, GeoJsonBoundaryProvider, InMemoryBoundaryProvider,
        StaticBoundaryProvider, validate_unique_ids,
    };
    use formats::feature_collection;
    use foundation::{Boundary, Polygon};
    use pretty_assertions::assert_eq;

    fn tri(id: &str) -> Boundary {
        let coords = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]];
        Boundary::new(id, id.to_uppercase(), Polygon::from_coords(&coords).unwrap())
    }

    #[test]
    fn sample_set_has_six_closed_boundaries() {
        let boundaries = StaticBoundaryProvider::new().list_boundaries().unwrap();
        assert_eq!(boundaries.len(), 6);
        for b in &boundaries {
            let ring = b.geometry().exterior();
            assert!(ring.len() >= 4, "{} is too short", b.id());
            assert_eq!(ring.points().first(), ring.points().last(), "{} is open", b.id());
        }
    }

    #[test]
    fn sample_ids_are_unique_and_stable() {
        let boundaries = StaticBoundaryProvider::new().list_boundaries().unwrap();
        validate_unique_ids(&boundaries).unwrap();
        let ids: Vec<&str> = boundaries.iter().map(|b| b.id().as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2", "b3", "b4", "b5", "b6"]);
    }

    #[test]
    fn in_memory_rejects_duplicates() {
        let err = InMemoryBoundaryProvider::new(vec![tri("a"), tri("b"), tri("a")]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("a".into()));
    }

    #[test]
    fn empty_ids_are_rejected_at_load() {
        let err = InMemoryBoundaryProvider::new(vec![tri("a"), tri("")]).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(msg) if msg.contains("empty id")));

        let err = validate_unique_ids(&[tri("")]).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[test]
    fn geojson_provider_round_trips_sample_set() {
        let boundaries = StaticBoundaryProvider::new().list_boundaries().unwrap();
        let text = feature_collection(&boundaries).to_geojson_string().unwrap();
        let provider = GeoJsonBoundaryProvider::from_geojson_str(&text).unwrap();
        assert_eq!(provider.list_boundaries().unwrap(), boundaries);
    }

    #[test]
    fn geojson_provider_reports_bad_documents() {
        let err = GeoJsonBoundaryProvider::from_geojson_str("{}").unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));

        let err = GeoJsonBoundaryProvider::from_path("/definitely/not/here.geojson").unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
