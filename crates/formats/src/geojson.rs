//! GeoJSON projection of the boundary set.
//!
//! The projection is one-way and derived: a [`FeatureCollection`] is rebuilt
//! from the boundary list whenever it changes and never edited in place.
//! [`FeatureCollection::from_geojson_str`] goes the other way for boundary
//! files authored elsewhere.

use foundation::{Boundary, LonLat, Polygon, Ring};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Position as `[lon, lat]` in degrees.
pub type Position = [f64; 2];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionType {
    FeatureCollection,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Feature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: FeatureCollectionType,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub properties: FeatureProperties,
    pub geometry: Geometry,
}

/// Properties carried by every boundary feature. The engine hands these back
/// verbatim from rendered-feature queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Position>> },
}

#[derive(Debug)]
pub enum GeoJsonError {
    Json(serde_json::Error),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::Json(e) => write!(f, "JSON error: {e}"),
            GeoJsonError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            GeoJsonError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {}

impl Feature {
    pub fn from_boundary(boundary: &Boundary) -> Self {
        Self {
            kind: FeatureType::Feature,
            properties: FeatureProperties {
                id: boundary.id().as_str().to_string(),
                name: boundary.name().to_string(),
            },
            geometry: Geometry::from_polygon(boundary.geometry()),
        }
    }
}

impl Geometry {
    pub fn from_polygon(polygon: &Polygon) -> Self {
        let ring: Vec<Position> = polygon
            .exterior()
            .points()
            .iter()
            .map(|p| p.to_array())
            .collect();
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }
}

/// Projects boundaries 1:1 into a FeatureCollection, preserving order.
pub fn feature_collection(boundaries: &[Boundary]) -> FeatureCollection {
    FeatureCollection {
        kind: FeatureCollectionType::FeatureCollection,
        features: boundaries.iter().map(Feature::from_boundary).collect(),
    }
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.features.iter().map(|f| f.properties.id.as_str())
    }

    pub fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_geojson_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value = serde_json::from_str(payload).map_err(GeoJsonError::Json)?;
        Self::from_geojson_value(&value)
    }

    /// Lenient reader: accepts extra properties and 3D positions (altitude is
    /// dropped), but only single-ring `Polygon` geometries with string `id`
    /// and `name` properties.
    pub fn from_geojson_value(value: &Value) -> Result<Self, GeoJsonError> {
        let obj = value
            .as_object()
            .ok_or(GeoJsonError::NotAFeatureCollection)?;
        if obj.get("type").and_then(|v| v.as_str()) != Some("FeatureCollection") {
            return Err(GeoJsonError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let feature = parse_feature(feat_val)
                .map_err(|reason| GeoJsonError::InvalidFeature { index, reason })?;
            features.push(feature);
        }

        Ok(Self {
            kind: FeatureCollectionType::FeatureCollection,
            features,
        })
    }

    /// Rebuilds validated boundaries from the collection.
    pub fn to_boundaries(&self) -> Result<Vec<Boundary>, GeoJsonError> {
        let mut out = Vec::with_capacity(self.features.len());
        for (index, feat) in self.features.iter().enumerate() {
            let Geometry::Polygon { coordinates } = &feat.geometry;
            let [exterior] = coordinates.as_slice() else {
                return Err(GeoJsonError::InvalidFeature {
                    index,
                    reason: format!(
                        "expected exactly one ring, found {}",
                        coordinates.len()
                    ),
                });
            };
            let ring = Ring::new(exterior.iter().copied().map(LonLat::from).collect()).map_err(
                |e| GeoJsonError::InvalidFeature {
                    index,
                    reason: e.to_string(),
                },
            )?;
            out.push(Boundary::new(
                feat.properties.id.as_str(),
                feat.properties.name.as_str(),
                Polygon::new(ring),
            ));
        }
        Ok(out)
    }
}

fn parse_feature(value: &Value) -> Result<Feature, String> {
    let obj = value
        .as_object()
        .ok_or("feature must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("feature missing type".to_string())?;
    if ty != "Feature" {
        return Err(format!("unexpected feature type: {ty}"));
    }

    let props = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .ok_or("feature missing properties".to_string())?;
    let id = match props.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err("properties.id must be a string or number".to_string()),
    };
    if id.is_empty() {
        return Err("properties.id must not be empty".to_string());
    }
    let name = props
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or("properties.name must be a string".to_string())?
        .to_string();

    let geometry = obj
        .get("geometry")
        .ok_or("feature missing geometry".to_string())?;
    let geometry = parse_polygon_geometry(geometry)?;

    Ok(Feature {
        kind: FeatureType::Feature,
        properties: FeatureProperties { id, name },
        geometry,
    })
}

fn parse_polygon_geometry(value: &Value) -> Result<Geometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;
    if ty != "Polygon" {
        return Err(format!("unsupported geometry type: {ty}"));
    }
    let rings = obj
        .get("coordinates")
        .and_then(|v| v.as_array())
        .ok_or("Polygon coordinates must be an array".to_string())?;

    let mut coordinates = Vec::with_capacity(rings.len());
    for ring in rings {
        let positions = ring
            .as_array()
            .ok_or("Polygon ring must be an array".to_string())?;
        let mut out = Vec::with_capacity(positions.len());
        for pos in positions {
            out.push(parse_position(pos)?);
        }
        coordinates.push(out);
    }
    Ok(Geometry::Polygon { coordinates })
}

fn parse_position(value: &Value) -> Result<Position, String> {
    let arr = value
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok([lon, lat])
}
