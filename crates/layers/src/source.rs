use formats::FeatureCollection;
use serde::Serialize;

/// Named container of geometry registered with the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceSpec {
    GeoJson { data: FeatureCollection },
}

impl SourceSpec {
    pub fn geojson(data: FeatureCollection) -> Self {
        SourceSpec::GeoJson { data }
    }

    pub fn data(&self) -> &FeatureCollection {
        match self {
            SourceSpec::GeoJson { data } => data,
        }
    }
}
