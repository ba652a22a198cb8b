use layers::{LayerSpec, SourceSpec};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::event::{Cursor, Listener, ScreenPoint};

/// DOM element the map is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub width_px: u32,
    pub height_px: u32,
}

impl Container {
    pub fn new(id: impl Into<String>, width_px: u32, height_px: u32) -> Self {
        Self {
            id: id.into(),
            width_px,
            height_px,
        }
    }
}

/// Construction options forwarded to the engine.
///
/// The access token travels here rather than through a process-wide global.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    pub style: String,
    /// `[lon, lat]` in degrees.
    pub center: [f64; 2],
    pub zoom: f64,
    pub access_token: String,
}

/// A feature as the engine reports it from a rendered-feature query.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    pub layer_id: String,
    pub source_id: String,
    pub properties: Map<String, Value>,
}

impl RenderedFeature {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Init(String),
    DuplicateId { kind: &'static str, id: String },
    UnknownSource(String),
    UnknownLayer(String),
    SourceInUse { source: String, layer: String },
    Js(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Init(msg) => write!(f, "map initialization failed: {msg}"),
            EngineError::DuplicateId { kind, id } => write!(f, "{kind} id already exists: {id}"),
            EngineError::UnknownSource(id) => write!(f, "unknown source: {id}"),
            EngineError::UnknownLayer(id) => write!(f, "unknown layer: {id}"),
            EngineError::SourceInUse { source, layer } => {
                write!(f, "source {source} is still used by layer {layer}")
            }
            EngineError::Js(msg) => write!(f, "engine error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Factory for live map instances.
pub trait MapEngine {
    type Handle: MapHandle;

    fn create(&self, container: &Container, options: &MapOptions)
    -> Result<Self::Handle, EngineError>;
}

/// Capability set of one live map instance.
///
/// Events for registered listeners are not delivered through this trait; the
/// host forwards them to whoever owns the handle as [`crate::MapEvent`]s.
pub trait MapHandle {
    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), EngineError>;
    fn remove_source(&mut self, id: &str) -> Result<(), EngineError>;
    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), EngineError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError>;
    fn listen(&mut self, listener: Listener) -> Result<(), EngineError>;

    /// Features rendered at `point`, topmost first. An empty `layers` slice
    /// means every layer.
    fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: &[&str],
    ) -> Result<Vec<RenderedFeature>, EngineError>;

    fn cursor(&self) -> Cursor;
    fn set_cursor(&mut self, cursor: Cursor);

    /// Releases every engine resource. Consumes the handle so nothing can use it afterwards.
    fn remove(self);
}
