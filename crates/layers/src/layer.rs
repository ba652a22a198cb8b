use serde::Serialize;
use serde_json::{Map, Value};

use crate::symbology::{FillPaint, LinePaint};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Fill,
    Line,
}

/// Paint properties, tagged with the engine layer type.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "paint", rename_all = "lowercase")]
pub enum LayerPaint {
    Fill(FillPaint),
    Line(LinePaint),
}

/// Visual rendering rule applied to one source.
///
/// Serializes to the engine's layer description, e.g.
/// `{"id": .., "type": "fill", "source": .., "layout": {}, "paint": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub layout: Map<String, Value>,
    #[serde(flatten)]
    pub paint: LayerPaint,
}

impl LayerSpec {
    pub fn fill(id: impl Into<String>, source: impl Into<String>, paint: FillPaint) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            layout: Map::new(),
            paint: LayerPaint::Fill(paint),
        }
    }

    pub fn line(id: impl Into<String>, source: impl Into<String>, paint: LinePaint) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            layout: Map::new(),
            paint: LayerPaint::Line(paint),
        }
    }

    pub fn kind(&self) -> LayerKind {
        match self.paint {
            LayerPaint::Fill(_) => LayerKind::Fill,
            LayerPaint::Line(_) => LayerKind::Line,
        }
    }
}
