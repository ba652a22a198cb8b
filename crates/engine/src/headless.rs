//! In-memory engine without rendering.
//!
//! Keeps sources, layers, listeners and cursor state exactly as a real engine
//! would receive them, and answers rendered-feature queries with a Web Mercator
//! viewport and geometric hit-testing. Used by the CLI and by tests.

use std::cell::RefCell;
use std::rc::Rc;

use foundation::LonLat;
use layers::{LayerSpec, SourceSpec};
use serde_json::{Map, Value};

use crate::event::{Cursor, Listener, ScreenPoint};
use crate::map::{Container, EngineError, MapEngine, MapHandle, MapOptions, RenderedFeature};
use crate::picking::feature_hit;
use crate::projection::Viewport;

/// Lifetime counters shared by an engine and every map it created.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct HeadlessStats {
    pub created: usize,
    pub removed: usize,
}

impl HeadlessStats {
    pub fn live(&self) -> usize {
        self.created - self.removed
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessEngine {
    stats: Rc<RefCell<HeadlessStats>>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> HeadlessStats {
        *self.stats.borrow()
    }
}

impl MapEngine for HeadlessEngine {
    type Handle = HeadlessMap;

    fn create(
        &self,
        container: &Container,
        options: &MapOptions,
    ) -> Result<Self::Handle, EngineError> {
        if container.width_px == 0 || container.height_px == 0 {
            return Err(EngineError::Init(format!(
                "container {} has zero size",
                container.id
            )));
        }
        let center = LonLat::from(options.center);
        if !center.is_finite() || !center.in_range() {
            return Err(EngineError::Init(format!(
                "invalid center {:?}",
                options.center
            )));
        }

        self.stats.borrow_mut().created += 1;
        tracing::debug!(container = %container.id, "headless map created");

        Ok(HeadlessMap {
            container: container.clone(),
            options: options.clone(),
            viewport: Viewport::new(
                center,
                options.zoom,
                f64::from(container.width_px),
                f64::from(container.height_px),
            ),
            sources: Vec::new(),
            layers: Vec::new(),
            listeners: Vec::new(),
            cursor: Cursor::Default,
            stats: Rc::clone(&self.stats),
        })
    }
}

#[derive(Debug)]
pub struct HeadlessMap {
    container: Container,
    options: MapOptions,
    viewport: Viewport,
    sources: Vec<(String, SourceSpec)>,
    // Render order: later entries draw on top.
    layers: Vec<LayerSpec>,
    listeners: Vec<Listener>,
    cursor: Cursor,
    stats: Rc<RefCell<HeadlessStats>>,
}

impl HeadlessMap {
    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|(sid, _)| sid == id).map(|(_, s)| s)
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    pub fn project(&self, p: LonLat) -> ScreenPoint {
        self.viewport.project(p)
    }
}

impl MapHandle for HeadlessMap {
    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), EngineError> {
        if self.source(id).is_some() {
            return Err(EngineError::DuplicateId {
                kind: "source",
                id: id.to_string(),
            });
        }
        self.sources.push((id.to_string(), source.clone()));
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), EngineError> {
        if let Some(layer) = self.layers.iter().find(|l| l.source == id) {
            return Err(EngineError::SourceInUse {
                source: id.to_string(),
                layer: layer.id.clone(),
            });
        }
        let before = self.sources.len();
        self.sources.retain(|(sid, _)| sid != id);
        if self.sources.len() == before {
            return Err(EngineError::UnknownSource(id.to_string()));
        }
        Ok(())
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), EngineError> {
        if self.layer(&layer.id).is_some() {
            return Err(EngineError::DuplicateId {
                kind: "layer",
                id: layer.id.clone(),
            });
        }
        if self.source(&layer.source).is_none() {
            return Err(EngineError::UnknownSource(layer.source.clone()));
        }
        self.layers.push(layer.clone());
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError> {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        if self.layers.len() == before {
            return Err(EngineError::UnknownLayer(id.to_string()));
        }
        // Listeners stay registered, as in the browser engine.
        Ok(())
    }

    fn listen(&mut self, listener: Listener) -> Result<(), EngineError> {
        self.listeners.push(listener);
        Ok(())
    }

    fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: &[&str],
    ) -> Result<Vec<RenderedFeature>, EngineError> {
        if let Some(missing) = layers.iter().find(|id| self.layer(id).is_none()) {
            return Err(EngineError::UnknownLayer(missing.to_string()));
        }

        let mut out = Vec::new();
        for layer in self.layers.iter().rev() {
            if !layers.is_empty() && !layers.contains(&layer.id.as_str()) {
                continue;
            }
            let Some(source) = self.source(&layer.source) else {
                continue;
            };
            for feature in source.data().features.iter().rev() {
                if !feature_hit(layer, feature, &self.viewport, point) {
                    continue;
                }
                let properties = match serde_json::to_value(&feature.properties) {
                    Ok(Value::Object(map)) => map,
                    _ => Map::new(),
                };
                out.push(RenderedFeature {
                    layer_id: layer.id.clone(),
                    source_id: layer.source.clone(),
                    properties,
                });
            }
        }
        Ok(out)
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn remove(self) {
        self.stats.borrow_mut().removed += 1;
        tracing::debug!(container = %self.container.id, "headless map removed");
    }
}
