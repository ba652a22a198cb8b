//! Browser binding: mapbox-gl as the engine, gloo-net for lookups.
//!
//! Widgets live in a thread-local registry keyed by container id. Engine
//! callbacks look their widget up by that id, so an event arriving after
//! `unmount_boundary_map` finds nothing and is dropped.

use std::cell::RefCell;
use std::rc::Rc;

use catalog::StaticBoundaryProvider;
use engine::{
    Container, Cursor, EngineError, Listener, MapEngine, MapEvent, MapHandle,
    MapOptions, RenderedFeature, ScreenPoint,
};
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use gloo_net::http::Request;
use layers::{LayerSpec, SourceSpec};
use runtime::{Event, EventLog, Level, Spawn};
use serde::Serialize;
use serde_json::{Map, Value};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::config::WidgetConfig;
use crate::lookup::{InfoClient, LookupError, decode_response};
use crate::registry::WidgetRegistry;
use crate::widget::{MapWidget, MountStatus, WidgetError};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = mapboxgl, js_name = Map)]
    type MapboxMap;

    #[wasm_bindgen(catch, constructor, js_namespace = mapboxgl, js_class = "Map")]
    fn new(options: &JsValue) -> Result<MapboxMap, JsValue>;

    #[wasm_bindgen(catch, method, js_class = "Map", js_name = addSource)]
    fn add_source(this: &MapboxMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, method, js_class = "Map", js_name = removeSource)]
    fn remove_source(this: &MapboxMap, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, method, js_class = "Map", js_name = addLayer)]
    fn add_layer(this: &MapboxMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, method, js_class = "Map", js_name = removeLayer)]
    fn remove_layer(this: &MapboxMap, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_class = "Map")]
    fn once(this: &MapboxMap, event: &str, handler: &Closure<dyn FnMut()>);

    #[wasm_bindgen(method, js_class = "Map", js_name = on)]
    fn on_layer(
        this: &MapboxMap,
        event: &str,
        layer_id: &str,
        handler: &Closure<dyn FnMut(JsValue)>,
    );

    #[wasm_bindgen(catch, method, js_class = "Map", js_name = queryRenderedFeatures)]
    fn query_rendered_features(
        this: &MapboxMap,
        point: &JsValue,
        options: &JsValue,
    ) -> Result<js_sys::Array, JsValue>;

    #[wasm_bindgen(method, js_class = "Map", js_name = getCanvas)]
    fn get_canvas(this: &MapboxMap) -> web_sys::HtmlCanvasElement;

    #[wasm_bindgen(method, js_class = "Map")]
    fn remove(this: &MapboxMap);
}

fn js_string(v: &JsValue) -> String {
    v.as_string().unwrap_or_else(|| format!("{v:?}"))
}

/// serde -> JSON text -> `JSON.parse`, so serde attribute renames apply.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, EngineError> {
    let text = serde_json::to_string(value).map_err(|e| EngineError::Js(e.to_string()))?;
    js_sys::JSON::parse(&text).map_err(|e| EngineError::Js(js_string(&e)))
}

fn from_js(value: &JsValue) -> Result<Value, EngineError> {
    let text = js_sys::JSON::stringify(value)
        .map_err(|e| EngineError::Js(js_string(&e)))?
        .as_string()
        .unwrap_or_default();
    serde_json::from_str(&text).map_err(|e| EngineError::Js(e.to_string()))
}

fn event_point(ev: &JsValue) -> ScreenPoint {
    let point = js_sys::Reflect::get(ev, &JsValue::from_str("point")).unwrap_or(JsValue::NULL);
    let coord = |key: &str| {
        js_sys::Reflect::get(&point, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    };
    ScreenPoint::new(coord("x"), coord("y"))
}

#[derive(Debug, Default, Copy, Clone)]
pub struct MapboxEngine;

impl MapEngine for MapboxEngine {
    type Handle = MapboxHandle;

    fn create(
        &self,
        container: &Container,
        options: &MapOptions,
    ) -> Result<Self::Handle, EngineError> {
        let mut opts = match serde_json::to_value(options) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(EngineError::Init(e.to_string())),
        };
        opts.insert("container".to_string(), Value::from(container.id.clone()));

        let map = MapboxMap::new(&to_js(&opts)?).map_err(|e| EngineError::Init(js_string(&e)))?;
        Ok(MapboxHandle {
            map,
            container_id: container.id.clone(),
            on_ready: None,
            on_layer: Vec::new(),
        })
    }
}

/// Live mapbox-gl map plus the callbacks registered on it.
///
/// Closures are owned here and dropped only after `Map.remove()` has detached
/// them.
pub struct MapboxHandle {
    map: MapboxMap,
    container_id: String,
    on_ready: Option<Closure<dyn FnMut()>>,
    on_layer: Vec<Closure<dyn FnMut(JsValue)>>,
}

impl MapHandle for MapboxHandle {
    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), EngineError> {
        self.map
            .add_source(id, &to_js(source)?)
            .map_err(|e| EngineError::Js(js_string(&e)))
    }

    fn remove_source(&mut self, id: &str) -> Result<(), EngineError> {
        self.map
            .remove_source(id)
            .map_err(|e| EngineError::Js(js_string(&e)))
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), EngineError> {
        self.map
            .add_layer(&to_js(layer)?)
            .map_err(|e| EngineError::Js(js_string(&e)))
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError> {
        self.map
            .remove_layer(id)
            .map_err(|e| EngineError::Js(js_string(&e)))
    }

    fn listen(&mut self, listener: Listener) -> Result<(), EngineError> {
        let container_id = self.container_id.clone();
        match listener {
            Listener::Ready => {
                let cb: Closure<dyn FnMut()> =
                    Closure::new(move || deliver(&container_id, MapEvent::Ready));
                self.map.once("load", &cb);
                self.on_ready = Some(cb);
            }
            Listener::Layer { kind, layer_id } => {
                let target = layer_id.clone();
                let cb: Closure<dyn FnMut(JsValue)> = Closure::new(move |ev: JsValue| {
                    let event = MapEvent::Layer {
                        kind,
                        layer_id: target.clone(),
                        point: event_point(&ev),
                    };
                    deliver(&container_id, event);
                });
                self.map.on_layer(kind.as_str(), &layer_id, &cb);
                self.on_layer.push(cb);
            }
        }
        Ok(())
    }

    fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: &[&str],
    ) -> Result<Vec<RenderedFeature>, EngineError> {
        let mut opts = Map::new();
        if !layers.is_empty() {
            opts.insert("layers".to_string(), Value::from(layers.to_vec()));
        }
        let hits = self
            .map
            .query_rendered_features(&to_js(&[point.x, point.y])?, &to_js(&opts)?)
            .map_err(|e| EngineError::Js(js_string(&e)))?;

        let mut out = Vec::with_capacity(hits.length() as usize);
        for hit in hits.iter() {
            let v = from_js(&hit)?;
            let properties = match v.get("properties") {
                Some(Value::Object(p)) => p.clone(),
                _ => Map::new(),
            };
            out.push(RenderedFeature {
                layer_id: v["layer"]["id"].as_str().unwrap_or_default().to_string(),
                source_id: v["source"].as_str().unwrap_or_default().to_string(),
                properties,
            });
        }
        Ok(out)
    }

    fn cursor(&self) -> Cursor {
        let style = self.map.get_canvas().style();
        Cursor::from_css(&style.get_property_value("cursor").unwrap_or_default())
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        let style = self.map.get_canvas().style();
        if let Err(e) = style.set_property("cursor", cursor.as_css()) {
            tracing::warn!(error = %js_string(&e), "failed to set canvas cursor");
        }
    }

    fn remove(self) {
        self.map.remove();
    }
}

/// Sends each lookup through `fetch`; see [`decode_response`] for the mapping.
#[derive(Debug, Default, Copy, Clone)]
pub struct GlooInfoClient;

impl InfoClient for GlooInfoClient {
    fn get_json(&self, url: &str) -> LocalBoxFuture<'static, Result<Value, LookupError>> {
        let url = url.to_string();
        async move {
            let resp = Request::get(&url)
                .send()
                .await
                .map_err(|e| LookupError::Network(e.to_string()))?;
            let text = resp
                .text()
                .await
                .map_err(|e| LookupError::Network(e.to_string()))?;
            decode_response(resp.status(), &text)
        }
        .boxed_local()
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct WasmSpawner;

impl Spawn for WasmSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

type BrowserWidget = MapWidget<MapboxEngine, StaticBoundaryProvider, GlooInfoClient, WasmSpawner>;

thread_local! {
    static WIDGETS: RefCell<WidgetRegistry<MapboxEngine, StaticBoundaryProvider, GlooInfoClient, WasmSpawner>> =
        RefCell::new(WidgetRegistry::new());
}

fn console_sink(event: &Event) {
    let line = JsValue::from_str(&format!(
        "[{} #{}] {}: {}",
        event.level.as_str(),
        event.seq,
        event.kind,
        event.message
    ));
    match event.level {
        Level::Error => web_sys::console::error_1(&line),
        Level::Warn => web_sys::console::warn_1(&line),
        Level::Info | Level::Debug => web_sys::console::log_1(&line),
    }
}

fn deliver(container_id: &str, event: MapEvent) {
    WIDGETS.with(|widgets| {
        let Ok(mut widgets) = widgets.try_borrow_mut() else {
            web_sys::console::warn_1(&JsValue::from_str("map event dropped: registry busy"));
            return;
        };
        let Some(widget) = widgets.get_mut(container_id) else {
            return;
        };
        if let Err(e) = widget.dispatch(event) {
            web_sys::console::error_1(&JsValue::from_str(&e.to_string()));
        }
    });
}

/// Sizes the container element and reports its geometry, or `None` when the
/// element is not in the document yet. Only width and height are touched.
fn attach_container(container_id: &str, config: &WidgetConfig) -> Result<Option<Container>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let Some(element) = document.get_element_by_id(container_id) else {
        return Ok(None);
    };
    let (width, height) = match element.dyn_ref::<web_sys::HtmlElement>() {
        Some(el) => {
            let style = el.style();
            for (property, value) in config.container_style() {
                style.set_property(property, &value)?;
            }
            (el.client_width(), el.client_height())
        }
        None => (0, 0),
    };
    Ok(Some(Container::new(
        container_id,
        u32::try_from(width).unwrap_or(0),
        u32::try_from(height).unwrap_or(config.height_px),
    )))
}

fn status_str(status: MountStatus) -> &'static str {
    match status {
        MountStatus::Mounted => "mounted",
        MountStatus::AlreadyMounted => "already-mounted",
        MountStatus::ContainerMissing => "container-missing",
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Mounts (or re-attempts mounting) the widget bound to `container_id`.
///
/// `config_json` is a [`WidgetConfig`] object; omitted fields use defaults.
/// A retry after `"container-missing"` or an error uses the config passed to
/// that retry.
/// Returns `"mounted"`, `"already-mounted"` or `"container-missing"`.
#[wasm_bindgen]
pub fn mount_boundary_map(container_id: &str, config_json: &str) -> Result<String, JsValue> {
    let config = WidgetConfig::from_json(config_json)
        .map_err(|e| JsValue::from_str(&WidgetError::from(e).to_string()))?;
    let container = attach_container(container_id, &config)?;

    WIDGETS.with(|widgets| {
        let mut widgets = widgets
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("widget registry busy"))?;
        let status = widgets
            .mount(container_id, container.as_ref(), || -> BrowserWidget {
                MapWidget::new(
                    config,
                    MapboxEngine,
                    StaticBoundaryProvider::new(),
                    Rc::new(GlooInfoClient),
                    WasmSpawner,
                    EventLog::with_sink(Rc::new(console_sink)),
                )
            })
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(status_str(status).to_string())
    })
}

/// Cancels pending lookups and removes the map. Returns `false` if nothing
/// was mounted under `container_id`.
#[wasm_bindgen]
pub fn unmount_boundary_map(container_id: &str) -> bool {
    // Taken out of the registry first so callbacks fired during teardown
    // find nothing.
    let widget = WIDGETS.with(|widgets| {
        widgets
            .try_borrow_mut()
            .ok()
            .and_then(|mut w| w.remove(container_id))
    });
    match widget {
        Some(mut w) => w.unmount(),
        None => false,
    }
}

#[wasm_bindgen]
pub fn pending_lookups(container_id: &str) -> u32 {
    WIDGETS.with(|widgets| {
        widgets
            .try_borrow()
            .ok()
            .map(|w| u32::try_from(w.pending_lookups(container_id)).unwrap_or(u32::MAX))
            .unwrap_or(0)
    })
}
