use engine::MapOptions;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/streets-v11";
pub const DEFAULT_CENTER: [f64; 2] = [-123.0, 49.25];
pub const DEFAULT_ZOOM: f64 = 10.0;
pub const DEFAULT_INFO_ENDPOINT: &str = "https://api.example.com/boundaries";
pub const DEFAULT_HEIGHT_PX: u32 = 500;

/// Everything the widget needs from its host, injected at construction.
///
/// Missing fields fall back to the defaults above when deserialized. The
/// access token is passed through to the engine unvalidated; a bad token
/// surfaces as an engine-level failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub access_token: String,
    pub style: String,
    /// `[lon, lat]` in degrees.
    pub center: [f64; 2],
    pub zoom: f64,
    /// Base URL; lookups request `<info_endpoint>/<boundary id>`.
    pub info_endpoint: String,
    /// Container height. Width always fills the parent.
    pub height_px: u32,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            style: DEFAULT_STYLE.to_string(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            info_endpoint: DEFAULT_INFO_ENDPOINT.to_string(),
            height_px: DEFAULT_HEIGHT_PX,
        }
    }
}

impl WidgetConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            style: self.style.clone(),
            center: self.center,
            zoom: self.zoom,
            access_token: self.access_token.clone(),
        }
    }

    /// Style properties set on the container element. Other properties the
    /// host page put there are left alone.
    pub fn container_style(&self) -> [(&'static str, String); 2] {
        [
            ("width", "100%".to_string()),
            ("height", format!("{}px", self.height_px)),
        ]
    }
}
