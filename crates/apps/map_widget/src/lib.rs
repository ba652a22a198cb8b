pub mod config;
pub mod interaction;
pub mod loader;
pub mod lookup;
pub mod registry;
pub mod widget;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::WidgetConfig;
pub use interaction::{Interaction, handle_layer_event};
pub use loader::install_boundaries;
pub use lookup::{BoundaryInfoLookup, InfoClient, LookupError, decode_response, info_url};
pub use registry::WidgetRegistry;
pub use widget::{MapWidget, MountStatus, WidgetError};
