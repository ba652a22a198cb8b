pub mod event;
pub mod headless;
pub mod map;
pub mod picking;
pub mod projection;

pub use event::*;
pub use headless::{HeadlessEngine, HeadlessMap, HeadlessStats};
pub use map::*;
pub use projection::Viewport;
