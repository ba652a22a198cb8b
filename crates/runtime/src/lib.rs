pub mod event_bus;
pub mod spawn;
pub mod tasks;

pub use event_bus::*;
pub use spawn::*;
pub use tasks::*;
