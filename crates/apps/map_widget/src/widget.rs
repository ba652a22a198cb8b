use std::rc::Rc;

use catalog::{BoundaryProvider, CatalogError};
use engine::{Container, EngineError, Listener, MapEngine, MapEvent, MapHandle};
use foundation::Boundary;
use runtime::{EventLog, Spawn};

use crate::config::WidgetConfig;
use crate::interaction::{Interaction, handle_layer_event};
use crate::loader::install_boundaries;
use crate::lookup::{BoundaryInfoLookup, InfoClient};

#[derive(Debug)]
pub enum WidgetError {
    Engine(EngineError),
    Provider(CatalogError),
    Config(String),
}

impl std::fmt::Display for WidgetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetError::Engine(e) => write!(f, "map engine: {e}"),
            WidgetError::Provider(e) => write!(f, "boundary provider: {e}"),
            WidgetError::Config(msg) => write!(f, "invalid widget config: {msg}"),
        }
    }
}

impl std::error::Error for WidgetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WidgetError::Engine(e) => Some(e),
            WidgetError::Provider(e) => Some(e),
            WidgetError::Config(_) => None,
        }
    }
}

impl From<EngineError> for WidgetError {
    fn from(e: EngineError) -> Self {
        WidgetError::Engine(e)
    }
}

impl From<CatalogError> for WidgetError {
    fn from(e: CatalogError) -> Self {
        WidgetError::Provider(e)
    }
}

impl From<serde_json::Error> for WidgetError {
    fn from(e: serde_json::Error) -> Self {
        WidgetError::Config(e.to_string())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MountStatus {
    Mounted,
    AlreadyMounted,
    /// No container yet; the host should call `mount` again once it has one.
    ContainerMissing,
}

enum Phase<H> {
    Idle,
    AwaitingReady(H),
    Ready(H),
    /// Loader failed. The map stays up (and is still removed on unmount) but
    /// no listeners were installed.
    Faulted(H),
}

impl<H> Phase<H> {
    fn handle(&self) -> Option<&H> {
        match self {
            Phase::Idle => None,
            Phase::AwaitingReady(h) | Phase::Ready(h) | Phase::Faulted(h) => Some(h),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::AwaitingReady(_) => "awaiting-ready",
            Phase::Ready(_) => "ready",
            Phase::Faulted(_) => "faulted",
        }
    }
}

/// Boundary map widget: owns one engine map while mounted.
///
/// Ordering contract:
/// - `mount` creates the map and registers the ready listener; nothing else.
/// - The first [`MapEvent::Ready`] installs boundaries exactly once.
/// - Layer events are handled only after a successful load.
/// - `unmount` cancels pending lookups before the map is removed. Events
///   delivered afterwards are ignored.
pub struct MapWidget<E: MapEngine, P, C, S> {
    config: WidgetConfig,
    engine: E,
    provider: P,
    spawner: S,
    lookup: BoundaryInfoLookup<C>,
    log: EventLog,
    phase: Phase<E::Handle>,
    boundaries: Vec<Boundary>,
}

impl<E: MapEngine, P, C, S> MapWidget<E, P, C, S> {
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Boundaries installed by the last successful load; empty before ready.
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn handle(&self) -> Option<&E::Handle> {
        self.phase.handle()
    }

    pub fn is_mounted(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready(_))
    }

    pub fn pending_lookups(&self) -> usize {
        self.lookup.pending()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Cancels in-flight lookups, then removes the map. Returns whether a map
    /// was removed; a second call is a no-op.
    pub fn unmount(&mut self) -> bool {
        self.lookup.cancel_all();
        self.boundaries.clear();

        let handle = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => return false,
            Phase::AwaitingReady(h) | Phase::Ready(h) | Phase::Faulted(h) => h,
        };
        handle.remove();
        self.log.info("map.removed", "map instance removed");
        true
    }
}

impl<E, P, C, S> MapWidget<E, P, C, S>
where
    E: MapEngine,
    P: BoundaryProvider,
    C: InfoClient + 'static,
    S: Spawn,
{
    pub fn new(
        config: WidgetConfig,
        engine: E,
        provider: P,
        client: Rc<C>,
        spawner: S,
        log: EventLog,
    ) -> Self {
        let lookup = BoundaryInfoLookup::new(config.info_endpoint.clone(), client, log.clone());
        Self {
            config,
            engine,
            provider,
            spawner,
            lookup,
            log,
            phase: Phase::Idle,
            boundaries: Vec::new(),
        }
    }

    pub fn mount(&mut self, container: Option<&Container>) -> Result<MountStatus, WidgetError> {
        if self.is_mounted() {
            self.log.debug("map.already_mounted", "mount ignored: map already exists");
            return Ok(MountStatus::AlreadyMounted);
        }
        let Some(container) = container else {
            self.log.warn("map.container_missing", "mount deferred: no container");
            return Ok(MountStatus::ContainerMissing);
        };

        let mut handle = match self.engine.create(container, &self.config.map_options()) {
            Ok(h) => h,
            Err(e) => {
                self.log.error("map.init_failed", e.to_string());
                return Err(e.into());
            }
        };
        if let Err(e) = handle.listen(Listener::Ready) {
            handle.remove();
            self.log.error("map.init_failed", e.to_string());
            return Err(e.into());
        }

        self.phase = Phase::AwaitingReady(handle);
        self.log.info(
            "map.created",
            format!("map created in container {}", container.id),
        );
        Ok(MountStatus::Mounted)
    }

    /// Feeds one engine event to the widget.
    ///
    /// Returns the interaction a layer event resolved to, or `None` when the
    /// event was the ready signal or arrived in a phase that ignores it.
    pub fn dispatch(&mut self, event: MapEvent) -> Result<Option<Interaction>, WidgetError> {
        match event {
            MapEvent::Ready => {
                self.on_ready()?;
                Ok(None)
            }
            MapEvent::Layer {
                kind,
                layer_id,
                point,
            } => {
                let handle = match &mut self.phase {
                    Phase::Ready(h) => h,
                    other => {
                        self.log.debug(
                            "event.ignored",
                            format!("{} on {layer_id} while {}", kind.as_str(), other.name()),
                        );
                        return Ok(None);
                    }
                };

                let interaction = handle_layer_event(handle, kind, &layer_id, point)?;
                match &interaction {
                    Interaction::Selected(id) => {
                        self.log
                            .info("boundary.selected", format!("clicked boundary {id}"));
                        self.lookup.start(&self.spawner, id);
                    }
                    Interaction::Missed => {
                        self.log.debug("boundary.missed", "click hit no boundary");
                    }
                    Interaction::Cursor(_) | Interaction::Ignored => {}
                }
                Ok(Some(interaction))
            }
        }
    }

    fn on_ready(&mut self) -> Result<(), WidgetError> {
        let mut handle = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingReady(h) => h,
            other => {
                self.log.debug(
                    "event.ignored",
                    format!("ready while {}", other.name()),
                );
                self.phase = other;
                return Ok(());
            }
        };

        match install_boundaries(&mut handle, &self.provider) {
            Ok(boundaries) => {
                self.log.info(
                    "boundaries.loaded",
                    format!("installed {} boundaries", boundaries.len()),
                );
                self.boundaries = boundaries;
                self.phase = Phase::Ready(handle);
                Ok(())
            }
            Err(e) => {
                self.log
                    .error("boundaries.failed", format!("loading boundaries failed: {e}"));
                self.phase = Phase::Faulted(handle);
                Err(e)
            }
        }
    }
}

impl<E: MapEngine, P, C, S> Drop for MapWidget<E, P, C, S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::{MapWidget, MountStatus, WidgetError};
    use crate::config::WidgetConfig;
    use crate::lookup::{InfoClient, LookupError};
    use catalog::StaticBoundaryProvider;
    use engine::{Container, HeadlessEngine, MapEvent};
    use futures_util::FutureExt;
    use futures_util::future::{LocalBoxFuture, ready};
    use runtime::{EventLog, LocalQueue};
    use serde_json::{Value, json};
    use std::rc::Rc;

    struct Ok200;

    impl InfoClient for Ok200 {
        fn get_json(&self, _url: &str) -> LocalBoxFuture<'static, Result<Value, LookupError>> {
            ready(Ok(json!({}))).boxed_local()
        }
    }

    type TestWidget = MapWidget<HeadlessEngine, StaticBoundaryProvider, Ok200, LocalQueue>;

    fn widget() -> TestWidget {
        MapWidget::new(
            WidgetConfig::new("pk.test"),
            HeadlessEngine::new(),
            StaticBoundaryProvider::new(),
            Rc::new(Ok200),
            LocalQueue::new(),
            EventLog::new(),
        )
    }

    #[test]
    fn missing_container_creates_nothing() {
        let mut w = widget();
        assert_eq!(w.mount(None).unwrap(), MountStatus::ContainerMissing);
        assert!(!w.is_mounted());
        assert_eq!(w.engine().stats().created, 0);
    }

    #[test]
    fn second_mount_is_rejected() {
        let mut w = widget();
        let c = Container::new("map", 800, 500);
        assert_eq!(w.mount(Some(&c)).unwrap(), MountStatus::Mounted);
        assert_eq!(w.mount(Some(&c)).unwrap(), MountStatus::AlreadyMounted);
        assert_eq!(w.engine().stats().created, 1);
    }

    #[test]
    fn engine_failure_propagates() {
        let mut w = widget();
        let err = w.mount(Some(&Container::new("map", 0, 0))).unwrap_err();
        assert!(matches!(err, WidgetError::Engine(_)));
        assert!(!w.is_mounted());
        assert_eq!(w.event_log().count("map.init_failed"), 1);
    }

    #[test]
    fn token_reaches_the_engine() {
        let mut w = widget();
        w.mount(Some(&Container::new("map", 800, 500))).unwrap();
        assert_eq!(w.handle().unwrap().options().access_token, "pk.test");
    }

    #[test]
    fn ready_twice_loads_once() {
        let mut w = widget();
        w.mount(Some(&Container::new("map", 800, 500))).unwrap();
        w.dispatch(MapEvent::Ready).unwrap();
        w.dispatch(MapEvent::Ready).unwrap();
        assert!(w.is_ready());
        assert_eq!(w.event_log().count("boundaries.loaded"), 1);
        assert_eq!(w.handle().unwrap().layer_ids().len(), 2);
    }

    #[test]
    fn drop_removes_the_map() {
        let engine = HeadlessEngine::new();
        {
            let mut w = MapWidget::new(
                WidgetConfig::default(),
                engine.clone(),
                StaticBoundaryProvider::new(),
                Rc::new(Ok200),
                LocalQueue::new(),
                EventLog::new(),
            );
            w.mount(Some(&Container::new("map", 800, 500))).unwrap();
            assert_eq!(engine.stats().live(), 1);
        }
        assert_eq!(engine.stats().live(), 0);
    }
}
