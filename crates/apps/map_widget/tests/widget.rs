use std::cell::{Cell, RefCell};
use std::rc::Rc;

use catalog::{BoundaryProvider, CatalogError, StaticBoundaryProvider};
use engine::{Container, Cursor, HeadlessEngine, MapEvent, MapHandle, ScreenPoint};
use foundation::{Boundary, BoundaryId, LonLat};
use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, pending, ready};
use layers::BOUNDARIES_FILL_LAYER_ID;
use map_widget::{
    InfoClient, Interaction, LookupError, MapWidget, MountStatus, WidgetConfig, WidgetError,
};
use pretty_assertions::assert_eq;
use runtime::{DEFAULT_EVENT_CAPACITY, EventLog, LocalQueue};
use serde_json::{Value, json};

#[derive(Default)]
struct CountingProvider {
    calls: Cell<usize>,
    fail: bool,
}

impl BoundaryProvider for CountingProvider {
    fn list_boundaries(&self) -> Result<Vec<Boundary>, CatalogError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(CatalogError::Io("boundary service unreachable".to_string()));
        }
        StaticBoundaryProvider::new().list_boundaries()
    }
}

enum Reply {
    Json(Value),
    Fail(LookupError),
    Never,
}

struct MockClient {
    reply: Reply,
    urls: RefCell<Vec<String>>,
}

impl MockClient {
    fn new(reply: Reply) -> Rc<Self> {
        Rc::new(Self {
            reply,
            urls: RefCell::new(Vec::new()),
        })
    }
}

impl InfoClient for MockClient {
    fn get_json(&self, url: &str) -> LocalBoxFuture<'static, Result<Value, LookupError>> {
        self.urls.borrow_mut().push(url.to_string());
        match &self.reply {
            Reply::Json(v) => ready(Ok(v.clone())).boxed_local(),
            Reply::Fail(e) => ready(Err(e.clone())).boxed_local(),
            Reply::Never => pending().boxed_local(),
        }
    }
}

struct Harness {
    widget: MapWidget<HeadlessEngine, Rc<CountingProvider>, MockClient, LocalQueue>,
    engine: HeadlessEngine,
    provider: Rc<CountingProvider>,
    client: Rc<MockClient>,
    queue: LocalQueue,
    log: EventLog,
}

fn harness_with(provider: CountingProvider, reply: Reply) -> Harness {
    let engine = HeadlessEngine::new();
    let provider = Rc::new(provider);
    let client = MockClient::new(reply);
    let queue = LocalQueue::new();
    let log = EventLog::new();
    let mut config = WidgetConfig::new("pk.test-token");
    config.info_endpoint = "https://info.test/boundaries".to_string();

    let widget = MapWidget::new(
        config,
        engine.clone(),
        Rc::clone(&provider),
        Rc::clone(&client),
        queue.clone(),
        log.clone(),
    );
    Harness {
        widget,
        engine,
        provider,
        client,
        queue,
        log,
    }
}

fn harness(reply: Reply) -> Harness {
    harness_with(CountingProvider::default(), reply)
}

fn container() -> Container {
    Container::new("map", 800, 500)
}

impl Harness {
    fn mount_ready(&mut self) {
        assert_eq!(self.widget.mount(Some(&container())).unwrap(), MountStatus::Mounted);
        self.widget.dispatch(MapEvent::Ready).unwrap();
        assert!(self.widget.is_ready());
    }

    fn screen(&self, lon: f64, lat: f64) -> ScreenPoint {
        self.widget.handle().unwrap().project(LonLat::new(lon, lat))
    }

    fn click(&mut self, lon: f64, lat: f64) -> Option<Interaction> {
        let p = self.screen(lon, lat);
        self.widget
            .dispatch(MapEvent::click(BOUNDARIES_FILL_LAYER_ID, p))
            .unwrap()
    }
}

#[test]
fn loaded_boundaries_match_the_rendered_source() {
    let mut h = harness(Reply::Json(json!({})));
    h.mount_ready();

    let ids: Vec<&str> = h.widget.boundaries().iter().map(|b| b.id().as_str()).collect();
    assert_eq!(ids, vec!["b1", "b2", "b3", "b4", "b5", "b6"]);
    assert!(h.widget.boundaries().iter().all(|b| b.geometry().exterior().is_closed()));

    let map = h.widget.handle().unwrap();
    let data = map.source("boundaries").unwrap().data();
    let mut feature_ids: Vec<&str> = data.feature_ids().collect();
    feature_ids.sort();
    assert_eq!(feature_ids, ids);
}

#[test]
fn click_on_boundary_starts_exactly_one_lookup() {
    let mut h = harness(Reply::Json(json!({ "name": "Boundary 5" })));
    h.mount_ready();

    let hit = h.click(-123.0, 49.17);
    assert_eq!(hit, Some(Interaction::Selected(BoundaryId::new("b5"))));
    assert_eq!(h.widget.pending_lookups(), 1);

    h.queue.run_until_stalled();
    assert_eq!(
        *h.client.urls.borrow(),
        vec!["https://info.test/boundaries/b5".to_string()]
    );
    assert_eq!(h.log.count("lookup.succeeded"), 1);
    assert_eq!(h.widget.pending_lookups(), 0);
}

#[test]
fn click_on_empty_space_starts_nothing() {
    let mut h = harness(Reply::Json(json!({})));
    h.mount_ready();

    assert_eq!(h.click(-122.85, 49.25), Some(Interaction::Missed));
    h.queue.run_until_stalled();
    assert!(h.client.urls.borrow().is_empty());
    assert_eq!(h.log.count("lookup.started"), 0);
}

#[test]
fn hover_then_leave_restores_default_cursor() {
    let mut h = harness(Reply::Json(json!({})));
    h.mount_ready();
    let before = h.widget.handle().unwrap().cursor();
    let p = h.screen(-123.0, 49.17);

    h.widget
        .dispatch(MapEvent::mouse_enter(BOUNDARIES_FILL_LAYER_ID, p))
        .unwrap();
    assert_eq!(h.widget.handle().unwrap().cursor(), Cursor::Pointer);

    h.widget
        .dispatch(MapEvent::mouse_leave(BOUNDARIES_FILL_LAYER_ID, p))
        .unwrap();
    assert_eq!(h.widget.handle().unwrap().cursor(), before);
}

#[test]
fn unmount_before_ready_skips_the_loader() {
    let mut h = harness(Reply::Json(json!({})));
    h.widget.mount(Some(&container())).unwrap();

    assert!(h.widget.unmount());
    // A ready signal racing the teardown is ignored.
    h.widget.dispatch(MapEvent::Ready).unwrap();

    assert_eq!(h.provider.calls.get(), 0);
    assert!(h.widget.boundaries().is_empty());
    assert_eq!(h.engine.stats().live(), 0);
}

#[test]
fn unmount_twice_is_a_noop() {
    let mut h = harness(Reply::Json(json!({})));
    h.mount_ready();
    assert!(h.widget.unmount());
    assert!(!h.widget.unmount());
    assert_eq!(h.engine.stats().removed, 1);
    assert_eq!(h.log.count("map.removed"), 1);
}

#[test]
fn rejected_lookup_is_logged_once_and_contained() {
    let mut h = harness(Reply::Fail(LookupError::Status(500)));
    h.mount_ready();

    h.click(-123.0, 49.17);
    h.queue.run_until_stalled();

    assert_eq!(h.log.count("lookup.failed"), 1);
    assert_eq!(h.log.count("lookup.succeeded"), 0);
    // Widget keeps working after the failure.
    assert!(h.widget.is_ready());
    assert_eq!(
        h.click(-123.0, 49.17),
        Some(Interaction::Selected(BoundaryId::new("b5")))
    );
}

#[test]
fn unmount_cancels_in_flight_lookup() {
    let mut h = harness(Reply::Never);
    h.mount_ready();

    h.click(-123.0, 49.17);
    h.click(-122.99, 49.27);
    h.queue.run_until_stalled();
    assert_eq!(h.widget.pending_lookups(), 2);

    h.widget.unmount();
    h.queue.run_until_stalled();

    assert_eq!(h.widget.pending_lookups(), 0);
    assert_eq!(h.log.count("lookup.cancelled"), 2);
    assert_eq!(h.log.count("lookup.succeeded"), 0);
    assert_eq!(h.log.count("lookup.failed"), 0);
    assert!(h.queue.is_empty());

    let kinds: Vec<&str> = h.log.events().iter().map(|e| e.kind).collect();
    let last_cancel = kinds.iter().rposition(|k| *k == "lookup.cancelled").unwrap();
    let removed = kinds.iter().position(|k| *k == "map.removed").unwrap();
    assert!(last_cancel < removed, "lookups must be cancelled before the map goes away");
}

#[test]
fn late_events_after_unmount_are_ignored() {
    let mut h = harness(Reply::Json(json!({})));
    h.mount_ready();
    let p = h.screen(-123.0, 49.17);
    h.widget.unmount();

    let r = h
        .widget
        .dispatch(MapEvent::click(BOUNDARIES_FILL_LAYER_ID, p))
        .unwrap();
    assert_eq!(r, None);
    h.queue.run_until_stalled();
    assert!(h.client.urls.borrow().is_empty());
}

#[test]
fn provider_failure_surfaces_and_map_is_still_released() {
    let provider = CountingProvider {
        fail: true,
        ..CountingProvider::default()
    };
    let mut h = harness_with(provider, Reply::Json(json!({})));
    h.widget.mount(Some(&container())).unwrap();

    let err = h.widget.dispatch(MapEvent::Ready).unwrap_err();
    assert!(matches!(err, WidgetError::Provider(CatalogError::Io(_))));
    assert!(!h.widget.is_ready());
    assert_eq!(h.log.count("boundaries.failed"), 1);

    assert!(h.widget.unmount());
    assert_eq!(h.engine.stats().live(), 0);
}

#[test]
fn remount_after_unmount_creates_a_fresh_map() {
    let mut h = harness(Reply::Json(json!({})));
    h.mount_ready();
    h.widget.unmount();
    h.mount_ready();

    assert_eq!(h.engine.stats().created, 2);
    assert_eq!(h.engine.stats().live(), 1);
    assert_eq!(h.provider.calls.get(), 2);
}

#[test]
fn event_log_stays_bounded_over_a_long_session() {
    let big = json!({ "notes": "x".repeat(64 * 1024) });
    let mut h = harness(Reply::Json(big));
    h.mount_ready();

    for _ in 0..400 {
        h.click(-123.0, 49.17);
        h.queue.run_until_stalled();
    }

    let events = h.log.events();
    assert_eq!(events.len(), DEFAULT_EVENT_CAPACITY);
    assert!(events.iter().all(|e| e.message.len() < 1024));
    assert_eq!(h.widget.pending_lookups(), 0);
}
