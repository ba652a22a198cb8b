use std::collections::BTreeMap;

use catalog::BoundaryProvider;
use engine::{Container, MapEngine};
use runtime::Spawn;

use crate::lookup::InfoClient;
use crate::widget::{MapWidget, MountStatus, WidgetError};

/// Widgets keyed by container id.
///
/// Only mounted widgets are kept. A mount attempt that ends in
/// `ContainerMissing` or an error leaves no entry behind, so the next attempt
/// builds a widget from the config it is given.
pub struct WidgetRegistry<E: MapEngine, P, C, S> {
    widgets: BTreeMap<String, MapWidget<E, P, C, S>>,
}

impl<E: MapEngine, P, C, S> Default for WidgetRegistry<E, P, C, S> {
    fn default() -> Self {
        Self {
            widgets: BTreeMap::new(),
        }
    }
}

impl<E: MapEngine, P, C, S> WidgetRegistry<E, P, C, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MapWidget<E, P, C, S>> {
        self.widgets.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut MapWidget<E, P, C, S>> {
        self.widgets.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MapWidget<E, P, C, S>> {
        self.widgets.remove(key)
    }

    pub fn pending_lookups(&self, key: &str) -> usize {
        self.widgets.get(key).map_or(0, |w| w.pending_lookups())
    }
}

impl<E, P, C, S> WidgetRegistry<E, P, C, S>
where
    E: MapEngine,
    P: BoundaryProvider,
    C: InfoClient + 'static,
    S: Spawn,
{
    /// Mounts the widget for `key`.
    ///
    /// A widget that is already mounted answers `AlreadyMounted` and `build`
    /// is not called. Otherwise a fresh widget from `build` replaces any
    /// stale entry and is kept only if it mounted.
    pub fn mount(
        &mut self,
        key: &str,
        container: Option<&Container>,
        build: impl FnOnce() -> MapWidget<E, P, C, S>,
    ) -> Result<MountStatus, WidgetError> {
        if let Some(existing) = self.widgets.get_mut(key) {
            if existing.is_mounted() {
                return existing.mount(container);
            }
        }
        self.widgets.remove(key);

        let mut widget = build();
        let status = widget.mount(container)?;
        if status == MountStatus::Mounted {
            self.widgets.insert(key.to_string(), widget);
        }
        Ok(status)
    }

    /// Removes the widget for `key` and tears it down.
    pub fn unmount(&mut self, key: &str) -> bool {
        match self.widgets.remove(key) {
            Some(mut w) => w.unmount(),
            None => false,
        }
    }
}
