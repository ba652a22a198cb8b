/// Position in CSS pixels relative to the map container's top-left corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerEventKind {
    Click,
    MouseEnter,
    MouseLeave,
}

impl LayerEventKind {
    pub const ALL: [LayerEventKind; 3] = [
        LayerEventKind::Click,
        LayerEventKind::MouseEnter,
        LayerEventKind::MouseLeave,
    ];

    /// Engine event name.
    pub fn as_str(self) -> &'static str {
        match self {
            LayerEventKind::Click => "click",
            LayerEventKind::MouseEnter => "mouseenter",
            LayerEventKind::MouseLeave => "mouseleave",
        }
    }
}

/// Listener registration requested from the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Listener {
    /// One-time notification that initial resources finished loading.
    Ready,
    Layer {
        kind: LayerEventKind,
        layer_id: String,
    },
}

impl Listener {
    pub fn layer(kind: LayerEventKind, layer_id: impl Into<String>) -> Self {
        Listener::Layer {
            kind,
            layer_id: layer_id.into(),
        }
    }
}

/// Event delivered by the engine for a registered [`Listener`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Ready,
    Layer {
        kind: LayerEventKind,
        layer_id: String,
        point: ScreenPoint,
    },
}

impl MapEvent {
    pub fn click(layer_id: impl Into<String>, point: ScreenPoint) -> Self {
        MapEvent::Layer {
            kind: LayerEventKind::Click,
            layer_id: layer_id.into(),
            point,
        }
    }

    pub fn mouse_enter(layer_id: impl Into<String>, point: ScreenPoint) -> Self {
        MapEvent::Layer {
            kind: LayerEventKind::MouseEnter,
            layer_id: layer_id.into(),
            point,
        }
    }

    pub fn mouse_leave(layer_id: impl Into<String>, point: ScreenPoint) -> Self {
        MapEvent::Layer {
            kind: LayerEventKind::MouseLeave,
            layer_id: layer_id.into(),
            point,
        }
    }
}

/// Canvas cursor affordance.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Engine default (empty style value).
    #[default]
    Default,
    Pointer,
}

impl Cursor {
    /// CSS `cursor` value written to the canvas style.
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Pointer => "pointer",
        }
    }

    pub fn from_css(s: &str) -> Self {
        match s.trim() {
            "pointer" => Cursor::Pointer,
            _ => Cursor::Default,
        }
    }
}
