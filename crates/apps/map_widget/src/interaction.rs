use engine::{Cursor, EngineError, LayerEventKind, MapHandle, ScreenPoint};
use foundation::BoundaryId;
use layers::BOUNDARIES_FILL_LAYER_ID;

/// What a pointer event on the boundary layer resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Cursor(Cursor),
    Selected(BoundaryId),
    /// Click that hit no feature, or a feature without a usable id.
    Missed,
    /// Event for some other layer.
    Ignored,
}

/// Stateless handler for fill-layer pointer events.
///
/// Hover toggles the canvas cursor; a click picks the topmost rendered
/// boundary under the pointer.
pub fn handle_layer_event<H: MapHandle>(
    handle: &mut H,
    kind: LayerEventKind,
    layer_id: &str,
    point: ScreenPoint,
) -> Result<Interaction, EngineError> {
    if layer_id != BOUNDARIES_FILL_LAYER_ID {
        return Ok(Interaction::Ignored);
    }

    match kind {
        LayerEventKind::MouseEnter => {
            handle.set_cursor(Cursor::Pointer);
            Ok(Interaction::Cursor(Cursor::Pointer))
        }
        LayerEventKind::MouseLeave => {
            handle.set_cursor(Cursor::Default);
            Ok(Interaction::Cursor(Cursor::Default))
        }
        LayerEventKind::Click => {
            let features = handle.query_rendered_features(point, &[BOUNDARIES_FILL_LAYER_ID])?;
            let id = features
                .first()
                .and_then(|f| f.property_str("id"))
                .filter(|id| !id.is_empty());
            Ok(match id {
                Some(id) => Interaction::Selected(BoundaryId::new(id)),
                None => Interaction::Missed,
            })
        }
    }
}
