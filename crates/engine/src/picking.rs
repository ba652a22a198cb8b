use formats::{Feature, Geometry};
use foundation::{LonLat, Polygon};
use layers::{LayerPaint, LayerSpec};

use crate::event::ScreenPoint;
use crate::projection::Viewport;

/// Extra pick radius around stroked lines, in pixels.
pub const LINE_PICK_SLOP_PX: f64 = 1.0;

/// Whether `feature`, drawn by `layer`, covers `point`.
///
/// Notes:
/// - Fill layers test the unprojected point against the exterior ring in lon/lat space.
/// - Line layers test screen-space distance to the ring's edges against half the
///   stroke width plus [`LINE_PICK_SLOP_PX`].
/// - Rings that fail validation never hit.
pub fn feature_hit(
    layer: &LayerSpec,
    feature: &Feature,
    viewport: &Viewport,
    point: ScreenPoint,
) -> bool {
    let Geometry::Polygon { coordinates } = &feature.geometry;
    let Some(exterior) = coordinates.first() else {
        return false;
    };

    match &layer.paint {
        LayerPaint::Fill(_) => {
            let Ok(polygon) = Polygon::from_coords(exterior) else {
                return false;
            };
            polygon.contains(viewport.unproject(point))
        }
        LayerPaint::Line(paint) => {
            let reach = 0.5 * paint.width + LINE_PICK_SLOP_PX;
            exterior.windows(2).any(|edge| {
                let a = viewport.project(LonLat::from(edge[0]));
                let b = viewport.project(LonLat::from(edge[1]));
                segment_distance(point, a, b) <= reach
            })
        }
    }
}

fn segment_distance(p: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    let t = if len2 <= 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}
