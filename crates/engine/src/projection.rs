use foundation::LonLat;

use crate::event::ScreenPoint;

/// Tile edge in pixels at zoom 0 (vector-tile engines render 512px tiles).
pub const TILE_SIZE: f64 = 512.0;

/// Web Mercator latitude limit.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Camera state of a flat Web Mercator map.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub center: LonLat,
    pub zoom: f64,
    pub width_px: f64,
    pub height_px: f64,
}

impl Viewport {
    pub fn new(center: LonLat, zoom: f64, width_px: f64, height_px: f64) -> Self {
        Self {
            center,
            zoom,
            width_px,
            height_px,
        }
    }

    pub fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    pub fn project(&self, p: LonLat) -> ScreenPoint {
        let ws = self.world_size();
        let [px, py] = mercator_unit(p);
        let [cx, cy] = mercator_unit(self.center);
        ScreenPoint::new(
            (px - cx) * ws + 0.5 * self.width_px,
            (py - cy) * ws + 0.5 * self.height_px,
        )
    }

    pub fn unproject(&self, s: ScreenPoint) -> LonLat {
        let ws = self.world_size();
        let [cx, cy] = mercator_unit(self.center);
        let x = cx + (s.x - 0.5 * self.width_px) / ws;
        let y = cy + (s.y - 0.5 * self.height_px) / ws;
        let lon = x * 360.0 - 180.0;
        let lat = (std::f64::consts::PI * (1.0 - 2.0 * y))
            .sinh()
            .atan()
            .to_degrees();
        LonLat::new(lon, lat)
    }
}

/// Web Mercator position in unit square coordinates (y grows southward).
fn mercator_unit(p: LonLat) -> [f64; 2] {
    let lat = p.lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lon_deg + 180.0) / 360.0;
    let y = 0.5 - (std::f64::consts::FRAC_PI_4 + 0.5 * lat).tan().ln() / (2.0 * std::f64::consts::PI);
    [x, y]
}
