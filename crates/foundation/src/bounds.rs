use crate::geo::LonLat;

/// Axis-aligned lon/lat bounding box (degrees). Does not handle the antimeridian.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LonLatBounds {
    pub min: LonLat,
    pub max: LonLat,
}

impl LonLatBounds {
    pub fn new(min: LonLat, max: LonLat) -> Self {
        LonLatBounds { min, max }
    }

    pub fn from_point(p: LonLat) -> Self {
        LonLatBounds { min: p, max: p }
    }

    pub fn extend(&mut self, p: LonLat) {
        self.min.lon_deg = self.min.lon_deg.min(p.lon_deg);
        self.min.lat_deg = self.min.lat_deg.min(p.lat_deg);
        self.max.lon_deg = self.max.lon_deg.max(p.lon_deg);
        self.max.lat_deg = self.max.lat_deg.max(p.lat_deg);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        out.extend(other.min);
        out.extend(other.max);
        out
    }

    pub fn contains(&self, p: LonLat) -> bool {
        p.lon_deg >= self.min.lon_deg
            && p.lon_deg <= self.max.lon_deg
            && p.lat_deg >= self.min.lat_deg
            && p.lat_deg <= self.max.lat_deg
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            0.5 * (self.min.lon_deg + self.max.lon_deg),
            0.5 * (self.min.lat_deg + self.max.lat_deg),
        )
    }
}
