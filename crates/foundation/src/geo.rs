//! Geographic primitives in WGS84 degrees.
//!
//! Rings are stored exactly as authored: the closing point is part of the
//! point list, matching how GeoJSON encodes polygon rings.

use crate::bounds::LonLatBounds;

/// Minimum number of positions in a closed linear ring (triangle + closing point).
pub const MIN_RING_POINTS: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLat {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl LonLat {
    pub const fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    pub fn is_finite(&self) -> bool {
        self.lon_deg.is_finite() && self.lat_deg.is_finite()
    }

    pub fn in_range(&self) -> bool {
        (-180.0..=180.0).contains(&self.lon_deg) && (-90.0..=90.0).contains(&self.lat_deg)
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lon_deg, self.lat_deg]
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    TooFewPoints { len: usize },
    NotClosed,
    NonFinite { index: usize },
    OutOfRange { index: usize },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::TooFewPoints { len } => write!(
                f,
                "ring has {len} points, at least {MIN_RING_POINTS} are required"
            ),
            GeometryError::NotClosed => write!(f, "ring is not closed (first != last)"),
            GeometryError::NonFinite { index } => {
                write!(f, "ring point {index} has a non-finite coordinate")
            }
            GeometryError::OutOfRange { index } => {
                write!(f, "ring point {index} is outside lon [-180, 180] / lat [-90, 90]")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Closed linear ring.
///
/// Invariants (checked in [`Ring::new`]):
/// - at least [`MIN_RING_POINTS`] positions
/// - first and last positions are identical
/// - every coordinate is finite and within WGS84 degree ranges
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<LonLat>,
}

impl Ring {
    pub fn new(points: Vec<LonLat>) -> Result<Self, GeometryError> {
        if points.len() < MIN_RING_POINTS {
            return Err(GeometryError::TooFewPoints { len: points.len() });
        }
        for (index, p) in points.iter().enumerate() {
            if !p.is_finite() {
                return Err(GeometryError::NonFinite { index });
            }
            if !p.in_range() {
                return Err(GeometryError::OutOfRange { index });
            }
        }
        if points.first() != points.last() {
            return Err(GeometryError::NotClosed);
        }
        Ok(Self { points })
    }

    pub fn from_coords(coords: &[[f64; 2]]) -> Result<Self, GeometryError> {
        Self::new(coords.iter().copied().map(LonLat::from).collect())
    }

    pub fn points(&self) -> &[LonLat] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() >= 2 && self.points.first() == self.points.last()
    }

    pub fn bounds(&self) -> LonLatBounds {
        // Ring::new guarantees at least one point.
        let mut b = LonLatBounds::from_point(self.points[0]);
        for p in &self.points[1..] {
            b.extend(*p);
        }
        b
    }

    /// Even-odd point-in-ring test in planar lon/lat space.
    ///
    /// Points exactly on an edge may land on either side.
    pub fn contains(&self, p: LonLat) -> bool {
        let mut inside = false;
        for edge in self.points.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            if (a.lat_deg > p.lat_deg) != (b.lat_deg > p.lat_deg) {
                let t = (p.lat_deg - a.lat_deg) / (b.lat_deg - a.lat_deg);
                let x = a.lon_deg + t * (b.lon_deg - a.lon_deg);
                if p.lon_deg < x {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

/// Single-ring polygon (no holes).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    exterior: Ring,
}

impl Polygon {
    pub fn new(exterior: Ring) -> Self {
        Self { exterior }
    }

    pub fn from_coords(coords: &[[f64; 2]]) -> Result<Self, GeometryError> {
        Ring::from_coords(coords).map(Self::new)
    }

    pub fn exterior(&self) -> &Ring {
        &self.exterior
    }

    pub fn bounds(&self) -> LonLatBounds {
        self.exterior.bounds()
    }

    pub fn contains(&self, p: LonLat) -> bool {
        self.bounds().contains(p) && self.exterior.contains(p)
    }
}
