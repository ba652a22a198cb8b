use serde::{Serialize, Serializer};

/// Opaque sRGB color, serialized as a `#rrggbb` CSS string.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct FillPaint {
    #[serde(rename = "fill-color")]
    pub color: Color,
    /// 0.0 (transparent) ..= 1.0 (opaque).
    #[serde(rename = "fill-opacity")]
    pub opacity: f64,
}

impl FillPaint {
    pub const fn new(color: Color, opacity: f64) -> Self {
        Self { color, opacity }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LinePaint {
    #[serde(rename = "line-color")]
    pub color: Color,
    /// Stroke width in screen pixels.
    #[serde(rename = "line-width")]
    pub width: f64,
}

impl LinePaint {
    pub const fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}
