//! Fixed source and layer set used to draw boundary regions.

use formats::FeatureCollection;

use crate::layer::LayerSpec;
use crate::source::SourceSpec;
use crate::symbology::{Color, FillPaint, LinePaint};

pub const BOUNDARIES_SOURCE_ID: &str = "boundaries";
pub const BOUNDARIES_FILL_LAYER_ID: &str = "boundaries-layer";
pub const BOUNDARIES_OUTLINE_LAYER_ID: &str = "boundaries-outline";

pub const BOUNDARY_FILL: FillPaint = FillPaint::new(Color::gray(0x88), 0.4);
pub const BOUNDARY_OUTLINE: LinePaint = LinePaint::new(Color::BLACK, 2.0);

pub fn boundary_source(data: FeatureCollection) -> SourceSpec {
    SourceSpec::geojson(data)
}

/// Fill first, outline second, so edges stay visible on top of the fill.
pub fn boundary_layers() -> [LayerSpec; 2] {
    [
        LayerSpec::fill(BOUNDARIES_FILL_LAYER_ID, BOUNDARIES_SOURCE_ID, BOUNDARY_FILL),
        LayerSpec::line(
            BOUNDARIES_OUTLINE_LAYER_ID,
            BOUNDARIES_SOURCE_ID,
            BOUNDARY_OUTLINE,
        ),
    ]
}
