use catalog::{BoundaryProvider, validate_unique_ids};
use engine::{LayerEventKind, Listener, MapHandle};
use formats::feature_collection;
use foundation::Boundary;
use layers::{BOUNDARIES_FILL_LAYER_ID, BOUNDARIES_SOURCE_ID, boundary_layers, boundary_source};

use crate::widget::WidgetError;

/// Installs the boundary source, its two layers and the fill-layer listeners.
///
/// Must run at most once per map: the source and layer ids are fixed, so a
/// second call conflicts with the first.
pub fn install_boundaries<H, P>(handle: &mut H, provider: &P) -> Result<Vec<Boundary>, WidgetError>
where
    H: MapHandle,
    P: BoundaryProvider + ?Sized,
{
    let boundaries = provider.list_boundaries()?;
    validate_unique_ids(&boundaries)?;

    let data = feature_collection(&boundaries);
    tracing::debug!(features = data.len(), "adding boundary source and layers");
    handle.add_source(BOUNDARIES_SOURCE_ID, &boundary_source(data))?;
    for layer in boundary_layers() {
        handle.add_layer(&layer)?;
    }

    for kind in LayerEventKind::ALL {
        handle.listen(Listener::layer(kind, BOUNDARIES_FILL_LAYER_ID))?;
    }

    Ok(boundaries)
}
