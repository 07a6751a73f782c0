//! Layer tree traversal and property-driven classification.

use log::warn;

use crate::tiled::{bool_property, Layer, MapDocument, ObjectLayer, Property, TileLayer};

/// Flags derived from a layer's custom properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerFlags {
    pub interactive: bool,
    pub hint: bool,
    pub renderable: bool,
}

/// Reads the `interactive`, `hintLayer` and `renderable` bool properties.
pub fn classify(properties: &[Property]) -> LayerFlags {
    LayerFlags {
        interactive: bool_property(properties, "interactive"),
        hint: bool_property(properties, "hintLayer"),
        renderable: bool_property(properties, "renderable"),
    }
}

/// Which tile layers `extract_layers` keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerFilter {
    All,
    RenderableOnly,
}

/// Leaf layers found in a map, in depth-first pre-order (draw order).
#[derive(Debug, Default)]
pub struct ExtractedLayers<'m> {
    pub tiles: Vec<(&'m TileLayer, LayerFlags)>,
    pub objects: Vec<(&'m ObjectLayer, LayerFlags)>,
}

/// Walks the layer tree, descending into groups. Object layers are always
/// collected; the filter only applies to tile layers.
pub fn extract_layers(map: &MapDocument, filter: LayerFilter) -> ExtractedLayers<'_> {
    let mut out = ExtractedLayers::default();
    visit(&map.layers, filter, &mut out);
    out
}

/// Tile layers only, see [`extract_layers`].
pub fn extract_tile_layers(map: &MapDocument, filter: LayerFilter) -> Vec<&TileLayer> {
    extract_layers(map, filter)
        .tiles
        .into_iter()
        .map(|(layer, _)| layer)
        .collect()
}

fn visit<'m>(layers: &'m [Layer], filter: LayerFilter, out: &mut ExtractedLayers<'m>) {
    for layer in layers {
        match layer {
            Layer::Tiles(tiles) => {
                let flags = classify(&tiles.properties);
                if filter == LayerFilter::All || flags.renderable {
                    out.tiles.push((tiles, flags));
                }
            }
            Layer::Group(group) => visit(&group.layers, filter, out),
            Layer::Objects(objects) => out.objects.push((objects, classify(&objects.properties))),
            Layer::Unsupported => warn!("Skipping unsupported layer type"),
        }
    }
}
