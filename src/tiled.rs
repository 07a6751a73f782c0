//! Serde model of the Tiled JSON documents the game consumes.

use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Tiled stores flip/rotation flags in bits 29-31 of a global id.
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// Global tile id as stored in a layer, flip flags included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

impl TileId {
    /// The id with the flip flags cleared.
    #[inline]
    pub fn clean(self) -> u32 {
        self.0 & GID_MASK
    }
}

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}

/// A map document (`*.json` exported by Tiled). Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct MapDocument {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub tilesets: Vec<TilesetReference>,
}

/// A map's pointer to an external tileset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TilesetReference {
    #[serde(rename = "firstgid")]
    pub first_gid: u32,
    pub source: String,
}

/// A node of the layer tree, tagged by Tiled's `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Layer {
    #[serde(rename = "tilelayer")]
    Tiles(TileLayer),
    Group(GroupLayer),
    #[serde(rename = "objectgroup")]
    Objects(ObjectLayer),
    /// Image layers and anything newer; skipped by the classifier.
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileLayer {
    #[serde(default)]
    pub name: String,
    /// Row-major global tile ids, 0 = empty.
    #[serde(default)]
    pub data: Vec<u32>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupLayer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectLayer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<MapObject>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// A placed object. Tile objects are anchored at their bottom-left corner.
#[derive(Debug, Clone, Deserialize)]
pub struct MapObject {
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    /// Clockwise, in degrees.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "default_true")]
    pub visible: bool,
}

/// A `{name, type, value}` custom property.
#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: JsonValue,
}

/// True iff `props` holds `name` declared as `bool` with value `true`.
pub fn bool_property(props: &[Property], name: &str) -> bool {
    props.iter().any(|p| {
        p.name == name && p.kind.as_deref() == Some("bool") && p.value.as_bool() == Some(true)
    })
}

/// A tileset document: an image collection, one image per tile.
#[derive(Debug, Clone, Deserialize)]
pub struct TilesetDocument {
    #[serde(default)]
    pub tiles: Vec<TilesetTile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TilesetTile {
    pub id: u32,
    pub image: String,
    #[serde(default, rename = "imagewidth")]
    pub image_width: u32,
    #[serde(default, rename = "imageheight")]
    pub image_height: u32,
}
