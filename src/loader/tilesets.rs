use log::info;

use crate::error::{Error, Result};
use crate::loader::maps::parse_json;
use crate::source::AssetSource;
use crate::task::try_join_all;
use crate::tiled::{MapDocument, TilesetDocument, TilesetReference};

/// One entry of the tile catalog: a tile with its global id and the image
/// path it will be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub id: u32,
    pub image: String,
    pub image_width: u32,
    pub image_height: u32,
}

/// Whether every map references the same tilesets at the same `firstgid` as
/// the first map. Fewer than two maps are trivially consistent.
pub fn check_consistent_order(maps: &[MapDocument]) -> bool {
    first_order_mismatch(maps).is_none()
}

/// Index and tileset source of the first map disagreeing with map 0.
pub(crate) fn first_order_mismatch(maps: &[MapDocument]) -> Option<(usize, String)> {
    let (first, rest) = maps.split_first()?;
    for (i, map) in rest.iter().enumerate() {
        let unknown = map.tilesets.iter().find(|reference| {
            !first
                .tilesets
                .iter()
                .any(|r| r.source == reference.source && r.first_gid == reference.first_gid)
        });
        if let Some(reference) = unknown {
            return Some((i + 1, reference.source.clone()));
        }
        let missing = first
            .tilesets
            .iter()
            .find(|r| !map.tilesets.iter().any(|m| m.source == r.source));
        if let Some(reference) = missing {
            return Some((i + 1, reference.source.clone()));
        }
    }
    None
}

/// File name of `path` without directories or extension.
pub fn basename(path: &str) -> &str {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    file.split('.').next().unwrap_or(file)
}

/// Re-roots an image path at `images_root`, keeping its last two segments
/// (subfolder and file name).
pub fn rebase_image_path(image: &str, images_root: &str) -> String {
    let segments: Vec<&str> = image.split(['/', '\\']).collect();
    let keep = &segments[segments.len().saturating_sub(2)..];
    format!("{}/{}", images_root.trim_end_matches('/'), keep.join("/"))
}

async fn load_tileset<S: AssetSource>(
    source: &S,
    reference: &TilesetReference,
    tileset_folder: &str,
    images_root: &str,
) -> Result<Vec<Tile>> {
    let name = basename(&reference.source).to_owned();
    let path = format!("{}/{}.json", tileset_folder.trim_end_matches('/'), name);

    let doc: TilesetDocument = async {
        let text = source.read_string(&path).await?;
        parse_json(&path, &text)
    }
    .await
    .map_err(|err| Error::Tileset {
        tileset: name.clone(),
        source: Box::new(err),
    })?;

    Ok(doc
        .tiles
        .into_iter()
        .map(|tile| Tile {
            id: tile.id + reference.first_gid,
            image: rebase_image_path(&tile.image, images_root),
            image_width: tile.image_width,
            image_height: tile.image_height,
        })
        .collect())
}

/// Loads every tileset the map references and merges their tiles into one
/// catalog with global ids.
///
/// Tilesets are fetched concurrently. Ids are not deduplicated; overlapping
/// tileset ranges are the map author's problem.
pub async fn resolve_tile_catalog<S: AssetSource>(
    source: &S,
    map: &MapDocument,
    tileset_folder: &str,
    images_root: &str,
) -> Result<Vec<Tile>> {
    let per_tileset = try_join_all(
        map.tilesets
            .iter()
            .map(|reference| load_tileset(source, reference, tileset_folder, images_root)),
    )
    .await?;

    let tiles: Vec<Tile> = per_tileset.into_iter().flatten().collect();
    info!("Tiles loaded ({})", tiles.len());
    Ok(tiles)
}
