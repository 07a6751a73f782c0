use log::info;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::loader::tilesets::first_order_mismatch;
use crate::source::AssetSource;
use crate::task::try_join_all;
use crate::tiled::MapDocument;

/// What `load_maps` does with an empty path list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyMaps {
    /// Fail with [`Error::NoMaps`].
    #[default]
    Error,
    /// Return an empty list.
    Allow,
}

/// Parses one JSON document, tagging failures with `path`.
pub(crate) fn parse_json<T: for<'de> Deserialize<'de>>(path: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|source| Error::Json {
        path: path.to_owned(),
        source,
    })
}

async fn load_map<S: AssetSource>(source: &S, path: &str) -> Result<MapDocument> {
    let text = source.read_string(path).await?;
    parse_json(path, &text)
}

/// Fetches and parses every map concurrently, returning them in input order.
///
/// Also verifies that all maps agree on tileset order, since tile ids are
/// shared across levels.
pub async fn load_maps<S: AssetSource>(
    source: &S,
    paths: &[String],
    empty: EmptyMaps,
) -> Result<Vec<MapDocument>> {
    if paths.is_empty() {
        return match empty {
            EmptyMaps::Error => Err(Error::NoMaps),
            EmptyMaps::Allow => Ok(Vec::new()),
        };
    }

    let maps = try_join_all(paths.iter().map(|path| load_map(source, path))).await?;
    info!("Maps loaded ({})", maps.len());

    if let Some((map, tileset)) = first_order_mismatch(&maps) {
        return Err(Error::InconsistentTilesets { map, tileset });
    }
    Ok(maps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::task::block_on;

    const A: &str = r#"{"width":1,"height":1,"layers":[],
        "tilesets":[{"firstgid":1,"source":"roads.json"},{"firstgid":40,"source":"tiles.json"}]}"#;
    const B: &str = r#"{"width":2,"height":2,"layers":[],
        "tilesets":[{"firstgid":1,"source":"roads.json"},{"firstgid":40,"source":"tiles.json"}]}"#;
    const SHIFTED: &str = r#"{"width":1,"height":1,"layers":[],
        "tilesets":[{"firstgid":1,"source":"roads.json"},{"firstgid":41,"source":"tiles.json"}]}"#;

    fn paths(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn loads_in_input_order() {
        let src = MemorySource::new().with_file("a.json", A).with_file("b.json", B);
        let paths = paths(&["b.json", "a.json"]);
        let maps = block_on(load_maps(&src, &paths, EmptyMaps::Error)).unwrap();
        assert_eq!(maps[0].width, 2);
        assert_eq!(maps[1].width, 1);
    }

    #[test]
    fn empty_input_follows_policy() {
        let src = MemorySource::new();
        let err = block_on(load_maps(&src, &[], EmptyMaps::Error)).unwrap_err();
        assert!(matches!(err, Error::NoMaps));
        let maps = block_on(load_maps(&src, &[], EmptyMaps::Allow)).unwrap();
        assert!(maps.is_empty());
    }

    #[test]
    fn rejects_mismatching_tileset_order() {
        let src = MemorySource::new().with_file("a.json", A).with_file("s.json", SHIFTED);
        let paths = paths(&["a.json", "s.json"]);
        let err = block_on(load_maps(&src, &paths, EmptyMaps::Error)).unwrap_err();
        assert!(matches!(
            err,
            Error::InconsistentTilesets { map: 1, ref tileset } if tileset == "tiles.json"
        ));
    }

    #[test]
    fn propagates_parse_errors_with_path() {
        let src = MemorySource::new().with_file("bad.json", "{ not json");
        let err = block_on(load_maps(&src, &paths(&["bad.json"]), EmptyMaps::Error)).unwrap_err();
        assert!(matches!(err, Error::Json { ref path, .. } if path == "bad.json"));
        assert!(err.is_load());
    }

    #[test]
    fn propagates_missing_file() {
        let src = MemorySource::new().with_file("a.json", A);
        let paths = paths(&["a.json", "gone.json"]);
        let err = block_on(load_maps(&src, &paths, EmptyMaps::Error)).unwrap_err();
        assert!(matches!(err, Error::Fetch { ref path, .. } if path == "gone.json"));
    }
}
