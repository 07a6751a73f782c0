use std::{error, fmt};

use crate::assets::AssetKind;

/// Error type for map loading, asset loading and level sequencing.
#[derive(Debug)]
pub enum Error {
    /// A document or file could not be fetched from the asset source.
    Fetch {
        /// Path that was requested.
        path: String,
        /// Message reported by the source.
        message: String,
    },
    /// A fetched document was not valid JSON for its expected shape.
    Json {
        /// Path of the offending document.
        path: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },
    /// An image or font could not be decoded.
    Decode {
        /// Path of the asset.
        path: String,
        /// Message reported by the decoder.
        message: String,
    },
    /// Loading a tileset referenced by a map failed.
    Tileset {
        /// Tileset name (basename of the map's `source` entry).
        tileset: String,
        /// What went wrong while loading it.
        source: Box<Error>,
    },
    /// No map paths were given while empty input is configured as an error.
    NoMaps,
    /// A map references its tilesets in a different order than the first map.
    InconsistentTilesets {
        /// Index of the mismatching map in the input list.
        map: usize,
        /// Tileset source that is missing or carries another `firstgid`.
        tileset: String,
    },
    /// Requested level index does not exist.
    LevelIndex {
        /// Requested index.
        index: usize,
        /// Number of available levels.
        count: usize,
    },
    /// Strict asset lookup found nothing with that id and kind.
    MissingAsset {
        /// Requested asset kind.
        kind: AssetKind,
        /// Requested asset id.
        id: String,
    },
    /// The rendering context is unavailable. Fatal at startup.
    RenderContext(String),
}

impl Error {
    /// Whether this error belongs to the document/asset load family.
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            Error::Fetch { .. }
                | Error::Json { .. }
                | Error::Decode { .. }
                | Error::Tileset { .. }
                | Error::NoMaps
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Fetch { path, message } => write!(f, "Could not load {}: {}", path, message),
            Error::Json { path, source } => write!(f, "Failed to parse JSON {}: {}", path, source),
            Error::Decode { path, message } => write!(f, "Could not decode {}: {}", path, message),
            Error::Tileset { tileset, source } => {
                write!(f, "Error while loading tileset '{}': {}", tileset, source)
            }
            Error::NoMaps => write!(f, "No maps loaded"),
            Error::InconsistentTilesets { map, tileset } => write!(
                f,
                "Non matching tileset order: map {} disagrees on '{}'",
                map, tileset
            ),
            Error::LevelIndex { index, count } => {
                write!(f, "Could not load level {} ({} levels available)", index, count)
            }
            Error::MissingAsset { kind, id } => {
                write!(f, "Couldn't find asset with ID {} and type {}", id, kind)
            }
            Error::RenderContext(msg) => write!(f, "Rendering context unavailable: {}", msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Json { source, .. } => Some(source),
            Error::Tileset { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
