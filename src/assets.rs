//! Batch asset loading with typed lookup.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::{debug, info};
use macroquad::texture::Image;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::source::AssetSource;
use crate::task::try_join_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    /// UTF-8 text.
    Data,
    /// Raw TTF bytes.
    Font,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Image => write!(f, "image"),
            AssetKind::Data => write!(f, "data"),
            AssetKind::Font => write!(f, "font"),
        }
    }
}

/// An `(id, path, kind)` triple queued for loading.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetItem {
    pub id: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
}

impl AssetItem {
    pub fn new(id: impl Into<String>, path: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            kind,
        }
    }

    pub fn image(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, path, AssetKind::Image)
    }
}

/// A loaded asset.
#[derive(Clone)]
pub enum Asset {
    /// Decoded RGBA pixels. Textures are created by the renderer.
    Image(Rc<Image>),
    Data(Rc<str>),
    Font(Rc<[u8]>),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Image(_) => AssetKind::Image,
            Asset::Data(_) => AssetKind::Data,
            Asset::Font(_) => AssetKind::Font,
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Image(img) => write!(f, "Image({}x{})", img.width(), img.height()),
            Asset::Data(text) => write!(f, "Data({} bytes)", text.len()),
            Asset::Font(bytes) => write!(f, "Font({} bytes)", bytes.len()),
        }
    }
}

/// Decodes a PNG/JPEG/etc. byte buffer.
pub fn decode_image(path: &str, bytes: &[u8]) -> Result<Image> {
    Image::from_file_with_format(bytes, None).map_err(|err| Error::Decode {
        path: path.to_owned(),
        message: err.to_string(),
    })
}

async fn load_item<S: AssetSource>(source: &S, item: &AssetItem) -> Result<(String, Asset)> {
    let asset = match item.kind {
        AssetKind::Image => {
            let bytes = source.read_bytes(&item.path).await?;
            Asset::Image(Rc::new(decode_image(&item.path, &bytes)?))
        }
        AssetKind::Data => Asset::Data(source.read_string(&item.path).await?.into()),
        AssetKind::Font => {
            let bytes = source.read_bytes(&item.path).await?;
            if bytes.is_empty() {
                return Err(Error::Decode {
                    path: item.path.clone(),
                    message: "empty font file".to_owned(),
                });
            }
            Asset::Font(bytes.into())
        }
    };
    Ok((item.id.clone(), asset))
}

/// Holds the pending load set and the table of loaded assets.
///
/// `load` swaps the whole table on success; a failed load leaves the
/// previous table untouched.
#[derive(Debug, Default)]
pub struct AssetLoader {
    pending: Vec<AssetItem>,
    assets: HashMap<String, Asset>,
    generation: u64,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pending load set.
    pub fn set_items_to_load(&mut self, items: impl IntoIterator<Item = AssetItem>) {
        self.pending = items.into_iter().collect();
    }

    pub fn pending(&self) -> &[AssetItem] {
        &self.pending
    }

    /// Loads every pending item concurrently, failing on the first error.
    pub async fn load<S: AssetSource>(&mut self, source: &S) -> Result<()> {
        let total = self.pending.len();
        let done = Cell::new(0usize);
        let done = &done;
        let loaded = try_join_all(self.pending.iter().map(|item| async move {
            let out = load_item(source, item).await;
            if out.is_ok() {
                done.set(done.get() + 1);
                debug!("{} % loaded ({})", 100 * done.get() / total, item.path);
            }
            out
        }))
        .await?;

        self.assets = loaded.into_iter().collect();
        self.generation += 1;
        info!("All assets loaded ({})", total);
        Ok(())
    }

    /// Takes over another loader's table, counting it as a fresh load.
    pub fn adopt(&mut self, other: AssetLoader) {
        self.pending = other.pending;
        self.assets = other.assets;
        self.generation += 1;
    }

    /// Strict lookup: fails when the id is missing or has another kind.
    pub fn get(&self, kind: AssetKind, id: &str) -> Result<&Asset> {
        self.assets
            .get(id)
            .filter(|asset| asset.kind() == kind)
            .ok_or_else(|| Error::MissingAsset {
                kind,
                id: id.to_owned(),
            })
    }

    pub fn image(&self, id: &str) -> Result<&Rc<Image>> {
        match self.assets.get(id) {
            Some(Asset::Image(img)) => Ok(img),
            _ => Err(Error::MissingAsset {
                kind: AssetKind::Image,
                id: id.to_owned(),
            }),
        }
    }

    pub fn has(&self, kind: AssetKind, id: &str) -> bool {
        self.assets.get(id).is_some_and(|asset| asset.kind() == kind)
    }

    /// Ids of every loaded asset of `kind`, in no particular order.
    pub fn ids(&self, kind: AssetKind) -> impl Iterator<Item = &str> + '_ {
        self.assets
            .iter()
            .filter(move |(_, asset)| asset.kind() == kind)
            .map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Bumped on every successful `load`; lets renderers drop cached textures.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
