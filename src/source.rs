//! Where documents and images come from.

use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Async byte source for maps, tilesets, images and fonts.
///
/// Paths are `/`-separated and relative to the source root.
pub trait AssetSource {
    /// Fetches the raw bytes stored at `path`.
    fn read_bytes(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>>;

    /// Fetches `path` and interprets it as UTF-8.
    fn read_string(&self, path: &str) -> impl Future<Output = Result<String>> {
        let bytes = self.read_bytes(path);
        let path = path.to_owned();
        async move {
            let bytes = bytes.await?;
            String::from_utf8(bytes).map_err(|err| Error::Decode {
                path,
                message: err.to_string(),
            })
        }
    }
}

/// Reads through `macroquad::file`, i.e. the filesystem on native targets
/// and an HTTP fetch relative to the page on wasm.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<String>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes every requested path with `root`.
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> String {
        match &self.root {
            Some(root) => format!("{}/{}", root.trim_end_matches('/'), path),
            None => path.to_owned(),
        }
    }
}

impl AssetSource for FileSource {
    fn read_bytes(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> {
        let full = self.resolve(path);
        let path = path.to_owned();
        async move {
            macroquad::file::load_file(&full)
                .await
                .map_err(|err| Error::Fetch {
                    path,
                    message: err.to_string(),
                })
        }
    }
}

/// In-memory documents keyed by path. Cloning shares the same table.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: Rc<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, copying the table first if it is shared.
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Rc::make_mut(&mut self.files).insert(path.into(), contents.into());
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

impl AssetSource for MemorySource {
    fn read_bytes(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> {
        let found = self.files.get(path).cloned();
        let path = path.to_owned();
        async move {
            found.ok_or_else(|| Error::Fetch {
                message: "not found".to_owned(),
                path,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::block_on;

    #[test]
    fn memory_source_reads_text() {
        let src = MemorySource::new().with_file("a/b.json", "{}");
        assert!(src.contains("a/b.json"));
        assert_eq!(block_on(src.read_string("a/b.json")).unwrap(), "{}");
    }

    #[test]
    fn memory_source_reports_missing_path() {
        let err = block_on(MemorySource::new().read_bytes("nope.png")).unwrap_err();
        assert!(matches!(err, Error::Fetch { ref path, .. } if path == "nope.png"));
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let src = MemorySource::new().with_file("bin", vec![0xff, 0xfe]);
        let err = block_on(src.read_string("bin")).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn file_source_joins_root() {
        let src = FileSource::with_root("assets/");
        assert_eq!(src.resolve("maps/one.json"), "assets/maps/one.json");
        assert_eq!(FileSource::new().resolve("x"), "x");
    }
}
