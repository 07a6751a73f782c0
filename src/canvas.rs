//! Drawing seam between game logic and the graphics backend.

use macroquad::color::Color;
use macroquad::math::{Rect, Vec2};
use macroquad::texture::Image;

/// Per-draw options for [`Canvas::image`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageParams {
    pub opacity: f32,
    /// Clockwise, in radians.
    pub rotation: f32,
    /// Rotation origin in screen space; the centre of `dest` when `None`.
    pub pivot: Option<Vec2>,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            rotation: 0.0,
            pivot: None,
        }
    }
}

/// Font used for a [`Canvas::text`] call: asset id plus TTF bytes.
pub type FontRef<'a> = (&'a str, &'a [u8]);

/// Immediate-mode 2D drawing target in screen pixels.
pub trait Canvas {
    /// Called once before a frame is drawn with the asset table's generation.
    fn begin_frame(&mut self, _asset_generation: u64) {}

    fn size(&self) -> Vec2;

    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color);

    /// Draws `image` (registered under `id`) stretched into `dest`.
    fn image(&mut self, id: &str, image: &Image, dest: Rect, params: ImageParams);

    /// Draws text with its baseline starting at `pos`.
    fn text(&mut self, text: &str, pos: Vec2, size: f32, color: Color, font: Option<FontRef<'_>>);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::source::MemorySource;
    use macroquad::color::WHITE;

    /// A 2x2 white PNG.
    pub fn png_bytes() -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("px.png");
        Image::gen_image_color(2, 2, WHITE).export_png(path.to_str().unwrap());
        std::fs::read(&path).unwrap()
    }

    /// Source serving [`png_bytes`] under each of `paths`.
    pub fn png_source(paths: &str) -> MemorySource {
        let png = png_bytes();
        paths
            .split(',')
            .fold(MemorySource::new(), |src, path| src.with_file(path.trim(), png.clone()))
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum DrawOp {
        Clear,
        Rect(Rect),
        Line,
        Image { id: String, dest: Rect, params: ImageParams },
        Text(String),
    }

    /// Canvas that records what was drawn.
    pub struct RecordingCanvas {
        pub size: Vec2,
        pub ops: Vec<DrawOp>,
    }

    impl RecordingCanvas {
        pub fn new(w: f32, h: f32) -> Self {
            Self {
                size: Vec2::new(w, h),
                ops: Vec::new(),
            }
        }

        pub fn images(&self) -> Vec<(&str, Rect, ImageParams)> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Image { id, dest, params } => Some((id.as_str(), *dest, *params)),
                    _ => None,
                })
                .collect()
        }

        pub fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Text(t) => Some(t.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Canvas for RecordingCanvas {
        fn size(&self) -> Vec2 {
            self.size
        }
        fn clear(&mut self, _color: Color) {
            self.ops.push(DrawOp::Clear);
        }
        fn fill_rect(&mut self, rect: Rect, _color: Color) {
            self.ops.push(DrawOp::Rect(rect));
        }
        fn line(&mut self, _from: Vec2, _to: Vec2, _thickness: f32, _color: Color) {
            self.ops.push(DrawOp::Line);
        }
        fn image(&mut self, id: &str, _image: &Image, dest: Rect, params: ImageParams) {
            self.ops.push(DrawOp::Image {
                id: id.to_owned(),
                dest,
                params,
            });
        }
        fn text(
            &mut self,
            text: &str,
            _pos: Vec2,
            _size: f32,
            _color: Color,
            _font: Option<FontRef<'_>>,
        ) {
            self.ops.push(DrawOp::Text(text.to_owned()));
        }
    }
}
