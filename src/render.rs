//! [`Canvas`] backed by macroquad's immediate-mode drawing.

use std::collections::HashMap;

use log::warn;
use macroquad::color::Color;
use macroquad::math::{vec2, Rect, Vec2};
use macroquad::shapes::{draw_line, draw_rectangle};
use macroquad::text::{draw_text, draw_text_ex, load_ttf_font_from_bytes, Font, TextParams};
use macroquad::texture::{draw_texture_ex, DrawTextureParams, FilterMode, Image, Texture2D};
use macroquad::window::{clear_background, screen_height, screen_width};

use crate::canvas::{Canvas, FontRef, ImageParams};
use crate::error::{Error, Result};

/// Uploads images to the GPU on first draw and keeps them until the asset
/// table changes generation.
pub struct MacroquadCanvas {
    generation: u64,
    textures: HashMap<String, Texture2D>,
    /// `None` remembers fonts that failed to parse.
    fonts: HashMap<String, Option<Font>>,
}

impl MacroquadCanvas {
    /// Must be called from inside the macroquad main loop.
    pub fn new() -> Result<Self> {
        let (w, h) = (screen_width(), screen_height());
        if !(w > 0.0 && h > 0.0) {
            return Err(Error::RenderContext(format!("window reports a {}x{} surface", w, h)));
        }
        Ok(Self {
            generation: 0,
            textures: HashMap::new(),
            fonts: HashMap::new(),
        })
    }

    fn texture(&mut self, id: &str, image: &Image) -> &Texture2D {
        self.textures.entry(id.to_owned()).or_insert_with(|| {
            let tex = Texture2D::from_image(image);
            tex.set_filter(FilterMode::Nearest);
            tex
        })
    }

    fn font(&mut self, id: &str, bytes: &[u8]) -> Option<&Font> {
        self.fonts
            .entry(id.to_owned())
            .or_insert_with(|| match load_ttf_font_from_bytes(bytes) {
                Ok(font) => Some(font),
                Err(err) => {
                    warn!("Font '{}' could not be loaded: {}", id, err);
                    None
                }
            })
            .as_ref()
    }
}

impl Canvas for MacroquadCanvas {
    fn begin_frame(&mut self, asset_generation: u64) {
        if asset_generation != self.generation {
            self.textures.clear();
            self.fonts.clear();
            self.generation = asset_generation;
        }
    }

    fn size(&self) -> Vec2 {
        vec2(screen_width(), screen_height())
    }

    fn clear(&mut self, color: Color) {
        clear_background(color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, color);
    }

    fn line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color) {
        draw_line(from.x, from.y, to.x, to.y, thickness, color);
    }

    fn image(&mut self, id: &str, image: &Image, dest: Rect, params: ImageParams) {
        let tint = Color::new(1.0, 1.0, 1.0, params.opacity);
        let texture = self.texture(id, image);
        draw_texture_ex(
            texture,
            dest.x,
            dest.y,
            tint,
            DrawTextureParams {
                dest_size: Some(vec2(dest.w, dest.h)),
                rotation: params.rotation,
                pivot: params.pivot,
                ..Default::default()
            },
        );
    }

    fn text(&mut self, text: &str, pos: Vec2, size: f32, color: Color, font: Option<FontRef<'_>>) {
        let loaded = font.and_then(|(id, bytes)| self.font(id, bytes));
        match loaded {
            Some(font) => {
                draw_text_ex(
                    text,
                    pos.x,
                    pos.y,
                    TextParams {
                        font: Some(font),
                        font_size: size as u16,
                        color,
                        ..Default::default()
                    },
                );
            }
            None => {
                draw_text(text, pos.x, pos.y, size, color);
            }
        }
    }
}
