//! Decoded textures for image result cards and saving them to disk.

use std::{collections::HashMap, fs, path::PathBuf};

use anyhow::{Context, Result};
use client_core::{CardBody, ResultCard};
use eframe::egui;
use egui::TextureHandle;

pub struct DecodedImage {
    pub rgba: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Bytes exactly as received, used for downloads.
    pub png: Vec<u8>,
}

pub enum CardImage {
    Ready {
        texture: TextureHandle,
        size: egui::Vec2,
        png: Vec<u8>,
    },
    Broken(String),
}

/// `None` for cards that are not images.
pub fn decode_card_image(body: &CardBody) -> Option<Result<DecodedImage, String>> {
    let png = match body.decode_image()? {
        Ok(bytes) => bytes,
        Err(err) => return Some(Err(format!("invalid base64 image data: {err}"))),
    };
    let decoded = match image::load_from_memory(&png) {
        Ok(decoded) => decoded,
        Err(err) => return Some(Err(format!("unable to decode image: {err}"))),
    };
    let rgba = decoded.to_rgba8();
    Some(Ok(DecodedImage {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
        rgba: rgba.into_raw(),
        png,
    }))
}

/// Textures keyed by result key; cleared whenever the results are replaced.
#[derive(Default)]
pub struct ImageCache {
    entries: HashMap<String, CardImage>,
}

impl ImageCache {
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get_or_load(&mut self, ctx: &egui::Context, card: &ResultCard) -> Option<&CardImage> {
        if !self.entries.contains_key(&card.key) {
            let image = match decode_card_image(&card.body)? {
                Ok(decoded) => {
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(
                        [decoded.width, decoded.height],
                        &decoded.rgba,
                    );
                    let texture = ctx.load_texture(
                        format!("result-image:{}", card.key),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    CardImage::Ready {
                        texture,
                        size: egui::vec2(decoded.width as f32, decoded.height as f32),
                        png: decoded.png,
                    }
                }
                Err(reason) => {
                    tracing::warn!(key = %card.key, "result image unavailable: {reason}");
                    CardImage::Broken(reason)
                }
            };
            self.entries.insert(card.key.clone(), image);
        }
        self.entries.get(&card.key)
    }
}

/// Asks where to save, starting in the downloads folder. `None` when the
/// dialog was cancelled.
pub fn save_image_as(png: &[u8], download_name: &str) -> Option<Result<PathBuf>> {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Download Image")
        .set_file_name(download_name)
        .add_filter("PNG image", &["png"]);
    if let Some(dir) = dirs::download_dir() {
        dialog = dialog.set_directory(dir);
    }
    let path = dialog.save_file()?;
    Some(
        fs::write(&path, png)
            .with_context(|| format!("failed to save image to {}", path.display()))
            .map(|()| path),
    )
}
