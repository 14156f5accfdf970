//! Profile pictures are persisted as base64-encoded PNG strings.

use std::{io::Cursor, path::Path};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};

pub fn encode_image(picture: &DynamicImage) -> Result<String> {
    let mut bytes = Cursor::new(Vec::new());
    picture
        .write_to(&mut bytes, ImageFormat::Png)
        .context("failed to encode picture as png")?;
    Ok(STANDARD.encode(bytes.into_inner()))
}

pub fn encode_file(path: &Path) -> Result<String> {
    let picture =
        image::open(path).with_context(|| format!("failed to decode '{}'", path.display()))?;
    encode_image(&picture)
}

pub fn decode_image(encoded: &str) -> Result<DynamicImage> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .context("stored picture is not valid base64")?;
    image::load_from_memory(&bytes).context("stored picture is not a decodable image")
}
