//! # Costumes
//!
//! Named images. Re-adding a name replaces the pixels in place, so every
//! sprite wearing that costume switches on the next draw. No content
//! hashing: two identical images under two names are two costumes.
//!
//! Decoding happens on the caller's thread; only decoded pixels travel
//! through the command queue.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use crate::error::{DecodeError, DecodeResult};

/// Index into the costume table. Stable for the life of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CostumeId(u32);

/// A named drawable.
#[derive(Clone, Debug)]
pub struct Costume {
    name: String,
    image: Arc<RgbaImage>,
}

impl Costume {
    /// Costume name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pixels.
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Costumes by ID and by name. Owned by the tick thread.
#[derive(Debug, Default)]
pub struct CostumeTable {
    costumes: Vec<Costume>,
    by_name: HashMap<String, CostumeId>,
}

impl CostumeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a costume, or replaces the pixels of an existing one with the
    /// same name.
    pub fn insert(&mut self, name: String, image: Arc<RgbaImage>) -> CostumeId {
        if let Some(&id) = self.by_name.get(&name) {
            self.costumes[id.0 as usize].image = image;
            return id;
        }
        let id = CostumeId(self.costumes.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.costumes.push(Costume { name, image });
        id
    }

    /// Looks up a costume ID by name.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<CostumeId> {
        self.by_name.get(name).copied()
    }

    /// Costume for an ID.
    #[must_use]
    pub fn get(&self, id: CostumeId) -> Option<&Costume> {
        self.costumes.get(id.0 as usize)
    }

    /// Number of costumes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.costumes.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.costumes.is_empty()
    }
}

/// Decodes an in-memory PNG.
///
/// # Errors
///
/// Returns [`DecodeError::Image`] if the bytes are not a valid PNG.
pub fn decode_png(bytes: &[u8]) -> DecodeResult<RgbaImage> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    Ok(decoded.into_rgba8())
}

/// Reads and decodes a PNG file.
///
/// # Errors
///
/// Returns [`DecodeError::Io`] if the file can't be read and
/// [`DecodeError::Image`] if it isn't a valid PNG.
pub fn load_png(path: &Path) -> DecodeResult<RgbaImage> {
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_png(&bytes)
}

/// Encodes pixels as PNG and writes them to `path`.
///
/// # Errors
///
/// Returns [`DecodeError::Image`] if encoding fails and
/// [`DecodeError::Io`] if the file can't be written.
pub fn save_png(image: &RgbaImage, path: &Path) -> DecodeResult<()> {
    let mut encoded = Cursor::new(Vec::new());
    image.write_to(&mut encoded, ImageFormat::Png)?;
    std::fs::write(path, encoded.into_inner()).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })
}
