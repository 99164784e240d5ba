#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array2;

use cellomics_core::error::{CellomicsError, Result};
use cellomics_core::frame::CompositeImage;
use cellomics_core::group::TileRef;
use cellomics_core::io::ImageCodec;

pub const PREFIX: &str = "MFGTMP";
pub const PLATE: u64 = 140206180002;

/// Cellomics tile filename for the given coordinates.
pub fn tile_name(plate: u64, well: &str, field: u32, channel: u32) -> String {
    format!("{PREFIX}_{plate}_{well}f{field:02}d{channel}.TIF")
}

/// In-memory codec: tiles are looked up by path, writes are recorded.
#[derive(Default)]
pub struct MemoryCodec {
    pub tiles: HashMap<PathBuf, Array2<u16>>,
    pub written: Mutex<Vec<(PathBuf, CompositeImage)>>,
}

impl MemoryCodec {
    pub fn insert(&mut self, path: impl Into<PathBuf>, tile: Array2<u16>) {
        self.tiles.insert(path.into(), tile);
    }

    /// Add a full 25-field channel where each tile is filled with
    /// `value_of(field)`. Returns the tile paths in field order.
    pub fn add_channel(
        &mut self,
        dir: &Path,
        well: &str,
        channel: u32,
        shape: (usize, usize),
        value_of: impl Fn(u32) -> u16,
    ) -> Vec<PathBuf> {
        (0..25)
            .map(|field| {
                let path = dir.join(tile_name(PLATE, well, field, channel));
                self.insert(path.clone(), Array2::from_elem(shape, value_of(field)));
                path
            })
            .collect()
    }

    pub fn written(&self) -> Vec<(PathBuf, CompositeImage)> {
        self.written.lock().unwrap().clone()
    }
}

impl ImageCodec for MemoryCodec {
    fn read_tile(&self, path: &Path) -> Result<Array2<u16>> {
        self.tiles.get(path).cloned().ok_or_else(|| {
            CellomicsError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no tile at {}", path.display()),
            ))
        })
    }

    fn write_composite(&self, path: &Path, image: &CompositeImage) -> Result<()> {
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), image.clone()));
        Ok(())
    }
}

pub fn tile_refs(paths: &[PathBuf]) -> Vec<TileRef> {
    paths
        .iter()
        .map(|p| TileRef::new(p.clone()).expect("valid tile name"))
        .collect()
}
