//! Asset loading.
//!
//! Shader sources and static images are looked up by name in an [`AssetStore`]. Two stores are
//! provided: [`DirAssets`], which serves files from a directory, and [`MemoryAssets`], which serves
//! bytes registered up front (handy for embedding with `include_str!` or for tests).

use image::RgbaImage;
use std::collections::HashMap;
use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that might happen while loading assets.
#[non_exhaustive]
#[derive(Debug)]
pub enum AssetError {
  /// No asset with that name.
  NotFound(String),
  /// The asset exists but couldn’t be read.
  Io(String, io::Error),
  /// The asset isn’t valid UTF-8 text.
  NotUtf8(String),
  /// The asset isn’t an image the decoder understands.
  Image(String, image::ImageError),
}

impl fmt::Display for AssetError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      AssetError::NotFound(ref name) => write!(f, "asset {} not found", name),
      AssetError::Io(ref name, ref e) => write!(f, "cannot read asset {}: {}", name, e),
      AssetError::NotUtf8(ref name) => write!(f, "asset {} is not UTF-8 text", name),
      AssetError::Image(ref name, ref e) => write!(f, "cannot decode image {}: {}", name, e),
    }
  }
}

impl error::Error for AssetError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      AssetError::Io(_, e) => Some(e),
      AssetError::Image(_, e) => Some(e),
      _ => None,
    }
  }
}

/// Read-only store of named assets.
pub trait AssetStore {
  /// Raw bytes of an asset.
  fn open(&self, name: &str) -> Result<Vec<u8>, AssetError>;

  /// An asset as UTF-8 text.
  fn read_to_string(&self, name: &str) -> Result<String, AssetError> {
    String::from_utf8(self.open(name)?).map_err(|_| AssetError::NotUtf8(name.to_owned()))
  }

  /// Decode an asset as an RGBA8 image, top row first.
  fn load_image(&self, name: &str) -> Result<RgbaImage, AssetError> {
    let bytes = self.open(name)?;
    let img =
      image::load_from_memory(&bytes).map_err(|e| AssetError::Image(name.to_owned(), e))?;

    Ok(img.to_rgba8())
  }
}

/// Assets stored as files under a root directory.
#[derive(Clone, Debug)]
pub struct DirAssets {
  root: PathBuf,
}

impl DirAssets {
  /// Serve assets from `root`; names are paths relative to it.
  pub fn new<P>(root: P) -> Self
  where
    P: Into<PathBuf>,
  {
    DirAssets { root: root.into() }
  }

  /// Root directory.
  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl AssetStore for DirAssets {
  fn open(&self, name: &str) -> Result<Vec<u8>, AssetError> {
    let path = self.root.join(name);

    fs::read(&path).map_err(|e| match e.kind() {
      io::ErrorKind::NotFound => AssetError::NotFound(name.to_owned()),
      _ => AssetError::Io(name.to_owned(), e),
    })
  }
}

/// Assets registered in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssets {
  assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
  /// An empty store.
  pub fn new() -> Self {
    MemoryAssets::default()
  }

  /// Register an asset, replacing any previous one with the same name.
  pub fn insert<N, D>(&mut self, name: N, data: D) -> &mut Self
  where
    N: Into<String>,
    D: Into<Vec<u8>>,
  {
    self.assets.insert(name.into(), data.into());
    self
  }

  /// Builder flavour of [`MemoryAssets::insert`].
  pub fn with<N, D>(mut self, name: N, data: D) -> Self
  where
    N: Into<String>,
    D: Into<Vec<u8>>,
  {
    self.insert(name, data);
    self
  }
}

impl AssetStore for MemoryAssets {
  fn open(&self, name: &str) -> Result<Vec<u8>, AssetError> {
    self
      .assets
      .get(name)
      .cloned()
      .ok_or_else(|| AssetError::NotFound(name.to_owned()))
  }
}
