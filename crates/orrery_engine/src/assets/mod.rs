//! Resource loaders
//!
//! Images (planet texture, skybox faces) and OBJ meshes. Every loader returns an
//! [`AssetError`]; startup treats any of them as fatal.

pub mod cubemap;
pub mod image_loader;
pub mod obj_loader;

pub use cubemap::{CubeFace, CubemapImages};
pub use image_loader::{ImageData, PixelFormat};
pub use obj_loader::{ObjError, ObjLoader};

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// File missing or undecodable
    #[error("Load failed: {0}")]
    LoadFailed(String),

    /// Image with a channel count other than 1, 3 or 4
    #[error("Unsupported image format: {channels} channels")]
    UnsupportedFormat {
        /// Channel count of the source image
        channels: u8,
    },

    /// One skybox face failed to load
    #[error("Cubemap face {face} failed: {source}")]
    CubemapFace {
        /// Which face
        face: CubeFace,
        /// Underlying failure
        #[source]
        source: Box<AssetError>,
    },

    /// Faces that cannot form a cube texture
    #[error("Invalid cubemap: {0}")]
    InvalidCubemap(String),

    /// OBJ parse failure
    #[error("OBJ error: {0}")]
    Obj(#[from] ObjError),
}
