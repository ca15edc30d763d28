//! Six-face cubemap images for the skybox

use std::fmt;
use std::path::{Path, PathBuf};

use crate::assets::{AssetError, ImageData};

/// Cube face in Vulkan layer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// +X
    Right,
    /// -X
    Left,
    /// +Y
    Top,
    /// -Y
    Bottom,
    /// +Z
    Front,
    /// -Z
    Back,
}

impl CubeFace {
    /// All faces in layer order +X, -X, +Y, -Y, +Z, -Z
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Right,
        CubeFace::Left,
        CubeFace::Top,
        CubeFace::Bottom,
        CubeFace::Front,
        CubeFace::Back,
    ];

    /// Conventional file stem for this face
    pub fn file_stem(self) -> &'static str {
        match self {
            CubeFace::Right => "right",
            CubeFace::Left => "left",
            CubeFace::Top => "top",
            CubeFace::Bottom => "bottom",
            CubeFace::Front => "front",
            CubeFace::Back => "back",
        }
    }
}

impl fmt::Display for CubeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Six square faces of equal size
#[derive(Debug, Clone)]
pub struct CubemapImages {
    faces: [ImageData; 6],
}

impl CubemapImages {
    /// Load six face files in +X, -X, +Y, -Y, +Z, -Z order
    ///
    /// Stops at the first face that fails, logging which one.
    pub fn load<P: AsRef<Path>>(paths: [P; 6]) -> Result<Self, AssetError> {
        let mut faces = Vec::with_capacity(6);
        for (face, path) in CubeFace::ALL.into_iter().zip(paths.iter()) {
            match ImageData::from_file(path) {
                Ok(image) => faces.push(image),
                Err(source) => {
                    log::error!(
                        "Cubemap texture failed to load at path: {:?} ({})",
                        path.as_ref(),
                        source
                    );
                    return Err(AssetError::CubemapFace {
                        face,
                        source: Box::new(source),
                    });
                }
            }
        }

        let faces: [ImageData; 6] = faces
            .try_into()
            .map_err(|_| AssetError::InvalidCubemap("expected six faces".to_string()))?;
        Self::from_faces(faces)
    }

    /// Load `right`, `left`, `top`, `bottom`, `front`, `back` with `extension` from `dir`
    pub fn from_directory<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Self, AssetError> {
        Self::load(Self::face_paths(dir, extension))
    }

    /// Face file paths under `dir`, in layer order
    pub fn face_paths<P: AsRef<Path>>(dir: P, extension: &str) -> [PathBuf; 6] {
        let dir = dir.as_ref();
        CubeFace::ALL.map(|face| dir.join(format!("{}.{}", face.file_stem(), extension)))
    }

    /// Assemble already decoded faces
    ///
    /// # Errors
    /// [`AssetError::InvalidCubemap`] when a face is not square or sizes differ.
    pub fn from_faces(faces: [ImageData; 6]) -> Result<Self, AssetError> {
        let size = faces[0].width;
        for (face, image) in CubeFace::ALL.into_iter().zip(faces.iter()) {
            if image.width != image.height {
                return Err(AssetError::InvalidCubemap(format!(
                    "face {} is {}x{}, faces must be square",
                    face, image.width, image.height
                )));
            }
            if image.width != size {
                return Err(AssetError::InvalidCubemap(format!(
                    "face {} is {}px, expected {}px",
                    face, image.width, size
                )));
            }
        }

        log::debug!("Assembled {}x{} cubemap", size, size);
        Ok(Self { faces })
    }

    /// Edge length of every face in pixels
    pub fn size(&self) -> u32 {
        self.faces[0].width
    }

    /// Faces in layer order
    pub fn faces(&self) -> &[ImageData; 6] {
        &self.faces
    }

    /// One face
    pub fn face(&self, face: CubeFace) -> &ImageData {
        &self.faces[face as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_faces(size: u32) -> [ImageData; 6] {
        std::array::from_fn(|i| ImageData::solid_color(size, size, [i as u8, 0, 0, 255]))
    }

    #[test]
    fn test_face_paths_order() {
        let paths = CubemapImages::face_paths("sky", "jpg");
        assert_eq!(paths[0], Path::new("sky").join("right.jpg"));
        assert_eq!(paths[3], Path::new("sky").join("bottom.jpg"));
        assert_eq!(paths[5], Path::new("sky").join("back.jpg"));
    }

    #[test]
    fn test_from_faces_keeps_layer_order() {
        let cubemap = CubemapImages::from_faces(solid_faces(4)).unwrap();
        assert_eq!(cubemap.size(), 4);
        assert_eq!(cubemap.face(CubeFace::Top).data[0], 2);
        assert_eq!(cubemap.face(CubeFace::Back).data[0], 5);
    }

    #[test]
    fn test_non_square_face_rejected() {
        let mut faces = solid_faces(4);
        faces[2] = ImageData::solid_color(4, 2, [0, 0, 0, 255]);
        assert!(matches!(
            CubemapImages::from_faces(faces),
            Err(AssetError::InvalidCubemap(_))
        ));
    }

    #[test]
    fn test_mismatched_sizes_rejected() {
        let mut faces = solid_faces(4);
        faces[5] = ImageData::solid_color(8, 8, [0, 0, 0, 255]);
        assert!(matches!(
            CubemapImages::from_faces(faces),
            Err(AssetError::InvalidCubemap(_))
        ));
    }

    #[test]
    fn test_missing_face_names_the_face() {
        let dir = std::env::temp_dir().join(format!("orrery_sky_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for face in [CubeFace::Right, CubeFace::Left] {
            image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]))
                .save(dir.join(format!("{}.png", face.file_stem())))
                .unwrap();
        }

        let result = CubemapImages::from_directory(&dir, "png");
        std::fs::remove_dir_all(&dir).ok();

        match result {
            Err(AssetError::CubemapFace { face, .. }) => assert_eq!(face, CubeFace::Top),
            other => panic!("expected a cubemap face error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_directory() {
        let dir = std::env::temp_dir().join(format!("orrery_sky_full_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for face in CubeFace::ALL {
            image::RgbImage::from_pixel(2, 2, image::Rgb([9, 9, 9]))
                .save(dir.join(format!("{face}.png")))
                .unwrap();
        }

        let result = CubemapImages::from_directory(&dir, "png");
        std::fs::remove_dir_all(&dir).ok();

        let cubemap = result.unwrap();
        assert_eq!(cubemap.size(), 2);
        assert_eq!(cubemap.faces().len(), 6);
    }
}
