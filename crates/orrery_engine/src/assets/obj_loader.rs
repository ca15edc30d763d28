//! OBJ file loader for 3D models

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::render::mesh::{Mesh, Vertex};

/// OBJ loading errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed number or index
    #[error("Parse error on line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What could not be parsed
        message: String,
    },
    /// Structurally invalid file
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Minimal Wavefront OBJ reader (`v`, `vt`, `vn`, `f`)
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and return a mesh
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mesh = Self::parse(BufReader::new(file))?;
        log::info!(
            "Loaded OBJ {:?}: {} vertices, {} indices",
            path,
            mesh.vertices.len(),
            mesh.indices.len()
        );
        Ok(mesh)
    }

    /// Parse OBJ text from any buffered reader
    ///
    /// Polygons are fan-triangulated. Missing texture coordinates default to
    /// (0, 0) and missing normals to +Y.
    pub fn parse<R: BufRead>(reader: R) -> Result<Mesh, ObjError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = number + 1;
            let mut parts = line.split_whitespace();

            match parts.next() {
                Some("v") => positions.push(parse_floats::<3>(parts, line_no, "vertex")?),
                Some("vn") => normals.push(parse_floats::<3>(parts, line_no, "normal")?),
                Some("vt") => tex_coords.push(parse_floats::<2>(parts, line_no, "tex coord")?),
                Some("f") => {
                    let mut face_indices = Vec::new();
                    for corner in parts {
                        let mut refs = corner.split('/');
                        let pos_idx = resolve_index(refs.next(), positions.len(), line_no)?
                            .ok_or_else(|| parse_error(line_no, "face corner without position"))?;
                        let tex_idx = resolve_index(refs.next(), tex_coords.len(), line_no)?;
                        let normal_idx = resolve_index(refs.next(), normals.len(), line_no)?;

                        vertices.push(Vertex::new(
                            positions[pos_idx],
                            normal_idx.map_or([0.0, 1.0, 0.0], |i| normals[i]),
                            tex_idx.map_or([0.0, 0.0], |i| tex_coords[i]),
                        ));
                        face_indices.push((vertices.len() - 1) as u32);
                    }

                    if face_indices.len() < 3 {
                        return Err(parse_error(line_no, "face with fewer than 3 corners"));
                    }
                    for i in 1..face_indices.len() - 1 {
                        indices.extend_from_slice(&[face_indices[0], face_indices[i], face_indices[i + 1]]);
                    }
                }
                // Comments, groups, materials, smoothing
                _ => {}
            }
        }

        if vertices.is_empty() {
            return Err(ObjError::InvalidFormat("No faces found in OBJ file".to_string()));
        }

        Ok(Mesh::new(vertices, indices))
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> ObjError {
    ObjError::ParseError {
        line,
        message: message.into(),
    }
}

fn parse_floats<'a, const N: usize>(
    mut parts: impl Iterator<Item = &'a str>,
    line: usize,
    what: &str,
) -> Result<[f32; N], ObjError> {
    let mut values = [0.0; N];
    for value in &mut values {
        let token = parts
            .next()
            .ok_or_else(|| parse_error(line, format!("{what} needs {N} components")))?;
        *value = token
            .parse()
            .map_err(|_| parse_error(line, format!("invalid {what} component '{token}'")))?;
    }
    Ok(values)
}

/// Resolve a 1-based (or negative, relative) OBJ reference to a 0-based index
fn resolve_index(token: Option<&str>, count: usize, line: usize) -> Result<Option<usize>, ObjError> {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(None),
    };
    let raw: i64 = token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index '{token}'")))?;

    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => count.checked_sub(r.unsigned_abs() as usize),
    };

    match resolved {
        Some(index) if index < count => Ok(Some(index)),
        _ => Err(ObjError::InvalidFormat(format!(
            "index {raw} out of bounds on line {line}"
        ))),
    }
}
