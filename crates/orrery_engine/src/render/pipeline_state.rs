//! Explicit per-draw pipeline state
//!
//! Every draw names its shader program, depth comparison, blending and texture
//! binding. Nothing carries over from one draw to the next, so a pass can never
//! inherit state left behind by the previous one.

use crate::render::backend::TextureId;

/// Shader program selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderProgram {
    /// Phong lighting with an optional diffuse texture
    Lit,
    /// Unlit colored points
    Particle,
    /// Cubemap background at the far plane
    Skybox,
}

impl ShaderProgram {
    /// All programs
    pub const ALL: [ShaderProgram; 3] = [ShaderProgram::Lit, ShaderProgram::Particle, ShaderProgram::Skybox];

    /// Shader file stem, `lit` for `lit.vert.spv`/`lit.frag.spv`
    pub fn file_stem(self) -> &'static str {
        match self {
            ShaderProgram::Lit => "lit",
            ShaderProgram::Particle => "particle",
            ShaderProgram::Skybox => "skybox",
        }
    }
}

/// Depth comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthCompare {
    /// Pass when closer; the default for geometry
    #[default]
    Less,
    /// Pass when closer or equal; lets far-plane geometry through after a clear
    LessOrEqual,
}

/// Color blending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Replace the destination
    #[default]
    Opaque,
    /// `src * a + dst * (1 - a)`
    AlphaBlend,
}

/// Texture bound for a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureBinding {
    /// No texture; the backend binds a white placeholder
    #[default]
    None,
    /// 2D diffuse texture
    Diffuse(TextureId),
    /// Cube texture
    Cubemap(TextureId),
}

/// Full state for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    /// Shader program
    pub program: ShaderProgram,
    /// Depth comparison
    pub depth: DepthCompare,
    /// Blending
    pub blend: BlendMode,
    /// Texture binding
    pub texture: TextureBinding,
}

impl PipelineState {
    /// Opaque lit geometry with depth `Less`
    pub fn lit(texture: TextureBinding) -> Self {
        Self {
            program: ShaderProgram::Lit,
            depth: DepthCompare::Less,
            blend: BlendMode::Opaque,
            texture,
        }
    }

    /// Alpha-blended particles with depth `Less`
    pub fn particles() -> Self {
        Self {
            program: ShaderProgram::Particle,
            depth: DepthCompare::Less,
            blend: BlendMode::AlphaBlend,
            texture: TextureBinding::None,
        }
    }

    /// Cubemap background with depth `LessOrEqual`
    pub fn skybox(cubemap: TextureId) -> Self {
        Self {
            program: ShaderProgram::Skybox,
            depth: DepthCompare::LessOrEqual,
            blend: BlendMode::Opaque,
            texture: TextureBinding::Cubemap(cubemap),
        }
    }

    /// The part of the state that selects a GPU pipeline object
    pub fn pipeline_key(&self) -> PipelineKey {
        PipelineKey {
            program: self.program,
            depth: self.depth,
            blend: self.blend,
        }
    }
}

/// Fixed-function state baked into a pipeline object; textures are bound separately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// Shader program
    pub program: ShaderProgram,
    /// Depth comparison
    pub depth: DepthCompare,
    /// Blending
    pub blend: BlendMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    #[test]
    fn test_defaults() {
        assert_eq!(DepthCompare::default(), DepthCompare::Less);
        assert_eq!(BlendMode::default(), BlendMode::Opaque);
        assert_eq!(TextureBinding::default(), TextureBinding::None);
    }

    #[test]
    fn test_pipeline_key_ignores_texture() {
        let a = TextureId::from(KeyData::from_ffi(1));
        let b = TextureId::from(KeyData::from_ffi(2));
        assert_eq!(
            PipelineState::lit(TextureBinding::Diffuse(a)).pipeline_key(),
            PipelineState::lit(TextureBinding::Diffuse(b)).pipeline_key()
        );
        assert_ne!(
            PipelineState::lit(TextureBinding::None).pipeline_key(),
            PipelineState::skybox(a).pipeline_key()
        );
    }

    #[test]
    fn test_file_stems() {
        let stems: Vec<_> = ShaderProgram::ALL.iter().map(|p| p.file_stem()).collect();
        assert_eq!(stems, vec!["lit", "particle", "skybox"]);
    }
}
