use crate::{path_extension, ImportRequest, ImportResult, TypeImporter};
use metrohash::MetroHash64;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hasher;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ShaderStage
{
    Vertex,
    Pixel, // fragment
    Compute,
}
impl ShaderStage
{
    // takes the extension with its leading dot
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self>
    {
        match extension
        {
            ".vert" | ".vs" => Some(Self::Vertex),
            ".frag" | ".fs" | ".ps" => Some(Self::Pixel),
            ".comp" | ".cs" => Some(Self::Compute),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ShaderManifestError
{
    Empty,
    UnknownStage(PathBuf),
    MissingScript { path: PathBuf, error: std::io::Error },
}
impl Display for ShaderManifestError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for ShaderManifestError { }

pub struct ShaderStageSource
{
    pub stage: ShaderStage,
    pub path: PathBuf, // as written in the manifest
    pub source: String,
}

// Stage sources gathered from a manifest. Compiling them is the renderer's job
pub struct Shader
{
    pub name: String, // manifest file stem
    pub stages: Vec<ShaderStageSource>,
    pub source_hash: u64,
}
impl Shader
{
    #[must_use]
    pub fn stage(&self, stage: ShaderStage) -> Option<&ShaderStageSource>
    {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

// Imports `.shader` manifests: one stage script per line, relative to the manifest
#[derive(Default)]
pub struct ShaderImporter;
impl ShaderImporter
{
    fn decode(request: &mut ImportRequest) -> ImportResult<Shader>
    {
        let manifest = request.read_to_string()?;

        let mut hasher = MetroHash64::with_seed(0);
        let mut stages = Vec::new();
        for line in manifest.lines()
        {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') { continue; }

            let path = PathBuf::from(line);
            let stage = path_extension(&path)
                .and_then(|ext| ShaderStage::from_extension(&ext))
                .ok_or_else(|| ShaderManifestError::UnknownStage(path.clone()))?;

            let full_path = request.resolve_sibling(&path);
            let source = std::fs::read_to_string(&full_path)
                .map_err(|error| ShaderManifestError::MissingScript { path: full_path, error })?;

            hasher.write(source.as_bytes());
            stages.push(ShaderStageSource { stage, path, source });
        }

        if stages.is_empty()
        {
            return Err(Box::new(ShaderManifestError::Empty));
        }

        Ok(Shader
        {
            name: request.file_stem().to_string(),
            stages,
            source_hash: hasher.finish(),
        })
    }
}
impl TypeImporter for ShaderImporter
{
    type Asset = Shader;
    const EXTENSIONS: &'static str = ".shader";
    const SUPPORTS_UPDATE: bool = true;
    const SUPPORTS_SAVE: bool = true;

    fn import(&self, mut request: ImportRequest) -> ImportResult<Self::Asset>
    {
        Self::decode(&mut request)
    }

    fn update(&self, existing: &Self::Asset, mut request: ImportRequest) -> ImportResult<Self::Asset>
    {
        let shader = Self::decode(&mut request)?;
        if shader.source_hash == existing.source_hash
        {
            log::debug!("Shader '{}' reloaded with unchanged source", request.name);
        }
        Ok(shader)
    }

    fn save(&self, asset: &Self::Asset, _path: &Path, output: &mut dyn Write) -> ImportResult<()>
    {
        for stage in &asset.stages
        {
            writeln!(output, "{}", stage.path.display())?;
        }
        Ok(())
    }
}
