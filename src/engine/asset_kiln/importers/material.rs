use crate::importers::Shader;
use crate::{Ash, AssetCache, AssetLookupError, ImportRequest, ImportResult, TomlRead, TomlWrite, TypeImporter};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue
{
    Scalar(f32),
    Vec4([f32; 4]),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperty
{
    pub name: String,
    pub value: PropertyValue,
}

// A shader reference plus named parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material
{
    pub shader: String, // logical name of the shader asset
    #[serde(default)]
    pub properties: Vec<MaterialProperty>,
}
impl TomlRead for Material { }
impl TomlWrite for Material { }
impl Material
{
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyValue>
    {
        self.properties.iter().find(|p| p.name == name).map(|p| p.value)
    }

    pub fn set_property(&mut self, name: &str, value: PropertyValue)
    {
        match self.properties.iter_mut().find(|p| p.name == name)
        {
            Some(prop) => prop.value = value,
            None => self.properties.push(MaterialProperty { name: name.to_string(), value }),
        }
    }

    // Look up the referenced shader. Materials do not keep the shader alive themselves
    pub fn resolve_shader(&self, cache: &AssetCache) -> Result<Ash<Shader>, AssetLookupError>
    {
        cache.get::<Shader>(&self.shader)
    }
}

#[derive(Default)]
pub struct MaterialImporter;
impl TypeImporter for MaterialImporter
{
    type Asset = Material;
    const EXTENSIONS: &'static str = ".mat";
    const SUPPORTS_UPDATE: bool = true;
    const SUPPORTS_SAVE: bool = true;

    fn import(&self, mut request: ImportRequest) -> ImportResult<Self::Asset>
    {
        Ok(Material::load(&mut request.input)?)
    }

    fn save(&self, asset: &Self::Asset, _path: &Path, output: &mut dyn Write) -> ImportResult<()>
    {
        let mut text: Vec<u8> = Vec::new();
        asset.save(true, &mut text)?;
        output.write_all(&text)?;
        Ok(())
    }
}
