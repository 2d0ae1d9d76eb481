use crate::{ImportRequest, ImportResult, TypeImporter};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLanguage
{
    Python,
}

// Script source text; compiling or running it is up to the consumer
pub struct Script
{
    pub name: String, // file stem
    pub language: ScriptLanguage,
    pub source: String,
}

// Scripts have no in-place update, reloads always produce a fresh handle
#[derive(Default)]
pub struct ScriptImporter;
impl TypeImporter for ScriptImporter
{
    type Asset = Script;
    const EXTENSIONS: &'static str = ".py";
    const SUPPORTS_SAVE: bool = true;

    fn import(&self, mut request: ImportRequest) -> ImportResult<Self::Asset>
    {
        let source = request.read_to_string()?;
        Ok(Script
        {
            name: request.file_stem().to_string(),
            language: ScriptLanguage::Python,
            source,
        })
    }

    fn save(&self, asset: &Self::Asset, _path: &Path, output: &mut dyn Write) -> ImportResult<()>
    {
        output.write_all(asset.source.as_bytes())?;
        Ok(())
    }
}
