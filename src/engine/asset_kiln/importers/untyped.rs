use crate::{ImportRequest, ImportResult, TypeImporter};
use std::io::Write;
use std::path::Path;

// Opaque bytes, loaded as-is
pub struct UntypedData
{
    pub bytes: Box<[u8]>,
}

#[derive(Default)]
pub struct UntypedDataImporter;
impl TypeImporter for UntypedDataImporter
{
    type Asset = UntypedData;
    const EXTENSIONS: &'static str = ".bin";
    const SUPPORTS_UPDATE: bool = true;
    const SUPPORTS_SAVE: bool = true;

    fn import(&self, mut request: ImportRequest) -> ImportResult<Self::Asset>
    {
        Ok(UntypedData { bytes: request.read_to_end()?.into_boxed_slice() })
    }

    fn save(&self, asset: &Self::Asset, _path: &Path, output: &mut dyn Write) -> ImportResult<()>
    {
        output.write_all(&asset.bytes)?;
        Ok(())
    }
}
