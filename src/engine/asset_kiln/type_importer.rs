use crate::{AnyAsset, Ash, Asset, AssetCache, AssetRead, AssetTypeId};
use nab_kiln::utils::ShortTypeName;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

pub type ImportResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Debug)]
pub enum ImportError
{
    NoImporter { extension: Option<String> }, // no importer registered for this extension
    Fetch(io::Error), // the asset's file could not be opened or written
    Decode(Box<dyn Error + Send + Sync>), // the importer rejected the content
    Encode(Box<dyn Error + Send + Sync>), // the importer failed to serialize the asset
    MismatchedAssetType
    {
        expected: AssetTypeId,
        found: AssetTypeId,
    },
    SaveUnsupported,
    Uninitialized,
}
impl Display for ImportError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for ImportError { }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome
{
    Imported, // first import of this name
    Updated, // published into the existing handle
    Replaced, // a new handle replaced the cache entry
}

pub struct ImportRequest
{
    pub name: String, // logical name the result is cached under
    pub path: PathBuf, // backing file, used for resolving relative references
    pub input: Box<dyn AssetRead>,
}
impl ImportRequest
{
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, input: impl AssetRead + 'static) -> Self
    {
        Self
        {
            name: name.into(),
            path: path.into(),
            input: Box::new(input),
        }
    }

    pub fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> io::Result<Self>
    {
        let path = path.into();
        let file = File::open(&path)?;
        Ok(Self { name: name.into(), path, input: Box::new(BufReader::new(file)) })
    }

    pub fn read_to_end(&mut self) -> io::Result<Vec<u8>>
    {
        let mut bytes = Vec::new();
        self.input.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    // fails with InvalidData if the content is not UTF-8
    pub fn read_to_string(&mut self) -> io::Result<String>
    {
        let mut text = String::new();
        self.input.read_to_string(&mut text)?;
        Ok(text)
    }

    // the backing file's name without directories or extension
    #[must_use]
    pub fn file_stem(&self) -> &str
    {
        self.path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    // resolve a path relative to the directory containing this asset
    #[must_use]
    pub fn resolve_sibling(&self, relative: impl AsRef<Path>) -> PathBuf
    {
        match self.path.parent()
        {
            Some(dir) => dir.join(relative),
            None => relative.as_ref().to_path_buf(),
        }
    }
}

// Decodes one kind of asset from its backing file
pub trait TypeImporter: Sync + Send + 'static
{
    type Asset: Asset;

    // comma separated, leading dots included (".png,.jpg")
    const EXTENSIONS: &'static str;
    // false if reloads should replace the cache entry instead of publishing into the existing handle
    const SUPPORTS_UPDATE: bool = false;
    const SUPPORTS_SAVE: bool = false;

    fn import(&self, request: ImportRequest) -> ImportResult<Self::Asset>;

    // Re-decode an already cached asset. The result is published into the existing handle
    fn update(&self, existing: &Self::Asset, request: ImportRequest) -> ImportResult<Self::Asset>
    {
        let _ = existing;
        self.import(request)
    }

    fn save(&self, asset: &Self::Asset, path: &Path, output: &mut dyn Write) -> ImportResult<()>
    {
        let _ = (asset, path, output);
        Err(Box::new(ImportError::SaveUnsupported))
    }

    fn display_name(&self) -> &'static str { Self::short_type_name() }
}

// The type-erased face of a TypeImporter, as stored by the registry
pub trait UntypedImporter: Sync + Send
{
    fn asset_type(&self) -> AssetTypeId;
    fn display_name(&self) -> &'static str;
    fn extensions(&self) -> &'static str;
    fn supports_update(&self) -> bool;
    fn supports_save(&self) -> bool;

    // Decode the request and publish the result into the cache
    fn import_into(&self, request: ImportRequest, cache: &AssetCache) -> Result<ImportOutcome, ImportError>;

    // Serialize the current payload of a cached asset. It must be this importer's asset type
    fn save_any(&self, asset: &AnyAsset, path: &Path, output: &mut dyn Write) -> Result<(), ImportError>;
}
impl<L: TypeImporter> UntypedImporter for L
{
    fn asset_type(&self) -> AssetTypeId { L::Asset::asset_type() }
    fn display_name(&self) -> &'static str { TypeImporter::display_name(self) }
    fn extensions(&self) -> &'static str { L::EXTENSIONS }
    fn supports_update(&self) -> bool { L::SUPPORTS_UPDATE }
    fn supports_save(&self) -> bool { L::SUPPORTS_SAVE }

    fn import_into(&self, request: ImportRequest, cache: &AssetCache) -> Result<ImportOutcome, ImportError>
    {
        puffin::profile_scope!("Asset import");

        let name = request.name.clone();
        let existing = cache.try_get::<L::Asset>(&name);

        if let Some(handle) = existing.as_ref().filter(|_| L::SUPPORTS_UPDATE)
        {
            // decode outside of any cache lock, then publish as a unit
            let current = handle.payload();
            let updated = self.update(&current, request).map_err(ImportError::Decode)?;
            handle.store_payload(updated);
            return Ok(ImportOutcome::Updated);
        }

        if existing.is_none()
        {
            if let Some(other_type) = cache.asset_type_of(&name)
            {
                log::warn!("'{name}' is cached as {other_type:?}, it will be replaced by a {:?}", L::Asset::asset_type());
            }
        }

        let asset = self.import(request).map_err(ImportError::Decode)?;
        let previous = cache.register(&name, L::Asset::into_any(Ash::new(&name, asset)));
        Ok(match previous
        {
            None => ImportOutcome::Imported,
            Some(_) => ImportOutcome::Replaced,
        })
    }

    fn save_any(&self, asset: &AnyAsset, path: &Path, output: &mut dyn Write) -> Result<(), ImportError>
    {
        let Some(handle) = L::Asset::from_any(asset) else
        {
            return Err(ImportError::MismatchedAssetType
            {
                expected: L::Asset::asset_type(),
                found: asset.asset_type(),
            });
        };
        if !L::SUPPORTS_SAVE
        {
            return Err(ImportError::SaveUnsupported);
        }
        self.save(&handle.payload(), path, output).map_err(ImportError::Encode)
    }
}
