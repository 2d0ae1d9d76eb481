use crate::importers::{FontImporter, MaterialImporter, MeshImporter, ScriptImporter, ShaderImporter, TextureImporter, UntypedDataImporter};
use crate::{asset_name_for_path, AnyAsset, Ash, Asset, AssetCache, AssetChange, AssetChangeKind, AssetLookupError, AssetRead, AssetTypeId, AssetsConfig, ImportError, ImportOutcome, ImporterRegistry, TypeImporter, UntypedImporter, WatchError};
use crossbeam::channel::{unbounded, Receiver, Sender};
use indexmap::IndexSet;
use parking_lot::Mutex;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

#[cfg(feature = "hot_reloading")]
use crate::{try_fs_watch, AssetWatcher, HotReloadMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetNotification
{
    Imported(String),
    Reloaded(String),
    Failed(String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary
{
    pub imported: usize,
    pub updated: usize, // already cached, updated or replaced
    pub skipped: usize, // no importer for the extension
    pub failed: usize,
}
impl Display for ScanSummary
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "{} imported, {} updated, {} skipped, {} failed", self.imported, self.updated, self.skipped, self.failed)
    }
}

// One resources root with its importers and cache. Shared between the manager and the watcher thread
pub struct AssetStorage
{
    config: AssetsConfig,
    root: PathBuf,
    registry: ImporterRegistry,
    cache: AssetCache,
    subscribers: Mutex<Vec<Sender<AssetNotification>>>,
}
impl AssetStorage
{
    // An empty storage with no importers registered
    #[must_use]
    pub fn new(config: AssetsConfig) -> Self
    {
        // canonical so that watcher paths strip cleanly
        let root = config.assets_root.canonicalize().unwrap_or_else(|err|
        {
            log::warn!("Could not canonicalize assets root {:?}: {err}", config.assets_root);
            config.assets_root.clone()
        });

        #[cfg(debug_assertions)]
        log::debug!("Serving assets from {root:?}");

        Self
        {
            config,
            root,
            registry: ImporterRegistry::new(),
            cache: AssetCache::new(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_builtin_importers(self) -> Self
    {
        self.add_importer(TextureImporter::default())
            .add_importer(ShaderImporter)
            .add_importer(MaterialImporter)
            .add_importer(FontImporter::default())
            .add_importer(ScriptImporter)
            .add_importer(MeshImporter)
            .add_importer(UntypedDataImporter)
    }

    // Register an importer under its own extensions
    #[must_use]
    pub fn add_importer<I: TypeImporter>(self, importer: I) -> Self
    {
        self.registry.register_importer(I::EXTENSIONS, Arc::new(importer));
        self
    }

    pub fn register_importer(&self, key: &str, importer: Arc<dyn UntypedImporter>)
    {
        self.registry.register_importer(key, importer);
    }

    #[inline] #[must_use]
    pub fn config(&self) -> &AssetsConfig { &self.config }
    #[inline] #[must_use]
    pub fn root(&self) -> &Path { &self.root }
    #[inline] #[must_use]
    pub fn registry(&self) -> &ImporterRegistry { &self.registry }
    #[inline] #[must_use]
    pub fn cache(&self) -> &AssetCache { &self.cache }

    // Relative paths are relative to the root
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf
    {
        match path.is_relative()
        {
            true => self.root.join(path),
            false => path.to_path_buf(),
        }
    }

    #[must_use]
    pub fn name_for_path(&self, path: &Path) -> String
    {
        let path = self.resolve_path(path);
        if path.starts_with(&self.root)
        {
            return asset_name_for_path(&self.root, &path);
        }

        // the path may reach the root through a link; removed files can only canonicalize their parent
        let canonical = path.canonicalize().ok().or_else(||
        {
            let parent = path.parent()?.canonicalize().ok()?;
            Some(parent.join(path.file_name()?))
        });
        asset_name_for_path(&self.root, canonical.as_deref().unwrap_or(&path))
    }

    pub fn subscribe(&self) -> Receiver<AssetNotification>
    {
        let (send, recv) = unbounded();
        self.subscribers.lock().push(send);
        recv
    }

    fn notify(&self, notification: AssetNotification)
    {
        // drop subscribers that hung up
        self.subscribers.lock().retain(|s| s.send(notification.clone()).is_ok());
    }

    fn report(&self, name: String, path: &Path, result: &Result<ImportOutcome, ImportError>)
    {
        match result
        {
            Ok(ImportOutcome::Imported) =>
            {
                log::debug!("Imported '{name}' from {path:?}");
                self.notify(AssetNotification::Imported(name));
            },
            Ok(outcome) =>
            {
                log::info!("Reloaded '{name}' ({outcome:?})");
                self.notify(AssetNotification::Reloaded(name));
            },
            Err(ImportError::NoImporter { extension }) =>
            {
                log::warn!("No importer found for extension {extension:?}, skipping {path:?}");
            },
            Err(err) =>
            {
                log::error!("Failed to import '{name}' from {path:?}: {err}");
                self.notify(AssetNotification::Failed(name));
            },
        }
    }

    // Import (or reimport) a single file. Failures are logged and returned, never fatal
    pub fn import_path(&self, path: &Path) -> Result<ImportOutcome, ImportError>
    {
        let path = self.resolve_path(path);
        let name = self.name_for_path(&path);
        let result = self.registry.import_as(&path, &name, &self.cache);
        self.report(name, &path, &result);
        result
    }

    // Import from memory under an explicit name. path selects the importer
    pub fn import_from_memory(&self, name: &str, path: &Path, input: impl AssetRead + 'static) -> Result<ImportOutcome, ImportError>
    {
        let path = self.resolve_path(path);
        let result = self.registry.import_from(&path, name, input, &self.cache);
        self.report(name.to_string(), &path, &result);
        result
    }

    pub fn scan_directory(&self) -> ScanSummary
    {
        self.scan_path(&self.root)
    }

    // Import every regular file under dir. One file failing never stops the scan
    pub fn scan_path(&self, dir: &Path) -> ScanSummary
    {
        puffin::profile_scope!("Asset scan");

        let mut summary = ScanSummary::default();
        for maybe_entry in WalkDir::new(dir).follow_links(true)
        {
            let entry = match maybe_entry
            {
                Ok(entry) => entry,
                Err(err) =>
                {
                    log::warn!("Failed to read directory entry while scanning {dir:?}: {err}");
                    summary.failed += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() { continue; }

            match self.import_path(entry.path())
            {
                Ok(ImportOutcome::Imported) => summary.imported += 1,
                Ok(ImportOutcome::Updated | ImportOutcome::Replaced) => summary.updated += 1,
                Err(ImportError::NoImporter { .. }) => summary.skipped += 1,
                Err(_) => summary.failed += 1,
            }
        }

        log::info!("Scanned {dir:?}: {summary}");
        summary
    }

    // Apply one file system change. Returns true if anything was (re)imported
    pub fn apply_change(&self, change: &AssetChange) -> bool
    {
        let path = self.resolve_path(&change.path);
        match change.kind
        {
            AssetChangeKind::Removed =>
            {
                // entries live until shutdown; outstanding handles keep the last good payload
                log::info!("'{}' was removed from disk, keeping the cached copy", self.name_for_path(&path));
                false
            },
            AssetChangeKind::Created | AssetChangeKind::Modified | AssetChangeKind::Renamed if path.is_dir() =>
            {
                let summary = self.scan_path(&path);
                summary.imported + summary.updated > 0
            },
            AssetChangeKind::Created | AssetChangeKind::Modified | AssetChangeKind::Renamed =>
            {
                if self.registry.resolve(&path).is_none()
                {
                    log::debug!("Ignoring change to {path:?}, no importer for it");
                    return false;
                }
                self.import_path(&path).is_ok()
            },
        }
    }

    // Release every cached asset and importer
    pub fn clear(&self)
    {
        self.cache.clear();
        self.registry.clear();
        self.subscribers.lock().clear();
    }
}

// Owns the asset system's lifetime: initialize, scan, watch, shutdown.
// Pass it (or its storage) to whatever needs asset lookups
pub struct AssetManager
{
    storage: Option<Arc<AssetStorage>>,
    #[cfg(feature = "hot_reloading")]
    fs_watcher: Option<AssetWatcher>,
    changes: (Sender<AssetChange>, Receiver<AssetChange>),
}
impl Default for AssetManager
{
    fn default() -> Self { Self::new() }
}
impl AssetManager
{
    // An uninitialized manager
    #[must_use]
    pub fn new() -> Self
    {
        Self
        {
            storage: None,
            #[cfg(feature = "hot_reloading")]
            fs_watcher: None,
            changes: unbounded(),
        }
    }

    // Initialize with the built-in importers
    pub fn initialize(&mut self, config: AssetsConfig) -> ScanSummary
    {
        self.initialize_with(AssetStorage::new(config).with_builtin_importers())
    }

    // Adopt a pre-configured storage. Any previous state is shut down first
    pub fn initialize_with(&mut self, storage: AssetStorage) -> ScanSummary
    {
        if self.is_initialized()
        {
            self.shutdown();
        }

        let storage = Arc::new(storage);
        self.storage = Some(storage.clone());

        let summary = match storage.config().scan_on_initialize
        {
            true => storage.scan_directory(),
            false => ScanSummary::default(),
        };

        if storage.config().enable_fs_watcher
        {
            if let Err(err) = self.setup_directory_watch()
            {
                log::error!("Failed to start fs watcher for hot-reloading, continuing without: {err:?}");
            }
        }

        summary
    }

    // Release the cache and importers. Handles held elsewhere stay valid
    pub fn shutdown(&mut self)
    {
        #[cfg(feature = "hot_reloading")]
        {
            self.fs_watcher = None;
        }

        let Some(storage) = self.storage.take() else { return; };
        storage.clear();

        let dropped = self.changes.1.try_iter().count();
        if dropped > 0
        {
            log::debug!("Dropped {dropped} pending asset change(s) on shutdown");
        }
        log::debug!("Asset manager shut down");
    }

    #[inline] #[must_use]
    pub fn is_initialized(&self) -> bool { self.storage.is_some() }

    #[inline] #[must_use]
    pub fn storage(&self) -> Option<&Arc<AssetStorage>> { self.storage.as_ref() }

    fn require(&self) -> Result<&Arc<AssetStorage>, AssetLookupError>
    {
        self.storage.as_ref().ok_or(AssetLookupError::Uninitialized)
    }

    #[cfg(feature = "hot_reloading")]
    #[must_use]
    pub fn is_watching(&self) -> bool { self.fs_watcher.is_some() }
    #[cfg(not(feature = "hot_reloading"))]
    #[must_use]
    pub fn is_watching(&self) -> bool { false }

    // Watch the resources root. Changes are queued for process_changes, or applied directly in immediate mode
    #[cfg(feature = "hot_reloading")]
    pub fn setup_directory_watch(&mut self) -> Result<(), WatchError>
    {
        let storage = self.storage.clone().ok_or(WatchError::Uninitialized)?;
        if self.fs_watcher.is_some()
        {
            return Err(WatchError::AlreadyWatching);
        }

        let config = storage.config();
        let watcher = match config.hot_reload
        {
            HotReloadMode::Queued =>
            {
                let sender = self.changes.0.clone();
                try_fs_watch(storage.root(), config.watch_debounce(), move |change|
                {
                    let _ = sender.send(change); // only fails once the manager is gone
                })?
            },
            HotReloadMode::Immediate =>
            {
                let apply_storage = storage.clone();
                try_fs_watch(storage.root(), config.watch_debounce(), move |change|
                {
                    apply_storage.apply_change(&change);
                })?
            },
        };

        log::info!("Hot reloading enabled for {:?} ({:?})", storage.root(), config.hot_reload);
        self.fs_watcher = Some(watcher);
        Ok(())
    }
    #[cfg(not(feature = "hot_reloading"))]
    pub fn setup_directory_watch(&mut self) -> Result<(), WatchError>
    {
        self.require().map_err(|_| WatchError::Uninitialized)?;
        Err(WatchError::Unsupported)
    }

    // Queue a change as if the watcher had seen it
    pub fn notify_change(&self, path: impl Into<PathBuf>, kind: AssetChangeKind)
    {
        let _ = self.changes.0.send(AssetChange::new(path, kind));
    }

    // Drain queued changes and apply them. Returns how many (re)imported something
    pub fn process_changes(&self) -> usize
    {
        puffin::profile_scope!("Process asset changes");

        let Some(storage) = &self.storage else { return 0; };

        // the same file may be reported more than once per drain
        let pending: IndexSet<AssetChange> = self.changes.1.try_iter().collect();
        let mut applied = 0;
        for change in &pending
        {
            if storage.apply_change(change)
            {
                applied += 1;
            }
        }
        applied
    }

    #[must_use]
    pub fn pending_changes(&self) -> usize { self.changes.1.len() }

    pub fn scan_directory(&self) -> Result<ScanSummary, AssetLookupError>
    {
        Ok(self.require()?.scan_directory())
    }

    pub fn import_path(&self, path: impl AsRef<Path>) -> Result<ImportOutcome, ImportError>
    {
        let storage = self.require().map_err(|_| ImportError::Uninitialized)?;
        storage.import_path(path.as_ref())
    }

    pub fn import_from_memory(&self, name: &str, path: impl AsRef<Path>, input: impl AssetRead + 'static) -> Result<ImportOutcome, ImportError>
    {
        let storage = self.require().map_err(|_| ImportError::Uninitialized)?;
        storage.import_from_memory(name, path.as_ref(), input)
    }

    pub fn register_importer(&self, key: &str, importer: Arc<dyn UntypedImporter>) -> Result<(), ImportError>
    {
        let storage = self.require().map_err(|_| ImportError::Uninitialized)?;
        storage.register_importer(key, importer);
        Ok(())
    }

    // Insert a runtime-generated asset, replacing anything cached under the name
    pub fn register_asset<A: Asset>(&self, name: &str, payload: A) -> Result<Ash<A>, AssetLookupError>
    {
        Ok(self.require()?.cache().register_asset(name, payload))
    }

    pub fn register_any(&self, name: &str, asset: AnyAsset) -> Result<Option<AnyAsset>, AssetLookupError>
    {
        Ok(self.require()?.cache().register(name, asset))
    }

    // Serialize an asset to path with the importer registered for its extension
    pub fn save_asset<A: Asset>(&self, path: impl AsRef<Path>, asset: &Ash<A>) -> Result<(), ImportError>
    {
        let storage = self.require().map_err(|_| ImportError::Uninitialized)?;
        let path = storage.resolve_path(path.as_ref());

        let importer = storage.registry().resolve(&path)
            .ok_or_else(|| ImportError::NoImporter { extension: crate::path_extension(&path) })?;

        // encode fully before touching the file
        let mut encoded: Vec<u8> = Vec::new();
        importer.save_any(&A::into_any(asset.clone()), &path, &mut encoded)?;

        if let Some(dir) = path.parent()
        {
            std::fs::create_dir_all(dir).map_err(ImportError::Fetch)?;
        }
        std::fs::write(&path, encoded).map_err(ImportError::Fetch)?;
        log::debug!("Saved '{}' to {path:?}", asset.name());
        Ok(())
    }

    pub fn get<A: Asset>(&self, name: &str) -> Result<Ash<A>, AssetLookupError>
    {
        self.require()?.cache().get(name)
    }

    #[must_use]
    pub fn try_get<A: Asset>(&self, name: &str) -> Option<Ash<A>>
    {
        self.storage.as_ref()?.cache().try_get(name)
    }

    pub fn get_any(&self, name: &str) -> Result<AnyAsset, AssetLookupError>
    {
        self.require()?.cache().get_any(name)
    }

    #[must_use]
    pub fn try_get_any(&self, name: &str) -> Option<AnyAsset>
    {
        self.storage.as_ref()?.cache().try_get_any(name)
    }

    // Receives notifications until shutdown
    pub fn subscribe_to_notifications(&self) -> Result<Receiver<AssetNotification>, AssetLookupError>
    {
        Ok(self.require()?.subscribe())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool
    {
        self.storage.as_ref().is_some_and(|s| s.cache().contains(name))
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.storage.as_ref().map_or(0, |s| s.cache().len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    #[must_use]
    pub fn names(&self) -> Vec<String>
    {
        self.storage.as_ref().map_or_else(Vec::new, |s| s.cache().names())
    }

    #[must_use]
    pub fn asset_type_of(&self, name: &str) -> Option<AssetTypeId>
    {
        self.storage.as_ref()?.cache().asset_type_of(name)
    }

    #[must_use]
    pub fn resource_root(&self) -> Option<&Path>
    {
        self.storage.as_ref().map(|s| s.root())
    }

    #[must_use]
    pub fn name_for_path(&self, path: impl AsRef<Path>) -> Option<String>
    {
        self.storage.as_ref().map(|s| s.name_for_path(path.as_ref()))
    }

    #[must_use]
    pub fn registered_extensions(&self) -> Vec<String>
    {
        self.storage.as_ref().map_or_else(Vec::new, |s| s.registry().registered_extensions())
    }

    #[must_use]
    pub fn registered_kinds(&self) -> Vec<(String, AssetTypeId)>
    {
        self.storage.as_ref().map_or_else(Vec::new, |s| s.registry().registered_kinds())
    }
}
impl Drop for AssetManager
{
    fn drop(&mut self)
    {
        self.shutdown();
    }
}
