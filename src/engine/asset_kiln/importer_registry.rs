use crate::{asset_name_for_path, path_extension, AssetCache, AssetRead, AssetTypeId, ImportError, ImportOutcome, ImportRequest, UntypedImporter};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

// Split an importer registration key (".png,.jpg") into its extensions.
// Splitting is literal; empty segments are kept as empty extensions
pub fn split_extensions(key: &str) -> impl Iterator<Item = &str>
{
    key.split(',')
}

// Maps file extensions (leading dot included, case-sensitive) to importers.
// Imports of one name are serialized; different names may import concurrently
#[derive(Default)]
pub struct ImporterRegistry
{
    importers: RwLock<HashMap<String, Arc<dyn UntypedImporter>>>,
    import_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}
impl ImporterRegistry
{
    #[must_use]
    pub fn new() -> Self { Self::default() }

    // Register one importer under every extension in key. Later registrations win
    pub fn register_importer(&self, key: &str, importer: Arc<dyn UntypedImporter>)
    {
        let mut importers = self.importers.write();
        for extension in split_extensions(key)
        {
            if let Some(previous) = importers.insert(extension.to_string(), importer.clone())
            {
                log::debug!("Importer for '{extension}' changed from {} to {}",
                    previous.display_name(),
                    importer.display_name());
            }
        }
    }

    #[must_use]
    pub fn resolve_extension(&self, extension: &str) -> Option<Arc<dyn UntypedImporter>>
    {
        self.importers.read().get(extension).cloned()
    }

    // Find the importer for a path's extension. No fallbacks
    #[must_use]
    pub fn resolve(&self, path: &Path) -> Option<Arc<dyn UntypedImporter>>
    {
        path_extension(path).and_then(|ext| self.resolve_extension(&ext))
    }

    fn import_lock(&self, name: &str) -> Arc<Mutex<()>>
    {
        self.import_locks.lock().entry(name.to_string()).or_default().clone()
    }

    // Import a file, caching it under a name derived from its path
    pub fn import(&self, path: &Path, cache: &AssetCache) -> Result<ImportOutcome, ImportError>
    {
        let name = asset_name_for_path(Path::new(""), path);
        self.import_as(path, &name, cache)
    }

    pub fn import_as(&self, path: &Path, name: &str, cache: &AssetCache) -> Result<ImportOutcome, ImportError>
    {
        let importer = self.resolve(path).ok_or_else(|| ImportError::NoImporter { extension: path_extension(path) })?;

        // opened under the lock so the last import to publish also read the newest content
        let lock = self.import_lock(name);
        let _serialized = lock.lock();
        let request = ImportRequest::open(name, path).map_err(ImportError::Fetch)?;
        importer.import_into(request, cache)
    }

    // Import from an in-memory source; path only selects the importer and anchors relative references
    pub fn import_from(&self, path: &Path, name: &str, input: impl AssetRead + 'static, cache: &AssetCache) -> Result<ImportOutcome, ImportError>
    {
        let importer = self.resolve(path).ok_or_else(|| ImportError::NoImporter { extension: path_extension(path) })?;

        let lock = self.import_lock(name);
        let _serialized = lock.lock();
        importer.import_into(ImportRequest::new(name, path, input), cache)
    }

    // all registered extensions, sorted
    #[must_use]
    pub fn registered_extensions(&self) -> Vec<String>
    {
        let mut extensions: Vec<String> = self.importers.read().keys().cloned().collect();
        extensions.sort();
        extensions
    }

    // each registered extension with the kind its importer produces, sorted by extension
    #[must_use]
    pub fn registered_kinds(&self) -> Vec<(String, AssetTypeId)>
    {
        let mut kinds: Vec<(String, AssetTypeId)> = self.importers.read().iter()
            .map(|(extension, importer)| (extension.clone(), importer.asset_type()))
            .collect();
        kinds.sort_by(|a, b| a.0.cmp(&b.0));
        kinds
    }

    #[inline] #[must_use]
    pub fn len(&self) -> usize { self.importers.read().len() }

    #[inline] #[must_use]
    pub fn is_empty(&self) -> bool { self.importers.read().is_empty() }

    pub fn clear(&self)
    {
        self.importers.write().clear();
        self.import_locks.lock().clear();
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::importers::UntypedData;
    use crate::{ImportResult, TypeImporter};
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TaggingImporter
    {
        tag: u8,
        calls: AtomicUsize,
    }
    impl TaggingImporter
    {
        fn new(tag: u8) -> Arc<Self> { Arc::new(Self { tag, calls: AtomicUsize::new(0) }) }
    }
    impl TypeImporter for TaggingImporter
    {
        type Asset = UntypedData;
        const EXTENSIONS: &'static str = ".foo";

        fn import(&self, _request: ImportRequest) -> ImportResult<Self::Asset>
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(UntypedData { bytes: Box::new([self.tag]) })
        }
    }

    fn same(a: &Arc<dyn UntypedImporter>, b: &Arc<TaggingImporter>) -> bool
    {
        std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
    }

    mod register
    {
        use super::*;

        #[test]
        fn splits_key()
        {
            assert_eq!(vec![".png", ".jpg", ".jpeg"], split_extensions(".png,.jpg,.jpeg").collect::<Vec<_>>());
            assert_eq!(vec![".foo"], split_extensions(".foo").collect::<Vec<_>>());
            assert_eq!(vec!["", ".a", ""], split_extensions(",.a,").collect::<Vec<_>>());
        }

        #[test]
        fn one_importer_many_extensions()
        {
            let registry = ImporterRegistry::new();
            let importer = TaggingImporter::new(1);
            registry.register_importer(".png,.jpg,.jpeg", importer.clone());

            for file in ["a.png", "dir/b.jpg", "c.jpeg"]
            {
                let resolved = registry.resolve(Path::new(file)).unwrap();
                assert!(same(&resolved, &importer), "{file} resolved to another importer");
            }
            assert_eq!(vec![".jpeg", ".jpg", ".png"], registry.registered_extensions());
        }

        #[test]
        fn kinds_per_extension()
        {
            let registry = ImporterRegistry::new();
            registry.register_importer(".foo,.bar", TaggingImporter::new(1));
            registry.register_importer(".mat", Arc::new(crate::importers::MaterialImporter));

            assert_eq!(vec![
                (".bar".to_string(), AssetTypeId::Untyped),
                (".foo".to_string(), AssetTypeId::Untyped),
                (".mat".to_string(), AssetTypeId::Material),
            ], registry.registered_kinds());
        }

        #[test]
        fn last_registration_wins()
        {
            let registry = ImporterRegistry::new();
            let first = TaggingImporter::new(1);
            let second = TaggingImporter::new(2);
            registry.register_importer(".foo", first.clone());
            registry.register_importer(".foo,.bar", second.clone());

            let cache = AssetCache::new();
            registry.import_from(Path::new("x.foo"), "x", Cursor::new(Vec::<u8>::new()), &cache).unwrap();

            assert_eq!(0, first.calls.load(Ordering::SeqCst));
            assert_eq!(1, second.calls.load(Ordering::SeqCst));
            assert_eq!(&*cache.get::<UntypedData>("x").unwrap().payload().bytes, &[2]);
            assert_eq!(2, registry.len());
        }

        #[test]
        fn clear()
        {
            let registry = ImporterRegistry::new();
            registry.register_importer(".foo", TaggingImporter::new(1));
            registry.clear();
            assert!(registry.is_empty());
            assert!(registry.resolve(Path::new("a.foo")).is_none());
        }
    }

    mod resolve
    {
        use super::*;

        #[test]
        fn unregistered()
        {
            let registry = ImporterRegistry::new();
            registry.register_importer(".foo", TaggingImporter::new(1));
            assert!(registry.resolve(Path::new("c.unknown")).is_none());
            assert!(registry.resolve(Path::new("no_extension")).is_none());
        }

        #[test]
        fn case_sensitive()
        {
            let registry = ImporterRegistry::new();
            registry.register_importer(".foo", TaggingImporter::new(1));
            assert!(registry.resolve(Path::new("a.foo")).is_some());
            assert!(registry.resolve(Path::new("a.FOO")).is_none());
        }

        #[test]
        fn needs_the_dot()
        {
            let registry = ImporterRegistry::new();
            registry.register_importer("foo", TaggingImporter::new(1));
            assert!(registry.resolve(Path::new("a.foo")).is_none());
            assert!(registry.resolve_extension("foo").is_some());
        }
    }

    mod import
    {
        use super::*;

        #[test]
        fn no_importer()
        {
            let registry = ImporterRegistry::new();
            let cache = AssetCache::new();
            match registry.import(Path::new("c.unknown"), &cache)
            {
                Err(ImportError::NoImporter { extension }) => assert_eq!(Some(".unknown".to_string()), extension),
                other => panic!("Expected no importer: {other:?}"),
            }
            assert!(cache.is_empty());
        }

        #[test]
        fn missing_file()
        {
            let registry = ImporterRegistry::new();
            registry.register_importer(".foo", TaggingImporter::new(1));
            let cache = AssetCache::new();
            assert!(matches!(registry.import(&PathBuf::from("/definitely/not/here.foo"), &cache), Err(ImportError::Fetch(_))));
        }

        #[test]
        fn from_file()
        {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("thing.foo");
            std::fs::write(&path, b"ignored").unwrap();

            let registry = ImporterRegistry::new();
            registry.register_importer(".foo", TaggingImporter::new(7));
            let cache = AssetCache::new();

            assert_eq!(ImportOutcome::Imported, registry.import_as(&path, "thing", &cache).unwrap());
            assert!(cache.contains("thing"));
        }
    }

    mod concurrent
    {
        use super::*;
        use crate::Ash;
        use crossbeam::channel::{bounded, Receiver, Sender};
        use std::time::Duration;

        // Decoding "old" is slow and reports when it starts
        struct SlowImporter
        {
            started: Sender<()>,
        }
        impl TypeImporter for SlowImporter
        {
            type Asset = UntypedData;
            const EXTENSIONS: &'static str = ".slow";
            const SUPPORTS_UPDATE: bool = true;

            fn import(&self, mut request: ImportRequest) -> ImportResult<Self::Asset>
            {
                let bytes = request.read_to_end()?;
                if bytes == b"old"
                {
                    let _ = self.started.send(());
                    std::thread::sleep(Duration::from_millis(300));
                }
                Ok(UntypedData { bytes: bytes.into_boxed_slice() })
            }
        }

        fn slow_registry() -> (ImporterRegistry, Receiver<()>)
        {
            let (send, recv) = bounded(4);
            let registry = ImporterRegistry::new();
            registry.register_importer(".slow", Arc::new(SlowImporter { started: send }));
            (registry, recv)
        }

        fn import_bytes(registry: &ImporterRegistry, cache: &AssetCache, name: &str, bytes: &[u8]) -> ImportOutcome
        {
            registry.import_from(Path::new("x.slow"), name, Cursor::new(bytes.to_vec()), cache).unwrap()
        }

        #[test]
        fn later_import_of_same_name_publishes_last()
        {
            let (registry, started) = slow_registry();
            let cache = AssetCache::new();
            import_bytes(&registry, &cache, "x", b"first");
            let handle = cache.get::<UntypedData>("x").unwrap();

            std::thread::scope(|scope|
            {
                let older = scope.spawn(|| import_bytes(&registry, &cache, "x", b"old"));
                started.recv_timeout(Duration::from_secs(5)).unwrap();

                assert_eq!(ImportOutcome::Updated, import_bytes(&registry, &cache, "x", b"new"));
                assert_eq!(&*handle.payload().bytes, b"new");

                assert_eq!(ImportOutcome::Updated, older.join().unwrap());
            });

            assert_eq!(&*handle.payload().bytes, b"new");
            assert!(Ash::ptr_eq(&handle, &cache.get::<UntypedData>("x").unwrap()));
        }

        #[test]
        fn racing_first_imports_share_one_handle()
        {
            let (registry, started) = slow_registry();
            let cache = AssetCache::new();

            let outcomes = std::thread::scope(|scope|
            {
                let first = scope.spawn(|| import_bytes(&registry, &cache, "y", b"old"));
                started.recv_timeout(Duration::from_secs(5)).unwrap();
                let second = import_bytes(&registry, &cache, "y", b"new");
                (first.join().unwrap(), second)
            });

            assert_eq!((ImportOutcome::Imported, ImportOutcome::Updated), outcomes);
            assert_eq!(&*cache.get::<UntypedData>("y").unwrap().payload().bytes, b"new");
        }

        #[test]
        fn different_names_do_not_wait()
        {
            let (registry, started) = slow_registry();
            let cache = AssetCache::new();

            std::thread::scope(|scope|
            {
                let slow = scope.spawn(|| import_bytes(&registry, &cache, "a", b"old"));
                started.recv_timeout(Duration::from_secs(5)).unwrap();

                import_bytes(&registry, &cache, "b", b"quick");
                assert!(cache.contains("b"));
                assert!(!cache.contains("a"));

                slow.join().unwrap();
            });
            assert!(cache.contains("a"));
        }
    }
}
