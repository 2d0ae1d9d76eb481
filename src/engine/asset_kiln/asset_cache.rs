use crate::{AnyAsset, Ash, Asset, AssetTypeId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

#[derive(Debug, PartialEq, Eq)]
pub enum AssetLookupError
{
    NotFound(String),
    MismatchedAssetType // the name exists but holds a different kind of asset
    {
        name: String,
        expected: AssetTypeId,
        found: AssetTypeId,
    },
    Uninitialized, // the asset manager has not been initialized (or was shut down)
}
impl Display for AssetLookupError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for AssetLookupError { }

// Name-keyed store of type-erased asset handles. Lookups share a read lock, registration takes the write lock
#[derive(Default)]
pub struct AssetCache
{
    entries: RwLock<HashMap<String, AnyAsset>>,
}
impl AssetCache
{
    #[must_use]
    pub fn new() -> Self { Self::default() }

    // Insert or replace the entry for a name, returning the previous entry
    pub fn register(&self, name: &str, asset: AnyAsset) -> Option<AnyAsset>
    {
        let previous = self.entries.write().insert(name.to_string(), asset);
        if let Some(prev) = &previous
        {
            log::debug!("Replaced cached {:?} '{name}'", prev.asset_type());
        }
        previous
    }

    // Wrap a payload in a new handle and register it
    pub fn register_asset<A: Asset>(&self, name: &str, payload: A) -> Ash<A>
    {
        let handle = Ash::new(name, payload);
        self.register(name, A::into_any(handle.clone()));
        handle
    }

    pub fn get<A: Asset>(&self, name: &str) -> Result<Ash<A>, AssetLookupError>
    {
        let entries = self.entries.read();
        let entry = entries.get(name).ok_or_else(|| AssetLookupError::NotFound(name.to_string()))?;

        let found = entry.asset_type();
        if found != A::asset_type()
        {
            return Err(AssetLookupError::MismatchedAssetType
            {
                name: name.to_string(),
                expected: A::asset_type(),
                found,
            });
        }

        // the type IDs matching but the variants not means the union itself is corrupt
        let handle = A::from_any(entry).expect("Asset type ID matched but the cached variant did not");
        Ok(handle.clone())
    }

    #[inline] #[must_use]
    pub fn try_get<A: Asset>(&self, name: &str) -> Option<Ash<A>>
    {
        self.get(name).ok()
    }

    pub fn get_any(&self, name: &str) -> Result<AnyAsset, AssetLookupError>
    {
        self.try_get_any(name).ok_or_else(|| AssetLookupError::NotFound(name.to_string()))
    }

    #[must_use]
    pub fn try_get_any(&self, name: &str) -> Option<AnyAsset>
    {
        self.entries.read().get(name).cloned()
    }

    #[must_use]
    pub fn asset_type_of(&self, name: &str) -> Option<AssetTypeId>
    {
        self.entries.read().get(name).map(|e| e.asset_type())
    }

    #[inline] #[must_use]
    pub fn contains(&self, name: &str) -> bool
    {
        self.entries.read().contains_key(name)
    }

    #[inline] #[must_use]
    pub fn len(&self) -> usize
    {
        self.entries.read().len()
    }

    #[inline] #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.entries.read().is_empty()
    }

    // all cached names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String>
    {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    // Drop every entry. Handles held elsewhere keep their payloads alive
    pub fn clear(&self)
    {
        let mut entries = self.entries.write();
        log::debug!("Releasing {} cached asset(s)", entries.len());
        entries.clear();
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::importers::{Script, ScriptLanguage, UntypedData};

    fn script(source: &str) -> Script
    {
        Script { name: "s".to_string(), language: ScriptLanguage::Python, source: source.to_string() }
    }

    mod get
    {
        use super::*;

        #[test]
        fn registered()
        {
            let cache = AssetCache::new();
            cache.register_asset("scripts/s", script("print(1)"));

            let handle = cache.get::<Script>("scripts/s").unwrap();
            assert_eq!("print(1)", handle.payload().source);
        }

        #[test]
        fn not_found()
        {
            let cache = AssetCache::new();
            assert_eq!(Some(AssetLookupError::NotFound("nope".to_string())), cache.get::<Script>("nope").err());
            assert!(cache.try_get::<Script>("nope").is_none());
            assert!(cache.try_get_any("nope").is_none());
            assert!(matches!(cache.get_any("nope"), Err(AssetLookupError::NotFound(_))));
        }

        #[test]
        fn mismatched_type()
        {
            let cache = AssetCache::new();
            cache.register_asset("s", script(""));

            match cache.get::<UntypedData>("s")
            {
                Err(AssetLookupError::MismatchedAssetType { name, expected, found }) =>
                {
                    assert_eq!("s", name);
                    assert_eq!(AssetTypeId::Untyped, expected);
                    assert_eq!(AssetTypeId::Script, found);
                }
                other => panic!("Expected a type mismatch: {other:?}"),
            }
            assert!(cache.try_get::<UntypedData>("s").is_none());
            assert!(cache.try_get::<Script>("s").is_some());
        }

        #[test]
        fn erased()
        {
            let cache = AssetCache::new();
            let handle = cache.register_asset("s", script(""));
            let any = cache.get_any("s").unwrap();
            assert_eq!(AssetTypeId::Script, any.asset_type());
            assert!(any.downcast::<Script>().is_some_and(|h| Ash::ptr_eq(&h, &handle)));
        }
    }

    mod register
    {
        use super::*;

        #[test]
        fn replaces_slot()
        {
            let cache = AssetCache::new();
            let first = cache.register_asset("s", script("one"));
            let second = cache.register_asset("s", script("two"));

            assert_eq!(1, cache.len());
            assert!(!Ash::ptr_eq(&first, &second));
            assert_eq!("two", cache.get::<Script>("s").unwrap().payload().source);
            // the replaced handle still holds its own payload
            assert_eq!("one", first.payload().source);
        }

        #[test]
        fn returns_previous()
        {
            let cache = AssetCache::new();
            assert!(cache.register("s", Script::into_any(Ash::new("s", script("")))).is_none());
            let previous = cache.register("s", UntypedData::into_any(Ash::new("s", UntypedData { bytes: Box::new([]) })));
            assert_eq!(Some(AssetTypeId::Script), previous.map(|p| p.asset_type()));
            assert_eq!(Some(AssetTypeId::Untyped), cache.asset_type_of("s"));
        }
    }

    #[test]
    fn names_sorted()
    {
        let cache = AssetCache::new();
        cache.register_asset("b", script(""));
        cache.register_asset("a/c", script(""));
        cache.register_asset("a", script(""));
        assert_eq!(vec!["a", "a/c", "b"], cache.names());
    }

    #[test]
    fn clear_keeps_held_payloads()
    {
        let cache = AssetCache::new();
        let held = cache.register_asset("s", script("alive"));
        cache.clear();

        assert!(cache.is_empty());
        assert!(!cache.contains("s"));
        assert_eq!("alive", held.payload().source);
        assert_eq!(1, held.ref_count());
    }
}
