use crate::Asset;
use arc_swap::ArcSwap;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct AssetHandleInner<A: Asset>
{
    name: Box<str>,
    payload: ArcSwap<A>,
    generation: AtomicU64, // number of payloads published after the first
}

// A more convenient alias for AssetHandle<A>
pub type Ash<A> = AssetHandle<A>;

// A hot-reloadable, shared handle to an asset.
// The handle's identity never changes; reloads publish a new payload into it, which every clone observes.
// Do not store references to the internal payload longer than necessary
pub struct AssetHandle<A: Asset>
{
    inner: Arc<AssetHandleInner<A>>,
}
impl<A: Asset> AssetHandle<A>
{
    #[must_use]
    pub fn new(name: &str, payload: A) -> Self
    {
        Self
        {
            inner: Arc::new(AssetHandleInner
            {
                name: name.into(),
                payload: ArcSwap::from_pointee(payload),
                generation: AtomicU64::new(0),
            }),
        }
    }

    #[inline] #[must_use]
    pub fn name(&self) -> &str { &self.inner.name }

    // A snapshot of the current payload. Later reloads do not affect the returned value
    #[inline] #[must_use]
    pub fn payload(&self) -> Arc<A>
    {
        self.inner.payload.load_full()
    }

    // Replace the payload as a single unit; readers see either the old or the new value
    pub fn store_payload(&self, payload: A)
    {
        self.inner.payload.store(Arc::new(payload));
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }

    #[inline] #[must_use]
    pub fn generation(&self) -> u64
    {
        self.inner.generation.load(Ordering::Acquire)
    }

    #[inline] #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool
    {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    // the number of live clones of this handle (cache entry included)
    #[inline] #[must_use]
    pub fn ref_count(&self) -> usize
    {
        Arc::strong_count(&self.inner)
    }
}
impl<A: Asset> Clone for AssetHandle<A>
{
    fn clone(&self) -> Self
    {
        Self { inner: self.inner.clone() }
    }
}
impl<A: Asset> Debug for AssetHandle<A>
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("AssetHandle")
            .field("name", &self.name())
            .field("type", &A::asset_type())
            .field("generation", &self.generation())
            .field("refs", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::importers::UntypedData;

    fn data(bytes: &[u8]) -> UntypedData
    {
        UntypedData { bytes: bytes.into() }
    }

    #[test]
    fn clones_observe_reload()
    {
        let handle = Ash::new("blob", data(b"first"));
        let held = handle.clone();
        assert_eq!(0, held.generation());

        handle.store_payload(data(b"second"));
        assert_eq!(&*held.payload().bytes, b"second");
        assert_eq!(1, held.generation());
        assert!(Ash::ptr_eq(&handle, &held));
    }

    #[test]
    fn snapshots_are_stable()
    {
        let handle = Ash::new("blob", data(b"first"));
        let snapshot = handle.payload();

        handle.store_payload(data(b"second"));
        assert_eq!(&*snapshot.bytes, b"first");
        assert_eq!(&*handle.payload().bytes, b"second");
    }

    #[test]
    fn payload_outlives_handle()
    {
        let handle = Ash::new("blob", data(b"kept"));
        let snapshot = handle.payload();
        drop(handle);
        assert_eq!(&*snapshot.bytes, b"kept");
    }

    #[test]
    fn ref_counts()
    {
        let handle = Ash::new("blob", data(b""));
        assert_eq!(1, handle.ref_count());
        let other = handle.clone();
        assert_eq!(2, handle.ref_count());
        drop(other);
        assert_eq!(1, handle.ref_count());
    }

    #[test]
    fn debug_format()
    {
        let handle = Ash::new("some/blob", data(b""));
        let formatted = format!("{handle:?}");
        assert!(formatted.contains("some/blob"));
        assert!(formatted.contains("Untyped"));
    }
}
