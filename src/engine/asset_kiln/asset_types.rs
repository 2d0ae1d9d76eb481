use crate::importers::{Font, Material, Mesh, Script, Shader, Texture, UntypedData};
use crate::{Ash, Asset};

// Defines the closed set of asset kinds: the type ID enum, the cache's tagged union, and the Asset impls tying them together
macro_rules! define_asset_kinds
{
    ($($kind:ident = $id:literal => $payload:ty),+ $(,)?) =>
    {
        // All the supported asset types
        #[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum AssetTypeId
        {
            $($kind = $id,)+
        }
        impl AssetTypeId
        {
            pub const ALL: &'static [AssetTypeId] = &[$(AssetTypeId::$kind,)+];

            pub fn name(self) -> &'static str
            {
                match self
                {
                    $(AssetTypeId::$kind => stringify!($kind),)+
                }
            }
        }

        // A type-erased cache entry. Cloning clones the handle, not the payload
        #[derive(Clone)]
        pub enum AnyAsset
        {
            $($kind(Ash<$payload>),)+
        }
        impl AnyAsset
        {
            #[inline] #[must_use]
            pub fn asset_type(&self) -> AssetTypeId
            {
                match self
                {
                    $(AnyAsset::$kind(_) => AssetTypeId::$kind,)+
                }
            }

            #[inline] #[must_use]
            pub fn name(&self) -> &str
            {
                match self
                {
                    $(AnyAsset::$kind(h) => h.name(),)+
                }
            }

            #[inline] #[must_use]
            pub fn generation(&self) -> u64
            {
                match self
                {
                    $(AnyAsset::$kind(h) => h.generation(),)+
                }
            }

            // Do both refer to the same handle?
            #[must_use]
            pub fn ptr_eq(&self, other: &AnyAsset) -> bool
            {
                match (self, other)
                {
                    $((AnyAsset::$kind(a), AnyAsset::$kind(b)) => Ash::ptr_eq(a, b),)+
                    _ => false,
                }
            }

            #[inline] #[must_use]
            pub fn downcast<A: Asset>(&self) -> Option<Ash<A>>
            {
                A::from_any(self).cloned()
            }
        }
        impl std::fmt::Debug for AnyAsset
        {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
            {
                match self
                {
                    $(AnyAsset::$kind(h) => std::fmt::Debug::fmt(h, f),)+
                }
            }
        }

        $(
        impl Asset for $payload
        {
            #[inline]
            fn asset_type() -> AssetTypeId { AssetTypeId::$kind }
            #[inline]
            fn into_any(handle: Ash<Self>) -> AnyAsset { AnyAsset::$kind(handle) }
            #[inline]
            fn from_any(any: &AnyAsset) -> Option<&Ash<Self>>
            {
                match any
                {
                    AnyAsset::$kind(h) => Some(h),
                    _ => None,
                }
            }
        }
        )+
    }
}

define_asset_kinds!
{
    Untyped = 1 => UntypedData, // non-descript, untyped data
    Texture = 2 => Texture,
    Shader = 3 => Shader,
    Material = 4 => Material,
    Font = 5 => Font,
    Script = 6 => Script,
    Mesh = 7 => Mesh,
}
