mod asset;
pub use asset::*;

mod asset_types;
pub use asset_types::*;

mod asset_handle;
pub use asset_handle::*;

mod asset_cache;
pub use asset_cache::*;

mod type_importer;
pub use type_importer::*;

mod importer_registry;
pub use importer_registry::*;

mod config;
pub use config::*;

mod asset_watch;
pub use asset_watch::*;

mod assets;
pub use assets::*;

pub mod importers;
