use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError
{
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}
impl Display for ConfigError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for ConfigError { }
impl From<std::io::Error> for ConfigError
{
    fn from(e: std::io::Error) -> Self { Self::Io(e) }
}
impl From<toml::de::Error> for ConfigError
{
    fn from(e: toml::de::Error) -> Self { Self::Parse(e) }
}
impl From<toml::ser::Error> for ConfigError
{
    fn from(e: toml::ser::Error) -> Self { Self::Serialize(e) }
}

pub trait TomlRead: DeserializeOwned
{
    fn load(reader: &mut impl Read) -> Result<Self, ConfigError>
    {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Ok(toml::from_str(&buf)?)
    }

    fn load_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError>
    {
        let mut file = std::fs::File::open(path.into())?;
        Self::load(&mut file)
    }
}
pub trait TomlWrite: Serialize
{
    fn save(&self, prettify: bool, writer: &mut impl Write) -> Result<(), ConfigError>
    {
        let toml = match prettify
        {
            true => toml::ser::to_string_pretty(self)?,
            false => toml::ser::to_string(self)?,
        };
        writer.write_all(toml.as_bytes())?;
        Ok(())
    }
}

// Where reloads triggered by the file watcher run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotReloadMode
{
    // changes are queued and applied by AssetManager::process_changes
    #[default]
    Queued,
    // changes are applied on the watcher's thread as they arrive
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig
{
    pub assets_root: PathBuf,
    pub enable_fs_watcher: bool,
    pub watch_debounce_ms: u64,
    pub hot_reload: HotReloadMode,
    pub scan_on_initialize: bool,
}
impl Default for AssetsConfig
{
    fn default() -> Self
    {
        Self
        {
            assets_root: PathBuf::from("assets"),
            enable_fs_watcher: false,
            watch_debounce_ms: 250,
            hot_reload: HotReloadMode::Queued,
            scan_on_initialize: true,
        }
    }
}
impl AssetsConfig
{
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self
    {
        Self { assets_root: root.into(), ..Default::default() }
    }

    #[inline] #[must_use]
    pub fn watch_debounce(&self) -> Duration { Duration::from_millis(self.watch_debounce_ms) }
}
impl TomlRead for AssetsConfig { }
impl TomlWrite for AssetsConfig { }
