use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

#[cfg(feature = "hot_reloading")]
use
{
    notify::event::{ModifyKind, RenameMode},
    notify::{EventKind, RecommendedWatcher, RecursiveMode},
    notify_debouncer_full::{Debouncer, RecommendedCache},
    std::path::Path,
    std::time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetChangeKind
{
    Created,
    Modified,
    Removed,
    Renamed, // path is the new name
}

// A single file system change under the resources root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetChange
{
    pub path: PathBuf,
    pub kind: AssetChangeKind,
}
impl AssetChange
{
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: AssetChangeKind) -> Self
    {
        Self { path: path.into(), kind }
    }
}

#[derive(Debug)]
pub enum WatchError
{
    #[cfg(feature = "hot_reloading")]
    Notify(notify::Error),
    Unsupported, // built without hot_reloading
    AlreadyWatching,
    Uninitialized,
}
impl Display for WatchError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for WatchError { }
#[cfg(feature = "hot_reloading")]
impl From<notify::Error> for WatchError
{
    fn from(e: notify::Error) -> Self { Self::Notify(e) }
}

#[cfg(feature = "hot_reloading")]
pub type AssetWatcher = Debouncer<RecommendedWatcher, RecommendedCache>;

// Map a raw notify event to the change it represents for assets, if any
#[cfg(feature = "hot_reloading")]
#[must_use]
pub fn change_from_event(event: &notify::Event) -> Option<AssetChange>
{
    let kind = match event.kind
    {
        EventKind::Create(_) => AssetChangeKind::Created,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => AssetChangeKind::Modified,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => AssetChangeKind::Removed,
        EventKind::Modify(ModifyKind::Name(_)) => AssetChangeKind::Renamed,
        EventKind::Remove(_) => AssetChangeKind::Removed,
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) | EventKind::Any | EventKind::Other => return None,
    };

    // renames carrying both paths list the destination last
    let path = match kind
    {
        AssetChangeKind::Renamed => event.paths.last(),
        _ => event.paths.first(),
    }?;
    Some(AssetChange::new(path.clone(), kind))
}

// Watch root recursively, handing each debounced change to sink (on the debouncer's thread)
#[cfg(feature = "hot_reloading")]
pub fn try_fs_watch(root: &Path, debounce: Duration, sink: impl Fn(AssetChange) + Send + 'static) -> Result<AssetWatcher, WatchError>
{
    let mut fs_watcher = notify_debouncer_full::new_debouncer(
        debounce,
        None,
        move |evt: notify_debouncer_full::DebounceEventResult|
        {
            match evt
            {
                Ok(events) =>
                {
                    for event in events
                    {
                        if let Some(change) = change_from_event(&event.event)
                        {
                            log::trace!("FS change: {change:?}");
                            sink(change);
                        }
                    }
                },
                Err(errors) =>
                {
                    for e in errors
                    {
                        log::error!("FS watch error: {e:?}");
                    }
                }
            }
        })?;

    fs_watcher.watch(root, RecursiveMode::Recursive)?;
    log::debug!("Watching {root:?} for changes");
    Ok(fs_watcher)
}

#[cfg(all(test, feature = "hot_reloading"))]
mod tests
{
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use notify::Event;

    fn event(kind: EventKind, paths: &[&str]) -> Event
    {
        let mut event = Event::new(kind);
        for p in paths
        {
            event = event.add_path(PathBuf::from(p));
        }
        event
    }

    mod change_from_event
    {
        use super::*;

        #[test]
        fn created_and_modified()
        {
            assert_eq!(Some(AssetChange::new("a.png", AssetChangeKind::Created)),
                change_from_event(&event(EventKind::Create(CreateKind::File), &["a.png"])));
            assert_eq!(Some(AssetChange::new("a.png", AssetChangeKind::Modified)),
                change_from_event(&event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["a.png"])));
            assert_eq!(Some(AssetChange::new("a.png", AssetChangeKind::Modified)),
                change_from_event(&event(EventKind::Modify(ModifyKind::Any), &["a.png"])));
        }

        #[test]
        fn renames()
        {
            assert_eq!(Some(AssetChange::new("new.png", AssetChangeKind::Renamed)),
                change_from_event(&event(EventKind::Modify(ModifyKind::Name(RenameMode::Both)), &["old.png", "new.png"])));
            assert_eq!(Some(AssetChange::new("new.png", AssetChangeKind::Renamed)),
                change_from_event(&event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &["new.png"])));
            assert_eq!(Some(AssetChange::new("old.png", AssetChangeKind::Removed)),
                change_from_event(&event(EventKind::Modify(ModifyKind::Name(RenameMode::From)), &["old.png"])));
        }

        #[test]
        fn removed()
        {
            assert_eq!(Some(AssetChange::new("a.png", AssetChangeKind::Removed)),
                change_from_event(&event(EventKind::Remove(RemoveKind::File), &["a.png"])));
        }

        #[test]
        fn ignored()
        {
            assert_eq!(None, change_from_event(&event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)), &["a.png"])));
            assert_eq!(None, change_from_event(&event(EventKind::Access(AccessKind::Any), &["a.png"])));
            assert_eq!(None, change_from_event(&event(EventKind::Other, &["a.png"])));
        }

        #[test]
        fn no_paths()
        {
            assert_eq!(None, change_from_event(&event(EventKind::Create(CreateKind::Any), &[])));
        }
    }

    #[test]
    fn watch_missing_root()
    {
        let result = try_fs_watch(Path::new("/definitely/not/here"), Duration::from_millis(10), |_| { });
        assert!(matches!(result, Err(WatchError::Notify(_))));
    }
}
