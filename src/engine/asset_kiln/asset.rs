use crate::{AnyAsset, Ash, AssetTypeId};
use std::io::{Read, Seek};
use std::path::{Component, Path};

pub trait Asset: Sync + Send + Sized + 'static
{
    fn asset_type() -> AssetTypeId;

    // wrap a handle into the cache's tagged union
    fn into_any(handle: Ash<Self>) -> AnyAsset;
    // None if the union holds a different kind
    fn from_any(any: &AnyAsset) -> Option<&Ash<Self>>;
}

pub trait AssetRead: Read + Seek + Send { }
impl<T: Read + Seek + Send> AssetRead for T { }

// The logical name of an asset: its path relative to the resources root, '/'-separated, without extension
pub fn asset_name_for_path(root: &Path, path: &Path) -> String
{
    let relative = path.strip_prefix(root).unwrap_or(path);
    let stemmed = relative.with_extension("");

    let mut name = String::new();
    for component in stemmed.components()
    {
        let part = match component
        {
            Component::Normal(part) => part.to_string_lossy(),
            Component::ParentDir => "..".into(),
            Component::Prefix(_) | Component::RootDir | Component::CurDir => continue,
        };
        if !name.is_empty() { name.push('/'); }
        name.push_str(&part);
    }
    name
}

// The extension of a path, including the leading dot (".png")
pub fn path_extension(path: &Path) -> Option<String>
{
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::path::PathBuf;

    mod names
    {
        use super::*;

        #[test]
        fn strips_root_and_extension()
        {
            let root = PathBuf::from("/game/resources");
            assert_eq!("a", asset_name_for_path(&root, &root.join("a.png")));
            assert_eq!("textures/wall", asset_name_for_path(&root, &root.join("textures/wall.jpg")));
        }

        #[test]
        fn keeps_inner_dots()
        {
            let root = PathBuf::from("/r");
            assert_eq!("fx/glow.v2", asset_name_for_path(&root, &root.join("fx/glow.v2.shader")));
        }

        #[test]
        fn outside_root()
        {
            let root = PathBuf::from("/r");
            assert_eq!("elsewhere/b", asset_name_for_path(&root, Path::new("/elsewhere/b.shader")));
            assert_eq!("c", asset_name_for_path(&root, Path::new("c.py")));
        }

        #[test]
        fn no_extension()
        {
            let root = PathBuf::from("/r");
            assert_eq!("LICENSE", asset_name_for_path(&root, &root.join("LICENSE")));
        }
    }

    mod extensions
    {
        use super::*;

        #[test]
        fn includes_dot()
        {
            assert_eq!(Some(".png".to_string()), path_extension(Path::new("a/b.png")));
            assert_eq!(Some(".gz".to_string()), path_extension(Path::new("a.tar.gz")));
        }

        #[test]
        fn case_preserved()
        {
            assert_eq!(Some(".PNG".to_string()), path_extension(Path::new("a.PNG")));
        }

        #[test]
        fn missing()
        {
            assert_eq!(None, path_extension(Path::new("Makefile")));
            assert_eq!(None, path_extension(Path::new(".gitignore")));
        }
    }
}
