use asset_kiln::AssetsConfig;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// A resources root on disk that goes away with the value
pub struct FixtureTree
{
    dir: TempDir,
}
impl FixtureTree
{
    pub fn new() -> Self
    {
        Self { dir: tempfile::tempdir().expect("Failed to create fixture dir") }
    }

    // a.png, b.shader (with its stage scripts) and c.unknown
    pub fn standard() -> Self
    {
        let tree = Self::new();
        tree.write_png("a.png", 2, 2, [255, 0, 0, 255]);
        tree.write("b.vert", "void vs_main() { }");
        tree.write("b.frag", "void ps_main() { }");
        tree.write("b.shader", "b.vert\nb.frag\n");
        tree.write("c.unknown", "???");
        tree
    }

    pub fn root(&self) -> &Path { self.dir.path() }

    pub fn path(&self, file: &str) -> PathBuf { self.dir.path().join(file) }

    pub fn config(&self) -> AssetsConfig { AssetsConfig::with_root(self.root()) }

    pub fn write(&self, file: &str, content: impl AsRef<[u8]>)
    {
        let path = self.path(file);
        if let Some(parent) = path.parent()
        {
            std::fs::create_dir_all(parent).expect("Failed to create fixture subdirectory");
        }
        std::fs::write(path, content).expect("Failed to write fixture file");
    }

    pub fn write_png(&self, file: &str, width: u32, height: u32, color: [u8; 4])
    {
        self.write(file, png_bytes(width, height, color));
    }
}

pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8>
{
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut encoded = Cursor::new(Vec::<u8>::new());
    image.write_to(&mut encoded, ImageFormat::Png).expect("Failed to encode PNG fixture");
    encoded.into_inner()
}
