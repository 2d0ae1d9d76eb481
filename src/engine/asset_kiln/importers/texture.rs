use crate::{ImportRequest, ImportResult, TypeImporter};
use image::{DynamicImage, ImageFormat, RgbaImage};
use nab_kiln::format_binary;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

// Decoded RGBA8 pixels, rows top to bottom
pub struct Texture
{
    pub width: u32,
    pub height: u32,
    pub pixels: Box<[u8]>,
}
impl Texture
{
    #[inline] #[must_use]
    pub fn byte_len(&self) -> i64 { self.pixels.len() as i64 }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]>
    {
        if x >= self.width || y >= self.height { return None; }
        let offset = ((y as usize * self.width as usize) + x as usize) * 4;
        let texel = self.pixels.get(offset..(offset + 4))?;
        Some([texel[0], texel[1], texel[2], texel[3]])
    }
}

#[derive(Default)]
pub struct TextureImporter
{
    decoded_bytes: AtomicI64,
}
impl TextureImporter
{
    // pixel bytes held by textures this importer produced (replaced textures are not subtracted)
    #[must_use]
    pub fn decoded_bytes(&self) -> i64 { self.decoded_bytes.load(Ordering::Relaxed) }

    fn decode(&self, request: &mut ImportRequest) -> ImportResult<Texture>
    {
        let encoded = request.read_to_end()?;
        let image = match ImageFormat::from_path(&request.path).ok()
        {
            Some(format) => image::load_from_memory_with_format(&encoded, format)?,
            None => image::load_from_memory(&encoded)?,
        };

        let rgba = image.to_rgba8();
        let texture = Texture
        {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw().into_boxed_slice(),
        };
        log::trace!("Decoded '{}' {}x{} ({:#}B)", request.name, texture.width, texture.height, format_binary!(texture.byte_len()));

        self.decoded_bytes.fetch_add(texture.byte_len(), Ordering::Relaxed);
        Ok(texture)
    }
}
impl TypeImporter for TextureImporter
{
    type Asset = Texture;
    const EXTENSIONS: &'static str = ".png,.jpg,.jpeg,.bmp";
    const SUPPORTS_UPDATE: bool = true;
    const SUPPORTS_SAVE: bool = true;

    fn import(&self, mut request: ImportRequest) -> ImportResult<Self::Asset>
    {
        self.decode(&mut request)
    }

    fn update(&self, existing: &Self::Asset, mut request: ImportRequest) -> ImportResult<Self::Asset>
    {
        let texture = self.decode(&mut request)?;
        self.decoded_bytes.fetch_sub(existing.byte_len(), Ordering::Relaxed);
        Ok(texture)
    }

    // encodes in the format the target path's extension names
    fn save(&self, asset: &Self::Asset, path: &Path, output: &mut dyn Write) -> ImportResult<()>
    {
        let format = ImageFormat::from_path(path)?;
        let rgba = RgbaImage::from_raw(asset.width, asset.height, asset.pixels.to_vec())
            .ok_or("Texture pixel buffer does not match its dimensions")?;

        let image = match format
        {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()),
            _ => DynamicImage::ImageRgba8(rgba),
        };

        let mut encoded = Cursor::new(Vec::<u8>::new());
        image.write_to(&mut encoded, format)?;
        output.write_all(encoded.get_ref())?;
        Ok(())
    }
}
