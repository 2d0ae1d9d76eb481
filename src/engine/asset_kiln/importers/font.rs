use crate::{ImportRequest, ImportResult, TypeImporter};
use std::io::Write;
use std::path::Path;

pub const DEFAULT_FONT_PIXEL_SIZE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat
{
    TrueType,
    OpenType,
    Collection,
}
impl FontFormat
{
    // sniff the sfnt version tag
    #[must_use]
    pub fn detect(face_data: &[u8]) -> Option<Self>
    {
        match face_data.get(0..4)?
        {
            b"\x00\x01\x00\x00" | b"true" => Some(Self::TrueType),
            b"OTTO" => Some(Self::OpenType),
            b"ttcf" => Some(Self::Collection),
            _ => None,
        }
    }
}

// Raw font face data. Rasterizing is left to the consumer
pub struct Font
{
    pub face_data: Box<[u8]>,
    pub pixel_size: f32,
    pub format: FontFormat,
}
impl Font
{
    // the table count from the offset table; collections report 0. None if the face is too short to hold one
    #[must_use]
    pub fn num_tables(&self) -> Option<u16>
    {
        match self.format
        {
            FontFormat::Collection => Some(0),
            _ => match self.face_data.get(4..6)?
            {
                &[hi, lo] => Some(u16::from_be_bytes([hi, lo])),
                _ => None,
            },
        }
    }
}

#[derive(Debug)]
struct InvalidFontData(&'static str);
impl std::fmt::Display for InvalidFontData
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.0) }
}
impl std::error::Error for InvalidFontData { }

pub struct FontImporter
{
    pub pixel_size: f32,
}
impl Default for FontImporter
{
    fn default() -> Self { Self { pixel_size: DEFAULT_FONT_PIXEL_SIZE } }
}
impl FontImporter
{
    fn decode(&self, request: &mut ImportRequest, pixel_size: f32) -> ImportResult<Font>
    {
        let face_data = request.read_to_end()?;
        // the offset table alone is 12 bytes
        if face_data.len() < 12
        {
            return Err(Box::new(InvalidFontData("Font data is truncated")));
        }
        let format = FontFormat::detect(&face_data).ok_or(InvalidFontData("Unrecognized font signature"))?;
        Ok(Font { face_data: face_data.into_boxed_slice(), pixel_size, format })
    }
}
impl TypeImporter for FontImporter
{
    type Asset = Font;
    const EXTENSIONS: &'static str = ".ttf,.otf";
    const SUPPORTS_UPDATE: bool = true;
    const SUPPORTS_SAVE: bool = true;

    fn import(&self, mut request: ImportRequest) -> ImportResult<Self::Asset>
    {
        self.decode(&mut request, self.pixel_size)
    }

    // keeps whatever pixel size the existing font was given
    fn update(&self, existing: &Self::Asset, mut request: ImportRequest) -> ImportResult<Self::Asset>
    {
        self.decode(&mut request, existing.pixel_size)
    }

    fn save(&self, asset: &Self::Asset, _path: &Path, output: &mut dyn Write) -> ImportResult<()>
    {
        output.write_all(&asset.face_data)?;
        Ok(())
    }
}
