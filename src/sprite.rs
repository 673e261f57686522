//! Sprite archives: the descriptor plus every animation sheet
//!
//! A sprite is a flat set of files, shipped as a zip archive or kept as a
//! directory in the accepted-asset cache:
//!
//! - `AnimData.xml`, the animation descriptor
//! - `<Anim>-Anim.png`, the visible frames
//! - `<Anim>-Offsets.png`, head/hand/center markers per frame
//! - `<Anim>-Shadow.png`, the shadow marker per frame
//!
//! Entry names are reduced to their file name; directory entries are ignored.

use image::RgbaImage;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::descriptor::{AnimDescriptor, DescriptorError, DESCRIPTOR_FILE};
use crate::output::{decode_png, encode_png};
use crate::registry::AnimRegistry;

/// Failure to read or write a sprite archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode '{file}': {message}")]
    Image { file: String, message: String },
    #[error("missing '{0}'")]
    MissingEntry(String),
    #[error("'{0}' appears more than once")]
    DuplicateEntry(String),
    #[error("invalid path pattern: {0}")]
    Pattern(String),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// The three sheets every concrete animation ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SheetKind {
    Anim,
    Offsets,
    Shadow,
}

impl SheetKind {
    pub const ALL: [SheetKind; 3] = [SheetKind::Anim, SheetKind::Offsets, SheetKind::Shadow];

    pub fn suffix(self) -> &'static str {
        match self {
            SheetKind::Anim => "Anim",
            SheetKind::Offsets => "Offsets",
            SheetKind::Shadow => "Shadow",
        }
    }

    /// File name of this sheet for an animation.
    pub fn file_name(self, anim: &str) -> String {
        format!("{}-{}.png", anim, self.suffix())
    }

    /// Split `Walk-Anim.png` into (`Walk`, Anim).
    pub fn parse_file_name(file: &str) -> Option<(&str, SheetKind)> {
        let stem = file.strip_suffix(".png")?;
        let (anim, suffix) = stem.rsplit_once('-')?;
        let kind = SheetKind::ALL.into_iter().find(|k| k.suffix() == suffix)?;
        Some((anim, kind))
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A decoded sprite: descriptor, sheets and any other files.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSet {
    pub descriptor: AnimDescriptor,
    /// Descriptor exactly as shipped
    pub descriptor_bytes: Vec<u8>,
    /// PNG file name -> decoded image
    sheets: BTreeMap<String, RgbaImage>,
    /// Any other file name -> raw bytes
    files: BTreeMap<String, Vec<u8>>,
}

impl SpriteSet {
    /// Assemble from already-decoded parts. The descriptor is stored in
    /// its serialized form.
    pub fn new(descriptor: AnimDescriptor, sheets: BTreeMap<String, RgbaImage>) -> Result<Self, ArchiveError> {
        let descriptor_bytes = descriptor.serialize()?.into_bytes();
        Ok(Self { descriptor, descriptor_bytes, sheets, files: BTreeMap::new() })
    }

    /// Decode a sprite from zip bytes.
    pub fn from_zip(bytes: &[u8], registry: &AnimRegistry) -> Result<Self, ArchiveError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = base_name(entry.name()).to_string();
            if name.is_empty() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            entries.push((name, data));
        }

        Self::from_entries(entries, registry)
    }

    /// Load a sprite from a directory (non-recursive).
    pub fn from_dir(dir: &Path, registry: &AnimRegistry) -> Result<Self, ArchiveError> {
        let pattern = format!("{}/*", glob::Pattern::escape(&dir.to_string_lossy()));
        let paths = glob::glob(&pattern).map_err(|e| ArchiveError::Pattern(e.to_string()))?;

        let mut entries = Vec::new();
        for path in paths {
            let path = path.map_err(|e| ArchiveError::Io(e.into_error()))?;
            if !path.is_file() {
                continue;
            }
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            entries.push((name, fs::read(&path)?));
        }

        Self::from_entries(entries, registry)
    }

    /// Load from a directory or a zip file, whichever `path` is.
    pub fn load(path: &Path, registry: &AnimRegistry) -> Result<Self, ArchiveError> {
        if path.is_dir() {
            Self::from_dir(path, registry)
        } else {
            Self::from_zip(&fs::read(path)?, registry)
        }
    }

    fn from_entries(entries: Vec<(String, Vec<u8>)>, registry: &AnimRegistry) -> Result<Self, ArchiveError> {
        let mut descriptor_bytes = None;
        let mut sheets = BTreeMap::new();
        let mut files = BTreeMap::new();

        for (name, data) in entries {
            if sheets.contains_key(&name) || files.contains_key(&name) {
                return Err(ArchiveError::DuplicateEntry(name));
            }
            if name == DESCRIPTOR_FILE {
                if descriptor_bytes.replace(data).is_some() {
                    return Err(ArchiveError::DuplicateEntry(name));
                }
            } else if name.to_ascii_lowercase().ends_with(".png") {
                let image = decode_png(&data)
                    .map_err(|e| ArchiveError::Image { file: name.clone(), message: e.to_string() })?;
                sheets.insert(name, image);
            } else {
                files.insert(name, data);
            }
        }

        let descriptor_bytes =
            descriptor_bytes.ok_or_else(|| ArchiveError::MissingEntry(DESCRIPTOR_FILE.to_string()))?;
        let descriptor = AnimDescriptor::parse(&descriptor_bytes, registry)?;

        log::debug!(
            "loaded sprite: {} animations, {} sheets, {} other files",
            descriptor.animations().len(),
            sheets.len(),
            files.len()
        );
        Ok(Self { descriptor, descriptor_bytes, sheets, files })
    }

    /// Encode back into a zip archive. The descriptor is written verbatim.
    pub fn to_zip(&self) -> Result<Vec<u8>, ArchiveError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        writer.start_file(DESCRIPTOR_FILE, options)?;
        writer.write_all(&self.descriptor_bytes)?;

        for (name, image) in &self.sheets {
            let png = encode_png(image)
                .map_err(|e| ArchiveError::Image { file: name.clone(), message: e.to_string() })?;
            writer.start_file(name.as_str(), options)?;
            writer.write_all(&png)?;
        }
        for (name, data) in &self.files {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    /// One sheet of an animation, by the name the descriptor uses.
    pub fn sheet(&self, anim: &str, kind: SheetKind) -> Option<&RgbaImage> {
        self.sheets.get(&kind.file_name(anim))
    }

    /// Every sheet, by file name.
    pub fn sheets(&self) -> &BTreeMap<String, RgbaImage> {
        &self.sheets
    }

    /// Non-PNG files other than the descriptor.
    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }

    /// Every Anim sheet of a concrete animation, in document order.
    pub fn anim_sheets(&self) -> impl Iterator<Item = (&str, &RgbaImage)> {
        self.descriptor
            .concrete()
            .filter_map(|anim| self.sheet(&anim.name, SheetKind::Anim).map(|img| (anim.name.as_str(), img)))
    }

    /// Replace (or add) a sheet.
    pub fn insert_sheet(&mut self, anim: &str, kind: SheetKind, image: RgbaImage) {
        self.sheets.insert(kind.file_name(anim), image);
    }

    /// PNG files that belong to no concrete animation.
    pub fn stray_sheets(&self) -> Vec<&str> {
        self.sheets
            .keys()
            .filter(|name| match SheetKind::parse_file_name(name) {
                Some((anim, _)) => self.descriptor.get(anim).map_or(true, |a| a.is_alias() || a.name != anim),
                None => true,
            })
            .map(String::as_str)
            .collect()
    }
}

fn base_name(entry: &str) -> &str {
    entry.rsplit(['/', '\\']).next().unwrap_or(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::AnimationDescriptor;
    use image::Rgba;

    fn tiny_set() -> SpriteSet {
        let registry = AnimRegistry::standard();
        let descriptor = AnimDescriptor::from_entries(
            1,
            vec![AnimationDescriptor::new("Walk", 0, (4, 4), vec![2])],
            &registry,
        )
        .unwrap();
        let mut sheets = BTreeMap::new();
        let mut anim = RgbaImage::new(4, 4);
        anim.put_pixel(1, 1, Rgba([50, 60, 70, 255]));
        sheets.insert("Walk-Anim.png".to_string(), anim);
        sheets.insert("Walk-Offsets.png".to_string(), RgbaImage::new(4, 4));
        sheets.insert("Walk-Shadow.png".to_string(), RgbaImage::new(4, 4));
        SpriteSet::new(descriptor, sheets).unwrap()
    }

    #[test]
    fn test_sheet_file_names() {
        assert_eq!(SheetKind::Offsets.file_name("Walk"), "Walk-Offsets.png");
        assert_eq!(SheetKind::parse_file_name("Lost-Balance-Anim.png"), Some(("Lost-Balance", SheetKind::Anim)));
        assert_eq!(SheetKind::parse_file_name("Walk-Extra.png"), None);
        assert_eq!(SheetKind::parse_file_name("notes.txt"), None);
    }

    #[test]
    fn test_zip_round_trip() {
        let set = tiny_set();
        let bytes = set.to_zip().unwrap();
        let back = SpriteSet::from_zip(&bytes, &AnimRegistry::standard()).unwrap();
        assert_eq!(back, set);
        assert_eq!(back.sheet("Walk", SheetKind::Anim).unwrap().get_pixel(1, 1)[0], 50);
    }

    #[test]
    fn test_nested_entries_are_flattened() {
        let set = tiny_set();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.add_directory("0025/", options).unwrap();
        writer.start_file("0025/AnimData.xml", options).unwrap();
        writer.write_all(&set.descriptor_bytes).unwrap();
        for (name, image) in set.sheets() {
            writer.start_file(format!("0025/{}", name), options).unwrap();
            writer.write_all(&encode_png(image).unwrap()).unwrap();
        }
        let bytes = writer.finish().unwrap().into_inner();

        let back = SpriteSet::from_zip(&bytes, &AnimRegistry::standard()).unwrap();
        assert_eq!(back.sheets().len(), 3);
    }

    #[test]
    fn test_missing_descriptor() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("Walk-Anim.png", SimpleFileOptions::default()).unwrap();
        writer.write_all(&encode_png(&RgbaImage::new(1, 1)).unwrap()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = SpriteSet::from_zip(&bytes, &AnimRegistry::standard()).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingEntry(ref f) if f == DESCRIPTOR_FILE));
    }

    #[test]
    fn test_not_a_zip() {
        let err = SpriteSet::from_zip(b"PK? no", &AnimRegistry::standard()).unwrap_err();
        assert!(matches!(err, ArchiveError::Zip(_)));
    }

    #[test]
    fn test_undecodable_png() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("AnimData.xml", options).unwrap();
        writer.write_all(&tiny_set().descriptor_bytes).unwrap();
        writer.start_file("Walk-Anim.png", options).unwrap();
        writer.write_all(b"garbage").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = SpriteSet::from_zip(&bytes, &AnimRegistry::standard()).unwrap_err();
        assert!(matches!(err, ArchiveError::Image { ref file, .. } if file == "Walk-Anim.png"));
    }

    #[test]
    fn test_from_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let set = tiny_set();
        fs::write(temp.path().join(DESCRIPTOR_FILE), &set.descriptor_bytes).unwrap();
        for (name, image) in set.sheets() {
            image.save(temp.path().join(name)).unwrap();
        }
        fs::write(temp.path().join("credits.txt"), b"someone").unwrap();

        let back = SpriteSet::load(temp.path(), &AnimRegistry::standard()).unwrap();
        assert_eq!(back.sheets(), set.sheets());
        assert_eq!(back.files().get("credits.txt").map(Vec::as_slice), Some(&b"someone"[..]));
    }

    #[test]
    fn test_stray_sheets() {
        let mut set = tiny_set();
        set.insert_sheet("Idle", SheetKind::Anim, RgbaImage::new(1, 1));
        set.sheets.insert("preview.png".to_string(), RgbaImage::new(1, 1));
        assert_eq!(set.stray_sheets(), vec!["Idle-Anim.png", "preview.png"]);
    }
}
