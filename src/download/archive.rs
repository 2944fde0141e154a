//! In-memory ZIP packaging.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::fs::make_unique_name;

/// One file to put in an archive.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub filename: String,
    pub data: Vec<u8>,
}

impl ZipEntry {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// Builds uncompressed archives. Media is already compressed, so entries are stored.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipPackager;

impl ZipPackager {
    pub fn new() -> Self {
        Self
    }

    /// Package `entries` in order. Repeated names get `_1`, `_2`, ... suffixes.
    pub fn package(&self, entries: &[ZipEntry]) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(zip::DateTime::default());

        let mut taken = HashSet::with_capacity(entries.len());
        for entry in entries {
            let name = make_unique_name(&entry.filename, &mut taken);
            writer.start_file(name, options)?;
            writer.write_all(&entry.data)?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_back(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn test_package_preserves_order_and_content() {
        let bytes = ZipPackager::new()
            .package(&[
                ZipEntry::new("alice_1_1.jpg", b"first".to_vec()),
                ZipEntry::new("alice_1_2.mp4", b"second".to_vec()),
            ])
            .unwrap();

        let files = read_back(bytes);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], ("alice_1_1.jpg".to_string(), b"first".to_vec()));
        assert_eq!(files[1].0, "alice_1_2.mp4");
    }

    #[test]
    fn test_duplicate_names_are_suffixed() {
        let bytes = ZipPackager::new()
            .package(&[
                ZipEntry::new("a.jpg", vec![1]),
                ZipEntry::new("a.jpg", vec![2]),
                ZipEntry::new("a.jpg", vec![3]),
            ])
            .unwrap();

        let names: Vec<_> = read_back(bytes).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a.jpg", "a_1.jpg", "a_2.jpg"]);
    }

    #[test]
    fn test_empty_input_is_valid_archive() {
        let bytes = ZipPackager::new().package(&[]).unwrap();
        assert!(read_back(bytes).is_empty());
    }

    #[test]
    fn test_output_is_deterministic() {
        let entries = [ZipEntry::new("x.png", vec![9; 64])];
        let packager = ZipPackager::new();
        assert_eq!(
            packager.package(&entries).unwrap(),
            packager.package(&entries).unwrap()
        );
    }
}
