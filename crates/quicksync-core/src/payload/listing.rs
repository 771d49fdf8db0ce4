//! Folder listing parsing.
//!
//! The handset answers a `x-obex/folder-listing` GET with a small XML
//! document. Only the `file` elements matter; their attributes are kept
//! verbatim and interpreted on demand.

use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::Event;
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Timestamp layout of the `modified` attribute.
pub const MODIFIED_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Invalid folder listing XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Invalid attribute in folder listing: {0}")]
    Attribute(#[from] AttrError),
    #[error("Folder listing is not UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// One `file` element of a folder listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size: String,
    pub fileid: String,
    pub modified: String,
    pub user_perm: String,
    pub group_perm: String,
}

impl FileEntry {
    /// Parse `modified`, if it holds a timestamp.
    pub fn modified_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.modified, MODIFIED_FORMAT).ok()
    }

    /// Parse `size`, if it holds a number.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.trim().parse().ok()
    }
}

/// Files found in one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub files: Vec<FileEntry>,
    /// Longest file name in characters, for column alignment.
    pub max_name_len: usize,
}

impl FolderListing {
    /// Parse a listing received as raw bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ListingError> {
        Self::parse(&String::from_utf8(data)?)
    }

    /// Collect every `file` element, at any depth. Other elements are ignored.
    pub fn parse(xml: &str) -> Result<Self, ListingError> {
        let mut reader = Reader::from_str(xml);
        let mut listing = FolderListing::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"file" => {
                    let mut entry = FileEntry::default();
                    for attr in e.attributes() {
                        let attr = attr?;
                        let value = attr.unescape_value()?.into_owned();
                        match attr.key.as_ref() {
                            b"name" => entry.name = value,
                            b"size" => entry.size = value,
                            b"fileid" => entry.fileid = value,
                            b"modified" => entry.modified = value,
                            b"user-perm" => entry.user_perm = value,
                            b"group-perm" => entry.group_perm = value,
                            _ => {}
                        }
                    }
                    listing.max_name_len = listing.max_name_len.max(entry.name.chars().count());
                    listing.files.push(entry);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const LISTING: &str = r#"<?xml version="1.0"?>
<!DOCTYPE folder-listing SYSTEM "obex-folder-listing.dtd">
<folder-listing version="1.0">
  <parent-folder/>
  <file name="Bunny.jpg" size="10240" fileid="12" modified="20230115T093000" user-perm="RWD" group-perm="R"/>
  <file name="Tom &amp; Jerry.bmp" size="2048" fileid="7" modified="20221231T235959" user-perm="R"></file>
  <folder name="sub"/>
</folder-listing>"#;

    #[test]
    fn test_parse_files() {
        let listing = FolderListing::parse(LISTING).unwrap();
        assert_eq!(listing.files.len(), 2);

        let bunny = &listing.files[0];
        assert_eq!(bunny.name, "Bunny.jpg");
        assert_eq!(bunny.fileid, "12");
        assert_eq!(bunny.user_perm, "RWD");
        assert_eq!(bunny.group_perm, "R");
        assert_eq!(bunny.size_bytes(), Some(10240));

        let tom = &listing.files[1];
        assert_eq!(tom.name, "Tom & Jerry.bmp");
        assert_eq!(tom.group_perm, "");
        assert_eq!(listing.max_name_len, "Tom & Jerry.bmp".len());
    }

    #[test]
    fn test_modified_timestamp() {
        let listing = FolderListing::parse(LISTING).unwrap();
        let at = listing.files[0].modified_at().unwrap();
        assert_eq!((at.year(), at.month(), at.day()), (2023, 1, 15));
        assert_eq!((at.hour(), at.minute()), (9, 30));

        let bad = FileEntry {
            modified: "yesterday".into(),
            ..Default::default()
        };
        assert!(bad.modified_at().is_none());
    }

    #[test]
    fn test_empty_folder() {
        let listing = FolderListing::parse("<folder-listing/>").unwrap();
        assert!(listing.files.is_empty());
        assert_eq!(listing.max_name_len, 0);
    }

    #[test]
    fn test_name_width_counts_characters() {
        let xml = r#"<folder-listing><file name="Klingelton-ä.mid"/></folder-listing>"#;
        let listing = FolderListing::parse(xml).unwrap();
        assert_eq!(listing.max_name_len, 16);
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            FolderListing::from_bytes(vec![0xFF, 0xFE]),
            Err(ListingError::Encoding(_))
        ));
    }
}
