//! Human-readable rendering of session results.

use quicksync_core::payload::{FileEntry, FolderListing};
use quicksync_core::{InfoItem, StorageReport};

/// Display layout for listing timestamps.
const LISTING_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn kib(bytes: u64) -> String {
    format!("{:.1} KiB", bytes as f64 / 1024.0)
}

pub fn info_line(item: &InfoItem) -> String {
    match &item.value {
        Ok(value) => format!("{}: {}", item.title, value),
        Err(e) => format!("{}: [ERROR: {}]", item.title, e),
    }
}

/// One aligned row: id, name, timestamp, permissions, size.
pub fn file_row(file: &FileEntry, name_width: usize) -> String {
    let modified = file
        .modified_at()
        .map(|t| t.format(LISTING_TIME_FORMAT).to_string())
        .unwrap_or_else(|| file.modified.clone());
    let size = file
        .size_bytes()
        .map(kib)
        .unwrap_or_else(|| file.size.clone());

    format!(
        "{:<4} {:<width$} {} {} {}",
        format!("{}:", file.fileid),
        file.name,
        modified,
        file.user_perm,
        size,
        width = name_width
    )
}

pub fn folder_block(folder: &str, listing: &FolderListing) -> Vec<String> {
    let mut lines = vec![String::new(), format!("=== {folder}")];
    lines.extend(
        listing
            .files
            .iter()
            .map(|f| file_row(f, listing.max_name_len)),
    );
    lines
}

pub fn storage_report(report: &StorageReport) -> Vec<String> {
    let mut lines = vec![
        format!("Total Space: {}", kib(report.memory.total as u64)),
        format!("Free Space: {}", kib(report.memory.free as u64)),
    ];
    for (folder, listing) in &report.folders {
        lines.extend(folder_block(folder, listing));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use quicksync_core::MemoryStatus;

    fn entry() -> FileEntry {
        FileEntry {
            name: "Bunny.jpg".into(),
            size: "10240".into(),
            fileid: "12".into(),
            modified: "20230115T093000".into(),
            user_perm: "RWD".into(),
            group_perm: "R".into(),
        }
    }

    #[test]
    fn test_kib() {
        assert_eq!(kib(10240), "10.0 KiB");
        assert_eq!(kib(1536), "1.5 KiB");
        assert_eq!(kib(0), "0.0 KiB");
    }

    #[test]
    fn test_file_row() {
        assert_eq!(
            file_row(&entry(), 12),
            "12:  Bunny.jpg    2023-01-15 09:30 RWD 10.0 KiB"
        );
    }

    #[test]
    fn test_file_row_keeps_unparsable_fields() {
        let file = FileEntry {
            modified: "unknown".into(),
            size: "?".into(),
            ..entry()
        };
        assert!(file_row(&file, 9).ends_with("unknown RWD ?"));
    }

    #[test]
    fn test_info_line() {
        let ok = InfoItem {
            title: "Manufacturer",
            value: Ok("Gigaset".into()),
        };
        let err = InfoItem {
            title: "Firmware URL",
            value: Err("Device answered ERROR".into()),
        };
        assert_eq!(info_line(&ok), "Manufacturer: Gigaset");
        assert_eq!(info_line(&err), "Firmware URL: [ERROR: Device answered ERROR]");
    }

    #[test]
    fn test_storage_report() {
        let report = StorageReport {
            memory: MemoryStatus {
                total: 2048,
                free: 1024,
            },
            folders: vec![(
                "/Pictures".into(),
                FolderListing {
                    files: vec![entry()],
                    max_name_len: 9,
                },
            )],
        };
        let lines = storage_report(&report);
        assert_eq!(lines[0], "Total Space: 2.0 KiB");
        assert_eq!(lines[1], "Free Space: 1.0 KiB");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "=== /Pictures");
        assert!(lines[4].starts_with("12:  Bunny.jpg"));
    }
}
