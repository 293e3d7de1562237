//! Overall progress of a batch of uploads

use serde::{Deserialize, Serialize};

/// Progress of one file in a batch
///
/// Owned by the transport. The aggregator only reads snapshots of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEntry {
    pub directory_path: String,
    pub basename: String,
    /// Size in bytes
    pub size: u64,
    /// 0 to 100
    pub upload_percent: f64,
}

impl UploadEntry {
    pub fn new(
        directory_path: impl Into<String>,
        basename: impl Into<String>,
        size: u64,
        upload_percent: f64,
    ) -> Self {
        UploadEntry {
            directory_path: directory_path.into(),
            basename: basename.into(),
            size,
            upload_percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.upload_percent == 100.0
    }

    /// Bytes transferred so far
    pub fn uploaded_bytes(&self) -> f64 {
        self.size as f64 * self.upload_percent / 100.0
    }

    /// Directory and basename joined with `/`
    pub fn path(&self) -> String {
        if self.directory_path.is_empty() {
            self.basename.clone()
        } else {
            format!(
                "{}/{}",
                self.directory_path.trim_end_matches('/'),
                self.basename
            )
        }
    }
}

/// Summary recomputed from scratch on every call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub completed_file_count: usize,
    pub remaining_file_count: usize,
    pub total_file_count: usize,
    /// Byte-weighted, rounded to one decimal
    pub upload_percent: f64,
}

impl UploadProgress {
    pub fn is_complete(&self) -> bool {
        self.remaining_file_count == 0
    }
}

/// Round half away from zero to one decimal place
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Aggregate per-file progress into one summary
///
/// Files are weighted by size. A batch with no bytes to send (including an
/// empty one) reports 100%.
pub fn get_upload_progress(entries: &[UploadEntry]) -> UploadProgress {
    let total_file_count = entries.len();
    let completed_file_count = entries.iter().filter(|e| e.is_complete()).count();

    // u64 sizes can overflow when summed
    let total_size: u128 = entries.iter().map(|e| u128::from(e.size)).sum();
    let upload_percent = if total_size == 0 {
        100.0
    } else {
        let uploaded: f64 = entries.iter().map(UploadEntry::uploaded_bytes).sum();
        round_one_decimal(uploaded / total_size as f64 * 100.0)
    };

    UploadProgress {
        completed_file_count,
        remaining_file_count: total_file_count - completed_file_count,
        total_file_count,
        upload_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch() {
        let progress = get_upload_progress(&[]);
        assert_eq!(progress.completed_file_count, 0);
        assert_eq!(progress.remaining_file_count, 0);
        assert_eq!(progress.total_file_count, 0);
        assert_eq!(progress.upload_percent, 100.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_weighted_by_size() {
        let entries = [
            UploadEntry::new("dir", "small.bin", 100, 50.0),
            UploadEntry::new("dir", "large.bin", 300, 100.0),
        ];
        let progress = get_upload_progress(&entries);
        assert_eq!(progress.upload_percent, 87.5);
        assert_eq!(progress.completed_file_count, 1);
        assert_eq!(progress.remaining_file_count, 1);
        assert_eq!(progress.total_file_count, 2);
    }

    #[test]
    fn test_zero_byte_files() {
        let entries = [
            UploadEntry::new("", "a", 0, 0.0),
            UploadEntry::new("", "b", 0, 100.0),
        ];
        let progress = get_upload_progress(&entries);
        assert_eq!(progress.upload_percent, 100.0);
        assert_eq!(progress.completed_file_count, 1);
    }

    #[test]
    fn test_rounds_to_one_decimal() {
        // 1/3 of the bytes
        let entries = [
            UploadEntry::new("", "a", 1, 100.0),
            UploadEntry::new("", "b", 2, 0.0),
        ];
        assert_eq!(get_upload_progress(&entries).upload_percent, 33.3);

        assert_eq!(round_one_decimal(12.25), 12.3);
        assert_eq!(round_one_decimal(99.94), 99.9);
    }

    #[test]
    fn test_sizes_near_u64_max() {
        let entries = [
            UploadEntry::new("", "huge", u64::MAX, 50.0),
            UploadEntry::new("", "tiny", 1, 0.0),
        ];
        let progress = get_upload_progress(&entries);
        assert_eq!(progress.upload_percent, 50.0);
        assert_eq!(progress.remaining_file_count, 2);

        let all_done = [
            UploadEntry::new("", "a", u64::MAX, 100.0),
            UploadEntry::new("", "b", u64::MAX, 100.0),
        ];
        assert_eq!(get_upload_progress(&all_done).upload_percent, 100.0);
    }

    #[test]
    fn test_idempotent() {
        let entries = [
            UploadEntry::new("x", "a", 10, 10.0),
            UploadEntry::new("x", "b", 20, 70.0),
        ];
        assert_eq!(get_upload_progress(&entries), get_upload_progress(&entries));
    }

    #[test]
    fn test_entry_path() {
        assert_eq!(UploadEntry::new("a/b/", "c.txt", 1, 0.0).path(), "a/b/c.txt");
        assert_eq!(UploadEntry::new("", "c.txt", 1, 0.0).path(), "c.txt");
    }
}
