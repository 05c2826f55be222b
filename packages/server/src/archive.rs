//! ZIP packaging of videos together with a plain-text metadata sheet.
//!
//! Archives are assembled in an anonymous temp file on a blocking thread.
//! Payloads are copied straight from the object store reader into the zip
//! writer, so memory use does not depend on video size.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;

use chrono::SecondsFormat;
use common::storage::{BlobStore, StorageError};
use tokio::runtime::Handle;
use tokio_util::io::SyncIoBridge;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::store::VideoRecord;
use crate::utils::filename::{archive_stem, video_extension};

pub const ALL_VIDEOS_ARCHIVE: &str = "all_videos_with_metadata.zip";
pub const SEARCH_ARCHIVE: &str = "videos_with_metadata.zip";
pub const FLAGGED_ARCHIVE: &str = "flagged_videos.zip";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("archive I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip encoding failed: {0}")]
    Zip(#[from] ZipError),
    #[error("archive task failed: {0}")]
    Task(String),
}

/// How entries are named inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `metadata.txt` and `<name>.<ext>`.
    Single,
    /// `<name>_<i>_metadata.txt` and `<name>_<i>.<ext>`, `i` starting at 1.
    Bulk,
}

impl Layout {
    fn entry_names(self, record: &VideoRecord, index: usize) -> (String, String) {
        let stem = archive_stem(&record.name);
        let ext = video_extension(record.content_type.as_deref());
        match self {
            Layout::Single => ("metadata.txt".to_string(), format!("{stem}.{ext}")),
            Layout::Bulk => (
                format!("{stem}_{index}_metadata.txt"),
                format!("{stem}_{index}.{ext}"),
            ),
        }
    }
}

/// Download file name for a single-video archive.
pub fn single_archive_name(record: &VideoRecord) -> String {
    format!("{}.zip", archive_stem(&record.name))
}

/// The metadata sheet stored next to each payload.
pub fn metadata_text(record: &VideoRecord) -> String {
    format!(
        "Video Name: {}\n\
         Uploader: {}\n\
         Description: {}\n\
         Tags: [{}]\n\
         Posted At: {}\n\
         Video ID: {}\n\
         Flagged Count: {}\n",
        record.name,
        record.uploader_username,
        record.description,
        record.tags.join(" "),
        record.posted_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        record.id,
        record.flag_count,
    )
}

/// A finished archive, rewound to the start.
pub struct Archive {
    pub file: File,
    pub len: u64,
}

/// Package `records` into a ZIP archive.
///
/// Must be called from within a multi-threaded tokio runtime.
pub async fn build(
    blobs: Arc<dyn BlobStore>,
    records: Vec<VideoRecord>,
    layout: Layout,
) -> Result<Archive, ArchiveError> {
    let handle = Handle::current();
    tokio::task::spawn_blocking(move || write_archive(&handle, &*blobs, &records, layout))
        .await
        .map_err(|e| ArchiveError::Task(e.to_string()))?
}

fn write_archive(
    handle: &Handle,
    blobs: &dyn BlobStore,
    records: &[VideoRecord],
    layout: Layout,
) -> Result<Archive, ArchiveError> {
    let mut zip = ZipWriter::new(tempfile::tempfile()?);

    for (i, record) in records.iter().enumerate() {
        let (metadata_name, payload_name) = layout.entry_names(record, i + 1);

        zip.start_file(
            metadata_name,
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        )?;
        zip.write_all(metadata_text(record).as_bytes())?;

        let reader = handle.block_on(blobs.get_stream(&record.object_id))?;
        let mut reader = SyncIoBridge::new_with_handle(reader, handle.clone());
        // Video containers are already compressed.
        zip.start_file(
            payload_name,
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Stored)
                .large_file(true),
        )?;
        std::io::copy(&mut reader, &mut zip)?;
    }

    let mut file = zip.finish()?;
    let len = file.seek(SeekFrom::End(0))?;
    file.seek(SeekFrom::Start(0))?;
    Ok(Archive { file, len })
}
