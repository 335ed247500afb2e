// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload queue boundary.
//
// The queue itself (adding, removing, reordering, uploading) belongs to the
// host application. Sessions only need to read the file at an index and,
// after a successful commit, swap in the enhanced bytes at that same index.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use glanz_core::error::{GlanzError, Result};
use glanz_core::{EncodedImage, SourceImage};

/// What an edit session needs from the host's upload queue.
pub trait UploadQueue {
    /// The file currently queued at `index`, as the editor should see it.
    fn source_at(&self, index: usize) -> Option<SourceImage>;

    /// Replace the file at `index` with `image`.
    fn replace(&mut self, index: usize, image: EncodedImage) -> Result<()>;
}

/// One queued upload: the file as picked, plus an optional enhanced
/// replacement.
#[derive(Debug, Clone)]
pub struct FileQueueEntry {
    original: SourceImage,
    replacement: Option<EncodedImage>,
    replaced_at: Option<DateTime<Utc>>,
}

impl FileQueueEntry {
    pub fn new(original: SourceImage) -> Self {
        Self {
            original,
            replacement: None,
            replaced_at: None,
        }
    }

    pub fn original(&self) -> &SourceImage {
        &self.original
    }

    pub fn replacement(&self) -> Option<&EncodedImage> {
        self.replacement.as_ref()
    }

    /// When the current replacement was swapped in.
    pub fn replaced_at(&self) -> Option<DateTime<Utc>> {
        self.replaced_at
    }

    pub fn is_enhanced(&self) -> bool {
        self.replacement.is_some()
    }

    /// Bytes that will be uploaded.
    pub fn effective_bytes(&self) -> &[u8] {
        match &self.replacement {
            Some(image) => &image.bytes,
            None => self.original.bytes(),
        }
    }

    /// MIME type that will be sent with the upload.
    pub fn effective_mime(&self) -> &str {
        match &self.replacement {
            Some(image) => image.mime_type(),
            None => self.original.mime(),
        }
    }

    /// Upload filename. Enhancing keeps the name the user picked.
    pub fn filename(&self) -> &str {
        self.original.filename()
    }

    /// Hex SHA-256 of the bytes that will be uploaded.
    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(self.effective_bytes()))
    }

    /// The file as the editor should open it: the latest enhanced version if
    /// there is one, so a second edit builds on the first.
    pub fn current_source(&self) -> SourceImage {
        match &self.replacement {
            Some(image) => SourceImage::new(
                image.bytes.clone(),
                image.mime_type(),
                self.original.filename(),
            ),
            None => self.original.clone(),
        }
    }

    fn replace(&mut self, image: EncodedImage) {
        self.replacement = Some(image);
        self.replaced_at = Some(Utc::now());
    }
}

impl UploadQueue for Vec<FileQueueEntry> {
    fn source_at(&self, index: usize) -> Option<SourceImage> {
        self.get(index).map(FileQueueEntry::current_source)
    }

    #[instrument(skip(self, image), fields(len = self.len(), encoded_len = image.bytes.len()))]
    fn replace(&mut self, index: usize, image: EncodedImage) -> Result<()> {
        let len = self.len();
        let entry = self.get_mut(index).ok_or_else(|| {
            GlanzError::QueueEntry(format!("no queued file at index {index} (queue has {len})"))
        })?;
        entry.replace(image);
        debug!(index, hash = %entry.content_hash(), "queue entry replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glanz_core::MediaType;

    fn entry(name: &str) -> FileQueueEntry {
        FileQueueEntry::new(SourceImage::new(vec![1, 2, 3], "image/png", name))
    }

    fn jpeg(bytes: Vec<u8>) -> EncodedImage {
        EncodedImage {
            bytes,
            media_type: MediaType::Jpeg,
            filename: "scan.png".into(),
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn replace_swaps_bytes_and_mime_but_keeps_name() {
        let mut queue = vec![entry("a.png"), entry("scan.png")];
        let before = queue[1].content_hash();

        queue.replace(1, jpeg(vec![0xFF, 0xD8, 0xFF])).unwrap();

        assert!(queue[1].is_enhanced());
        assert!(queue[1].replaced_at().is_some());
        assert_eq!(queue[1].effective_mime(), "image/jpeg");
        assert_eq!(queue[1].effective_bytes(), &[0xFF, 0xD8, 0xFF]);
        assert_eq!(queue[1].filename(), "scan.png");
        assert_ne!(queue[1].content_hash(), before);
        assert!(!queue[0].is_enhanced());
    }

    #[test]
    fn replace_out_of_range_leaves_queue_alone() {
        let mut queue = vec![entry("a.png")];
        let err = queue.replace(3, jpeg(vec![9])).unwrap_err();
        assert!(matches!(err, GlanzError::QueueEntry(_)));
        assert!(!queue[0].is_enhanced());
    }

    #[test]
    fn source_at_prefers_replacement() {
        let mut queue = vec![entry("a.png")];
        assert_eq!(queue.source_at(0).unwrap().mime(), "image/png");
        queue.replace(0, jpeg(vec![7, 7])).unwrap();
        let source = queue.source_at(0).unwrap();
        assert_eq!(source.mime(), "image/jpeg");
        assert_eq!(source.bytes(), &[7, 7]);
        assert_eq!(source.filename(), "a.png");
        assert!(queue.source_at(1).is_none());
    }

    #[test]
    fn content_hash_is_sha256_hex() {
        let queued = FileQueueEntry::new(SourceImage::new(Vec::new(), "image/png", "empty.png"));
        assert_eq!(
            queued.content_hash(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
