// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of document and photo references.
//!
//! A reference is a local file path, an HTTP URL, or a Telegram file id.
//! Telegram accepts URLs in the same field as file ids.

use std::path::Path;

use teloxide::types::{FileId, InputFile};

/// How a stored reference will be uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSource {
    LocalFile,
    Remote,
}

/// Existing local paths are uploaded; anything else is passed by reference.
pub fn classify(reference: &str) -> MediaSource {
    if !reference.starts_with("http://")
        && !reference.starts_with("https://")
        && Path::new(reference).is_file()
    {
        MediaSource::LocalFile
    } else {
        MediaSource::Remote
    }
}

pub fn input_file(reference: &str) -> InputFile {
    match classify(reference) {
        MediaSource::LocalFile => InputFile::file(reference),
        MediaSource::Remote => InputFile::file_id(FileId(reference.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_file_is_uploaded() {
        let path = std::env::temp_dir().join(format!("flowershop-media-{}.pdf", std::process::id()));
        std::fs::write(&path, b"%PDF").unwrap();
        assert_eq!(classify(path.to_str().unwrap()), MediaSource::LocalFile);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn urls_and_file_ids_are_remote() {
        assert_eq!(classify("https://example.com/rose.jpg"), MediaSource::Remote);
        assert_eq!(classify("AgACAgIAAxkBAAIB"), MediaSource::Remote);
        assert_eq!(classify("image/missing.jpg"), MediaSource::Remote);
    }
}
