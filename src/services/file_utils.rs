//! Shared file utility functions
//!
//! Video detection by extension, used when deciding whether a folder in the
//! source root holds a movie.

use std::path::Path;

use walkdir::WalkDir;

/// Video file extensions (lowercase)
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mkv", ".mp4", ".avi", ".mov", ".m4v", ".wmv", ".flv", ".webm", ".mpg", ".mpeg", ".ts",
    ".m2ts",
];

/// Check if a file is a video file based on extension
///
/// # Example
/// ```
/// use emby_organizer::services::file_utils::is_video_file;
/// assert!(is_video_file("movie.mkv"));
/// assert!(is_video_file("/path/to/VIDEO.MP4"));
/// assert!(!is_video_file("poster.jpg"));
/// ```
pub fn is_video_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Whether any file below `dir` (recursively) is a video file.
///
/// Unreadable entries are ignored rather than treated as errors.
pub fn contains_video(dir: &Path) -> bool {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .any(|e| is_video_file(&e.file_name().to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file("Inception.2010.1080p.mkv"));
        assert!(is_video_file("clip.MOV"));
        assert!(!is_video_file("Inception.2010.srt"));
        assert!(!is_video_file("mkv"));
    }

    #[test]
    fn test_contains_video_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Disc 1");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("movie.avi"), b"").unwrap();

        assert!(contains_video(dir.path()));
    }

    #[test]
    fn test_contains_video_ignores_extras() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("poster.jpg"), b"").unwrap();
        std::fs::write(dir.path().join("movie.nfo"), b"").unwrap();

        assert!(!contains_video(dir.path()));
    }
}
