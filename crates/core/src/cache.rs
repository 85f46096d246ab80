use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

/// Get the cache directory for a media file, keyed by its path and size
pub fn get_cache_dir(root: &Path, media_path: &Path, size: u64) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    media_path.hash(&mut hasher);
    size.hash(&mut hasher);

    root.join(hasher.finish().to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("parikshak")
}

pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("parikshak")
}

/// Get the path for the decoded mono audio of a media file
pub fn get_audio_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("audio.wav")
}

pub fn get_report_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("report.json")
}
