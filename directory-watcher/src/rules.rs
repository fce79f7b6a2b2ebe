//! Extension to destination lookup.

use std::path::Path;

use indexmap::IndexMap;

use crate::config::{FolderRule, Settings};

/// Flattened `{extension: destination}` table.
///
/// Extensions are stored lower-cased without their leading dot. When two
/// folders claim the same extension the first one in settings order wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    table: IndexMap<String, String>,
}

impl RuleTable {
    /// Build the table from folder rules, in order.
    pub fn new<'a>(folders: impl IntoIterator<Item = &'a FolderRule>) -> Self {
        let mut table = IndexMap::new();
        for folder in folders {
            for extension in &folder.extensions {
                let extension = normalize_extension(extension);
                if extension.is_empty() {
                    continue;
                }
                table.entry(extension).or_insert_with(|| folder.path.clone());
            }
        }
        Self { table }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.folders)
    }

    /// Destination for a file, or `None` when its extension is unmapped.
    pub fn resolve(&self, path: &Path) -> Option<&str> {
        let extension = path.extension()?.to_str()?;
        self.lookup(extension)
    }

    /// Destination for an extension, with or without its leading dot.
    pub fn lookup(&self, extension: &str) -> Option<&str> {
        self.table
            .get(&normalize_extension(extension))
            .map(String::as_str)
    }

    /// Known extensions, in settings order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> RuleTable {
        RuleTable::new(&[
            FolderRule::new("/mnt/video", &["mp4", ".MKV"]),
            FolderRule::new("http://localhost:8000/upload", &["mp3", "MP4"]),
            FolderRule::new("ftp://user:pw@files.local/docs", &["pdf"]),
        ])
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let table = table();

        assert_eq!(table.resolve(Path::new("/in/clip.mp4")), Some("/mnt/video"));
        assert_eq!(table.resolve(Path::new("/in/CLIP.MP4")), Some("/mnt/video"));
        assert_eq!(table.resolve(Path::new("/in/movie.mkv")), Some("/mnt/video"));
        assert_eq!(
            table.resolve(Path::new("/in/song.Mp3")),
            Some("http://localhost:8000/upload")
        );
    }

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(table().lookup(".mp4"), Some("/mnt/video"));
    }

    #[test]
    fn test_unmapped_files_are_skipped() {
        let table = table();

        assert_eq!(table.resolve(Path::new("/in/download.part")), None);
        assert_eq!(table.resolve(Path::new("/in/README")), None);
        assert_eq!(table.resolve(Path::new("/in/.mp4")), None);
    }

    #[test]
    fn test_extensions_keep_settings_order() {
        let extensions: Vec<_> = table().extensions().map(str::to_string).collect();

        assert_eq!(extensions, vec!["mp4", "mkv", "mp3", "pdf"]);
    }
}
