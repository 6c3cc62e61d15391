use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One file to archive: where it goes in the archive, and where it is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub archive_path: String,
    pub source_path: PathBuf,
}

/// Files to archive, in registration order, keyed by archive path.
///
/// Re-registering an archive path swaps in the new source but keeps the
/// position the path was first registered at.
#[derive(Debug, Clone, Default)]
pub struct ArchiveJob {
    entries: Vec<FileEntry>,
    index: HashMap<String, usize>,
}

impl ArchiveJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the source previously mapped to `archive_path`.
    pub fn insert(&mut self, archive_path: String, source_path: PathBuf) -> Option<PathBuf> {
        if let Some(&pos) = self.index.get(&archive_path) {
            let previous = std::mem::replace(&mut self.entries[pos].source_path, source_path);
            return Some(previous);
        }

        self.index.insert(archive_path.clone(), self.entries.len());
        self.entries.push(FileEntry {
            archive_path,
            source_path,
        });
        None
    }

    pub fn get(&self, archive_path: &str) -> Option<&Path> {
        self.index
            .get(archive_path)
            .map(|&pos| self.entries[pos].source_path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<FileEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a ArchiveJob {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_registration_order() {
        let mut job = ArchiveJob::new();
        for name in ["z", "a", "m"] {
            job.insert(name.to_string(), PathBuf::from(format!("/src/{name}")));
        }
        let names: Vec<_> = job.iter().map(|e| e.archive_path.as_str()).collect();
        assert_eq!(names, ["z", "a", "m"]);
    }

    #[test]
    fn newer_source_wins_in_original_slot() {
        let mut job = ArchiveJob::new();
        job.insert("a.txt".into(), "/old".into());
        job.insert("b.txt".into(), "/b".into());
        let previous = job.insert("a.txt".into(), "/new".into());

        assert_eq!(previous, Some(PathBuf::from("/old")));
        assert_eq!(job.len(), 2);
        assert_eq!(job.get("a.txt"), Some(Path::new("/new")));
        assert_eq!(job.iter().next().unwrap().archive_path, "a.txt");
    }
}
