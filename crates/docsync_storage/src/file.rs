//! File-based local blob store.

use crate::error::StorageResult;
use crate::local::LocalStore;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A local blob store keeping one file per key inside a directory.
///
/// # Durability
///
/// `save` writes to a temporary sibling file, syncs it, then renames it
/// over the target, so a crash leaves either the old or the new content.
///
/// # Example
///
/// ```no_run
/// use docsync_storage::{FileStore, LocalStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("data")).unwrap();
/// store.save("fsclone-cloud-v6", "{}").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalStore for FileStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, contents: &str) -> StorageResult<()> {
        let target = self.path_for(key);
        let temp = self.dir.join(format!(".{key}.json.tmp"));
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp, &target)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.load("absent").unwrap().is_none());
    }

    #[test]
    fn file_save_then_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.save("ns", r#"{"a":1}"#).unwrap();
        assert_eq!(store.load("ns").unwrap().as_deref(), Some(r#"{"a":1}"#));

        store.save("ns", r#"{"a":2}"#).unwrap();
        assert_eq!(store.load("ns").unwrap().as_deref(), Some(r#"{"a":2}"#));
    }

    #[test]
    fn file_survives_reopen() {
        let dir = tempdir().unwrap();
        FileStore::open(dir.path()).unwrap().save("ns", "[]").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.load("ns").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn file_open_creates_nested_dirs() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();
        assert!(store.dir().exists());
    }

    #[test]
    fn file_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.save("ns", "{}").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["ns.json".to_string()]);
    }
}
