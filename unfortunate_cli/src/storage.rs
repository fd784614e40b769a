use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use unfortunate_core::KeyValueStorage;
use unfortunate_shared::{WheelError, WheelResult};

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> WheelResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WheelError::Storage(format!("reading {key}: {e}"))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> WheelResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| WheelError::Storage(format!("creating {}: {e}", self.dir.display())))?;
        // write-then-rename so a crash never leaves half a file behind
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| WheelError::Storage(format!("writing {key}: {e}")))?;
        fs::rename(&tmp, &path).map_err(|e| WheelError::Storage(format!("writing {key}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unfortunate_core::Store;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));
        assert_eq!(storage.get("items").unwrap(), None);
    }

    #[test]
    fn store_round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::load(FileStorage::new(dir.path()));
        store.add_item("water plants", 0.6).unwrap();
        assert!(dir.path().join("items.json").exists());

        let reloaded = Store::load(FileStorage::new(dir.path()));
        assert_eq!(reloaded.items()[0].title, "water plants");
    }
}
