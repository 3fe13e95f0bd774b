use super::DataStore;
use crate::error::{FwumdError, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct FileStore;

impl FileStore {
    pub fn new() -> Self {
        Self
    }
}

impl DataStore for FileStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.is_file() {
            return Err(FwumdError::Store(format!(
                "File {} does not exist",
                path.display()
            )));
        }
        let data = fs::read(path).map_err(FwumdError::Io)?;
        debug!(path = %path.display(), size = data.len(), "read file");
        Ok(data)
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data).map_err(FwumdError::Io)?;
        debug!(path = %path.display(), size = data.len(), "wrote file");
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("md.bin");
        let mut store = FileStore::new();
        store.write(&path, &[1, 2, 3]).unwrap();
        assert!(store.exists(&path));
        assert_eq!(store.read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn missing_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileStore::new()
            .read(&dir.path().join("absent.json"))
            .unwrap_err();
        assert!(matches!(err, FwumdError::Store(_)));
    }

    #[test]
    fn non_utf8_json_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.json");
        std::fs::write(&path, b"{\"name\": \"caf\xe9\"}").unwrap();
        let err = FileStore::new().read_to_string(&path).unwrap_err();
        assert!(matches!(err, FwumdError::Schema(_)));
    }
}
