use super::DataStore;
use crate::error::{FwumdError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Keeps files in memory so engine tests never touch the disk.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), data.into());
        self
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }
}

impl DataStore for InMemoryStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FwumdError::Store(format!("File {} does not exist", path.display())))
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> Result<()> {
        self.files.insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::binary;
    use crate::model::{Dims, Metadata};
    use crate::text;

    /// A store pre-loaded with a dummy record written as a json/binary pair.
    pub struct PairFixture {
        pub store: InMemoryStore,
        pub metadata: Metadata,
    }

    impl PairFixture {
        pub const JSON: &'static str = "fixture.json";
        pub const BIN: &'static str = "fixture.bin";

        pub fn new(nb_fw_img: usize, nb_fw_banks: usize) -> Self {
            let metadata = Metadata::dummy(Dims::new(nb_fw_img, nb_fw_banks)).unwrap();
            Self::from_metadata(metadata)
        }

        pub fn from_metadata(metadata: Metadata) -> Self {
            let store = InMemoryStore::new()
                .with_file(Self::JSON, text::encode(&metadata).unwrap())
                .with_file(Self::BIN, binary::encode(&metadata).unwrap());
            Self { store, metadata }
        }
    }
}
