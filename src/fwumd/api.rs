//! # API Facade
//!
//! A thin facade over the command layer and the shell engine. Every client
//! (the CLI today) goes through [`FwumdApi`]; it dispatches, and returns
//! [`CmdResult`]s. It holds no business logic and never prints.
//!
//! `FwumdApi<S: DataStore>` is generic over storage:
//! - Production: `FwumdApi<FileStore>`
//! - Testing: `FwumdApi<InMemoryStore>`

use crate::binary::BinaryCodec;
use crate::commands;
use crate::error::Result;
use crate::model::Dims;
use crate::shell::Session;
use crate::store::DataStore;
use std::path::Path;

pub use crate::commands::{CmdMessage, CmdResult, DumpView, MessageLevel, UuidReport};

pub struct FwumdApi<S: DataStore> {
    store: S,
    codec: BinaryCodec,
}

impl<S: DataStore> FwumdApi<S> {
    pub fn new(store: S, codec: BinaryCodec) -> Self {
        Self { store, codec }
    }

    pub fn dummy(
        &mut self,
        dims: Dims,
        json_path: &Path,
        bin_path: &Path,
        display: bool,
    ) -> Result<CmdResult> {
        commands::dummy::run(&mut self.store, dims, json_path, bin_path, display)
    }

    pub fn jsonparse(&mut self, json_path: &Path, bin_path: &Path, display: bool) -> Result<CmdResult> {
        commands::jsonparse::run(&mut self.store, &self.codec, json_path, bin_path, display)
    }

    pub fn binparse(
        &mut self,
        bin_path: &Path,
        json_path: &Path,
        template_path: Option<&Path>,
        expected: Option<Dims>,
        display: bool,
    ) -> Result<CmdResult> {
        commands::binparse::run(
            &mut self.store,
            &self.codec,
            bin_path,
            json_path,
            template_path,
            expected,
            display,
        )
    }

    pub fn dump(&self, bin_path: &Path, expected: Option<Dims>) -> Result<CmdResult> {
        commands::dump::run(&self.store, &self.codec, bin_path, expected)
    }

    /// Hands the store and codec over to a shell session.
    pub fn into_session(self) -> Session<S> {
        Session::new(self.store, self.codec)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn api() -> FwumdApi<InMemoryStore> {
        FwumdApi::new(InMemoryStore::new(), BinaryCodec::default())
    }

    #[test]
    fn dummy_then_jsonparse_then_binparse() {
        let mut api = api();
        api.dummy(Dims::new(1, 2), Path::new("d.json"), Path::new("d.bin"), false)
            .unwrap();
        api.jsonparse(Path::new("d.json"), Path::new("again.bin"), false)
            .unwrap();
        assert_eq!(
            api.store().read(Path::new("d.bin")).unwrap(),
            api.store().read(Path::new("again.bin")).unwrap()
        );

        api.binparse(
            Path::new("again.bin"),
            Path::new("back.json"),
            Some(Path::new("d.json")),
            None,
            false,
        )
        .unwrap();
        assert_eq!(
            api.store().read(Path::new("d.json")).unwrap(),
            api.store().read(Path::new("back.json")).unwrap()
        );
    }

    #[test]
    fn dump_returns_a_view() {
        let mut api = api();
        api.dummy(Dims::new(2, 2), Path::new("d.json"), Path::new("d.bin"), false)
            .unwrap();
        let result = api.dump(Path::new("d.bin"), Some(Dims::new(2, 2))).unwrap();
        assert!(result.dump.is_some());
    }

    #[test]
    fn session_sees_the_same_store() {
        let mut api = api();
        api.dummy(Dims::new(1, 2), Path::new("d.json"), Path::new("d.bin"), false)
            .unwrap();
        let mut session = api.into_session();
        session.execute("load pair d.json d.bin").unwrap();
        assert!(session.metadata().is_some());
    }
}
