use crate::binary::BinaryCodec;
use crate::commands::{CmdResult, DumpView};
use crate::error::Result;
use crate::model::Dims;
use crate::store::DataStore;
use std::path::Path;

/// Shows the words of a binary record. The record is decoded first so a
/// malformed file is reported rather than listed.
pub fn run<S: DataStore>(
    store: &S,
    codec: &BinaryCodec,
    bin_path: &Path,
    expected: Option<Dims>,
) -> Result<CmdResult> {
    let bytes = store.read(bin_path)?;
    codec.decode(&bytes, expected, None)?;
    Ok(CmdResult::default().with_dump(DumpView::from_bytes(&bytes)?))
}
