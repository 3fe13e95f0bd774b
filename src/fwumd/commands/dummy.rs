use crate::binary;
use crate::commands::{CmdMessage, CmdResult, DumpView};
use crate::error::Result;
use crate::model::{Dims, Metadata};
use crate::store::DataStore;
use crate::text;
use crate::validate;
use std::path::Path;
use tracing::info;

/// Generates a default record and writes it as a json/binary pair.
pub fn run<S: DataStore>(
    store: &mut S,
    dims: Dims,
    json_path: &Path,
    bin_path: &Path,
    display: bool,
) -> Result<CmdResult> {
    let metadata = Metadata::dummy(dims)?;
    validate::validate(&metadata)?;

    store.write(json_path, text::encode(&metadata)?.as_bytes())?;
    store.write(bin_path, &binary::encode(&metadata)?)?;
    info!(%dims, json = %json_path.display(), bin = %bin_path.display(), "wrote dummy metadata");

    let mut result = CmdResult::default()
        .with_written(vec![json_path.to_path_buf(), bin_path.to_path_buf()])
        .with_message(CmdMessage::success(format!(
            "Dummy metadata ({}) written to {} and {}",
            dims,
            json_path.display(),
            bin_path.display()
        )));
    if display {
        result = result.with_dump(DumpView::binary(&metadata)?);
    }
    Ok(result)
}
