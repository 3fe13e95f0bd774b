use crate::binary::BinaryCodec;
use crate::commands::{CmdMessage, CmdResult, DumpView};
use crate::error::Result;
use crate::store::DataStore;
use crate::text;
use crate::validate;
use std::path::Path;
use tracing::info;

/// Reads a text-form record, validates it and writes its binary form.
pub fn run<S: DataStore>(
    store: &mut S,
    codec: &BinaryCodec,
    json_path: &Path,
    bin_path: &Path,
    display: bool,
) -> Result<CmdResult> {
    let metadata = text::decode(&store.read_to_string(json_path)?)?;
    validate::validate(&metadata)?;

    let bytes = codec.encode(&metadata)?;
    store.write(bin_path, &bytes)?;
    info!(json = %json_path.display(), bin = %bin_path.display(), "converted json to binary");

    let mut result = CmdResult::default()
        .with_written(vec![bin_path.to_path_buf()])
        .with_message(CmdMessage::success(format!(
            "Binary metadata ({}) written to {}",
            metadata.dims(),
            bin_path.display()
        )));
    if display {
        result = result.with_dump(DumpView::from_bytes(&bytes)?);
    }
    Ok(result)
}
