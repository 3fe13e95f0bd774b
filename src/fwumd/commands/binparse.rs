use crate::binary::BinaryCodec;
use crate::commands::{CmdMessage, CmdResult, DumpView};
use crate::error::Result;
use crate::model::Dims;
use crate::naming::NameTemplate;
use crate::store::DataStore;
use crate::text;
use crate::validate;
use std::path::Path;
use tracing::info;

/// Decodes a binary record and writes its text form.
///
/// With a template, names and UUIDs come from that text-form record and the
/// binary must have its dimensions. Without one, `expected` (if any) pins the
/// dimensions and names are synthesized.
pub fn run<S: DataStore>(
    store: &mut S,
    codec: &BinaryCodec,
    bin_path: &Path,
    json_path: &Path,
    template_path: Option<&Path>,
    expected: Option<Dims>,
    display: bool,
) -> Result<CmdResult> {
    let template = match template_path {
        Some(path) => {
            let donor = text::decode(&store.read_to_string(path)?)?;
            validate::validate(&donor)?;
            Some(NameTemplate::from_metadata(&donor))
        }
        None => None,
    };
    let expected = template.as_ref().map(|t| t.dims).or(expected);

    let bytes = store.read(bin_path)?;
    let metadata = codec.decode(&bytes, expected, template.as_ref())?;
    validate::validate(&metadata)?;

    store.write(json_path, text::encode(&metadata)?.as_bytes())?;
    info!(
        bin = %bin_path.display(),
        json = %json_path.display(),
        templated = template.is_some(),
        "converted binary to json"
    );

    let mut result = CmdResult::default()
        .with_written(vec![json_path.to_path_buf()])
        .with_message(CmdMessage::success(format!(
            "JSON metadata ({}) written to {}",
            metadata.dims(),
            json_path.display()
        )));
    if template.is_none() {
        result.add_message(CmdMessage::info(
            "No template given: image, location and bank names were generated",
        ));
    }
    if display {
        result = result.with_dump(DumpView::from_bytes(&bytes)?);
    }
    Ok(result)
}
