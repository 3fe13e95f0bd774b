//! Binary codec for the on-disk record.
//!
//! Encoding walks [`Layout::fields`] and writes every word at its offset,
//! then writes the checksum last. Decoding reads the two dimension words
//! first, derives the layout from them and insists the input is exactly that
//! long. Names and UUIDs are not in the bytes; they come from a
//! [`NameTemplate`].

use crate::checksum::{Checksum, Placeholder};
use crate::error::{FwumdError, InvariantKind, Result};
use crate::layout::{Field, FieldSpan, Layout, HEADER_SIZE, WORD_SIZE};
use crate::model::{BankEntry, Dims, Metadata};
use crate::naming::NameTemplate;
use crate::validate;
use tracing::debug;

#[derive(Debug)]
pub struct BinaryCodec {
    checksum: Box<dyn Checksum>,
    verify_on_load: bool,
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self {
            checksum: Box::new(Placeholder),
            verify_on_load: false,
        }
    }
}

impl BinaryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns a stored/computed checksum disagreement into a hard error.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_on_load = verify;
        self
    }

    pub fn encode(&self, metadata: &Metadata) -> Result<Vec<u8>> {
        validate::check_shape(metadata)?;
        let layout = Layout::for_dims(metadata.dims())?;
        let mut buf = vec![0u8; layout.total_size()];

        for span in layout.fields() {
            if span.field == Field::Checksum {
                continue;
            }
            let value = field_value(metadata, span.field)?;
            buf[span.range()].copy_from_slice(&value.to_le_bytes());
        }

        let checksum = self.checksum.compute(&buf[layout.checksummed()]);
        buf[..WORD_SIZE].copy_from_slice(&checksum.to_le_bytes());

        debug!(size = buf.len(), checksum, "encoded binary metadata");
        Ok(buf)
    }

    /// Recomputes `metadata.checksum` from its current content.
    pub fn seal(&self, metadata: &mut Metadata) -> Result<()> {
        let bytes = self.encode(metadata)?;
        metadata.checksum = read_word(&bytes, 0);
        Ok(())
    }

    /// Decodes `bytes`, taking names from `template` or synthesizing them.
    ///
    /// `expected` pins the dimensions the caller believes the record has.
    pub fn decode(
        &self,
        bytes: &[u8],
        expected: Option<Dims>,
        template: Option<&NameTemplate>,
    ) -> Result<Metadata> {
        let dims = read_dims(bytes)?;
        if let Some(expected) = expected {
            if expected != dims {
                return Err(FwumdError::LayoutMismatch(format!(
                    "expected {}, binary declares {}",
                    expected, dims
                )));
            }
        }

        let layout = Layout::for_dims(dims)?;
        if bytes.len() != layout.total_size() {
            return Err(FwumdError::LayoutMismatch(format!(
                "binary declares {} ({} bytes) but is {} bytes long",
                dims,
                layout.total_size(),
                bytes.len()
            )));
        }

        let stored = read_word(bytes, 0);
        let computed = self.checksum.compute(&bytes[layout.checksummed()]);
        if stored != computed {
            if self.verify_on_load {
                return Err(FwumdError::ChecksumMismatch { stored, computed });
            }
            debug!(
                algorithm = self.checksum.name(),
                stored, computed, "checksum differs, verification disabled"
            );
        }

        let names = match template {
            Some(template) if template.dims != dims => {
                return Err(FwumdError::LayoutMismatch(format!(
                    "template describes {}, binary declares {}",
                    template.dims, dims
                )));
            }
            Some(template) => template.clone(),
            None => NameTemplate::synthesized(dims),
        };

        let word = |field: Field| {
            let offset = layout.offset(field).unwrap_or_default();
            read_word(bytes, offset)
        };

        let mut metadata = Metadata::from_template(
            names,
            word(Field::Version),
            word(Field::ActiveIndex),
            word(Field::PreviousActiveIndex),
            |image| {
                (0..dims.nb_fw_banks)
                    .map(|bank| BankEntry {
                        accepted: word(Field::Accepted { image, bank }) != 0,
                        reserved: word(Field::Reserved { image, bank }),
                    })
                    .collect()
            },
        );
        metadata.checksum = stored;

        debug!(%dims, templated = template.is_some(), "decoded binary metadata");
        Ok(metadata)
    }
}

pub fn encode(metadata: &Metadata) -> Result<Vec<u8>> {
    BinaryCodec::default().encode(metadata)
}

pub fn decode(bytes: &[u8]) -> Result<Metadata> {
    BinaryCodec::default().decode(bytes, None, None)
}

/// A raw word of a binary record, as found at its offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldValue {
    pub span: FieldSpan,
    pub value: u32,
}

/// Lists every word of `bytes` in file order without interpreting it.
pub fn fields(bytes: &[u8]) -> Result<Vec<FieldValue>> {
    let layout = Layout::for_dims(read_dims(bytes)?)?;
    if bytes.len() != layout.total_size() {
        return Err(FwumdError::LayoutMismatch(format!(
            "binary declares {} ({} bytes) but is {} bytes long",
            layout.dims(),
            layout.total_size(),
            bytes.len()
        )));
    }
    Ok(layout
        .fields()
        .map(|span| FieldValue {
            span,
            value: read_word(bytes, span.offset),
        })
        .collect())
}

/// Reads the self-described dimensions from the header.
pub fn read_dims(bytes: &[u8]) -> Result<Dims> {
    if bytes.len() < HEADER_SIZE {
        return Err(FwumdError::LayoutMismatch(format!(
            "binary is {} bytes, shorter than the {}-byte header",
            bytes.len(),
            HEADER_SIZE
        )));
    }
    let header_word = |field: Field| {
        let offset = field.header_offset().unwrap_or_default();
        read_word(bytes, offset) as usize
    };
    Ok(Dims::new(
        header_word(Field::NbFwImg),
        header_word(Field::NbFwBanks),
    ))
}

fn read_word(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; WORD_SIZE];
    word.copy_from_slice(&bytes[offset..offset + WORD_SIZE]);
    u32::from_le_bytes(word)
}

fn bank_at(metadata: &Metadata, image: usize, bank: usize) -> Result<&BankEntry> {
    let entry = metadata.img_entries.get(image).ok_or_else(|| {
        FwumdError::InvariantViolation(InvariantKind::ImageCount {
            expected: metadata.config.nb_fw_img,
            found: metadata.img_entries.len(),
        })
    })?;
    entry.banks.get(bank).ok_or_else(|| {
        FwumdError::InvariantViolation(InvariantKind::BankCount {
            image: entry.name.clone(),
            expected: metadata.config.nb_fw_banks,
            found: entry.banks.len(),
        })
    })
}

fn field_value(metadata: &Metadata, field: Field) -> Result<u32> {
    let value = match field {
        Field::Checksum => metadata.checksum,
        Field::Version => metadata.version,
        Field::ActiveIndex => metadata.active_index,
        Field::PreviousActiveIndex => metadata.previous_active_index,
        Field::NbFwImg => dimension_word(metadata.config.nb_fw_img)?,
        Field::NbFwBanks => dimension_word(metadata.config.nb_fw_banks)?,
        Field::Accepted { image, bank } => u32::from(bank_at(metadata, image, bank)?.accepted),
        Field::Reserved { image, bank } => bank_at(metadata, image, bank)?.reserved,
    };
    Ok(value)
}

fn dimension_word(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        FwumdError::LayoutMismatch(format!("dimension {} does not fit in 32 bits", value))
    })
}
