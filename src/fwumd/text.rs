//! Structured-text codec: the human-editable JSON document.
//!
//! ```json
//! {
//!   "metadata": {
//!     "version": 0,
//!     "active_index": 1,
//!     "previous_active_index": 0,
//!     "img_entry": {
//!       "img_0": {
//!         "location": "loc_0",
//!         "img_bank_info": {
//!           "img_0_bank_0": { "accepted": true, "reserved": 0 },
//!           "img_0_bank_1": { "accepted": true, "reserved": 0 }
//!         }
//!       }
//!     }
//!   },
//!   "uuids": { "locations": { "loc_0": "…" }, "entries": { "img_0": "…" } },
//!   "configs": { "nb_fw_img": 1, "nb_fw_banks": 2 }
//! }
//! ```
//!
//! Image order is the key order of `img_entry`. Bank order comes from the
//! `_bank_<n>` suffix, so bank keys may appear in any order.

use crate::binary::BinaryCodec;
use crate::error::{FwumdError, Result};
use crate::model::{BankEntry, Dims, ImageEntry, Metadata, UuidTable};
use crate::naming;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub metadata: MetadataSection,
    pub uuids: UuidSection,
    pub configs: Dims,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataSection {
    pub version: u32,
    pub active_index: u32,
    pub previous_active_index: u32,
    pub img_entry: IndexMap<String, ImageSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSection {
    pub location: String,
    pub img_bank_info: IndexMap<String, BankSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankSection {
    pub accepted: bool,
    pub reserved: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UuidSection {
    pub locations: IndexMap<String, Uuid>,
    pub entries: IndexMap<String, Uuid>,
}

impl From<&Metadata> for Document {
    fn from(metadata: &Metadata) -> Self {
        let img_entry = metadata
            .img_entries
            .iter()
            .map(|img| {
                let img_bank_info = img
                    .banks
                    .iter()
                    .enumerate()
                    .map(|(j, bank)| {
                        (
                            img.bank_name(j),
                            BankSection {
                                accepted: bank.accepted,
                                reserved: bank.reserved,
                            },
                        )
                    })
                    .collect();
                (
                    img.name.clone(),
                    ImageSection {
                        location: img.location.clone(),
                        img_bank_info,
                    },
                )
            })
            .collect();
        Self {
            metadata: MetadataSection {
                version: metadata.version,
                active_index: metadata.active_index,
                previous_active_index: metadata.previous_active_index,
                img_entry,
            },
            uuids: UuidSection {
                locations: metadata.uuids.locations.clone(),
                entries: metadata.uuids.entries.clone(),
            },
            configs: metadata.config,
        }
    }
}

impl Document {
    /// Converts the document into a record.
    ///
    /// Only the document's own structure is checked here; cross-field
    /// invariants are the validator's job.
    pub fn into_metadata(self) -> Result<Metadata> {
        let mut img_entries = Vec::with_capacity(self.metadata.img_entry.len());
        for (name, image) in self.metadata.img_entry {
            if !naming::is_valid_image_name(&name) {
                return Err(FwumdError::Schema(format!(
                    "image '{}' must be a non-empty name without spaces or '{}'",
                    name,
                    naming::BANK_SEPARATOR
                )));
            }
            let banks = ordered_banks(&name, image.img_bank_info)?;
            img_entries.push(ImageEntry {
                name,
                location: image.location,
                banks,
            });
        }
        let mut metadata = Metadata {
            version: self.metadata.version,
            active_index: self.metadata.active_index,
            previous_active_index: self.metadata.previous_active_index,
            img_entries,
            uuids: UuidTable {
                locations: self.uuids.locations,
                entries: self.uuids.entries,
            },
            config: self.configs,
            checksum: 0,
        };
        // The text form stores no checksum; give the record a fresh one when
        // its shape allows encoding at all.
        if crate::validate::check_shape(&metadata).is_ok() {
            BinaryCodec::default().seal(&mut metadata)?;
        }
        Ok(metadata)
    }
}

fn ordered_banks(image: &str, banks: IndexMap<String, BankSection>) -> Result<Vec<BankEntry>> {
    let count = banks.len();
    let mut slots: Vec<Option<BankEntry>> = vec![None; count];
    for (key, bank) in banks {
        let number = match naming::parse_bank_name(&key) {
            Some((owner, number)) if owner == image => number,
            _ => {
                return Err(FwumdError::Schema(format!(
                    "bank '{}' of image '{}' must be named {}{}<n>",
                    key,
                    image,
                    image,
                    naming::BANK_SEPARATOR
                )))
            }
        };
        let slot = slots.get_mut(number).ok_or_else(|| {
            FwumdError::Schema(format!(
                "bank '{}' is numbered past the {} banks of image '{}'",
                key, count, image
            ))
        })?;
        if slot.is_some() {
            return Err(FwumdError::Schema(format!("bank '{}' appears twice", key)));
        }
        *slot = Some(BankEntry {
            accepted: bank.accepted,
            reserved: bank.reserved,
        });
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(j, slot)| {
            slot.ok_or_else(|| {
                FwumdError::Schema(format!(
                    "bank '{}' is missing",
                    naming::bank_name(image, j)
                ))
            })
        })
        .collect()
}

pub fn encode(metadata: &Metadata) -> Result<String> {
    Ok(serde_json::to_string_pretty(&encode_value(metadata)?)?)
}

pub fn encode_value(metadata: &Metadata) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(Document::from(metadata))?)
}

/// Parses and decodes a text document. Text that is not JSON at all is a
/// schema error, like a document with the wrong shape.
pub fn decode(text: &str) -> Result<Metadata> {
    let value = serde_json::from_str(text).map_err(|e| FwumdError::Schema(e.to_string()))?;
    decode_value(value)
}

pub fn decode_value(value: serde_json::Value) -> Result<Metadata> {
    let document: Document =
        serde_json::from_value(value).map_err(|e| FwumdError::Schema(e.to_string()))?;
    document.into_metadata()
}
