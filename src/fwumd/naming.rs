//! Image, bank and location names, and the UUIDs bound to them.
//!
//! The binary form carries neither names nor UUIDs. When bytes are decoded,
//! names come from a [`NameTemplate`]: either one taken from a text-form
//! record with the same dimensions, or a synthesized one (`img_<i>`,
//! `img_<i>_bank_<j>`, `loc_<i>`) whose UUIDs are derived from the names so
//! that decoding the same bytes twice gives equal records.

use crate::model::{Dims, Metadata, UuidTable};
use uuid::Uuid;

pub const BANK_SEPARATOR: &str = "_bank_";

/// Namespace for UUIDs derived from synthesized names.
const SYNTHESIZED_NAMESPACE: Uuid = Uuid::from_u128(0x6a0f_3c1e_8d2b_4f57_9b64_1e0c_53a9_f2d7);

pub fn bank_name(image: &str, bank: usize) -> String {
    format!("{}{}{}", image, BANK_SEPARATOR, bank)
}

/// Splits `<image>_bank_<n>` into its image name and bank number.
///
/// The bank number must be plain decimal digits with no leading zero, so
/// every bank has exactly one spelling. Returns `None` for anything else,
/// including an empty image part.
pub fn parse_bank_name(name: &str) -> Option<(&str, usize)> {
    let (image, number) = name.rsplit_once(BANK_SEPARATOR)?;
    if image.is_empty() || number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if number.len() > 1 && number.starts_with('0') {
        return None;
    }
    number.parse().ok().map(|n| (image, n))
}

/// Image names are free-form except that they cannot look like bank names.
pub fn is_valid_image_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(BANK_SEPARATOR) && !name.contains(char::is_whitespace)
}

pub fn synthesized_image_name(index: usize) -> String {
    format!("img_{}", index)
}

pub fn synthesized_location(index: usize) -> String {
    format!("loc_{}", index)
}

pub fn derived_uuid(name: &str) -> Uuid {
    Uuid::new_v5(&SYNTHESIZED_NAMESPACE, name.as_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNames {
    pub name: String,
    pub location: String,
}

/// Everything a record knows that the binary form does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    pub dims: Dims,
    pub images: Vec<ImageNames>,
    pub uuids: UuidTable,
}

impl NameTemplate {
    pub fn synthesized(dims: Dims) -> Self {
        let mut uuids = UuidTable::default();
        let images = (0..dims.nb_fw_img)
            .map(|i| {
                let name = synthesized_image_name(i);
                let location = synthesized_location(i);
                uuids
                    .locations
                    .insert(location.clone(), derived_uuid(&location));
                uuids.entries.insert(name.clone(), derived_uuid(&name));
                for bank in 0..dims.nb_fw_banks {
                    let bank = bank_name(&name, bank);
                    let uuid = derived_uuid(&bank);
                    uuids.entries.insert(bank, uuid);
                }
                ImageNames { name, location }
            })
            .collect();
        Self {
            dims,
            images,
            uuids,
        }
    }

    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            dims: metadata.dims(),
            images: metadata
                .img_entries
                .iter()
                .map(|img| ImageNames {
                    name: img.name.clone(),
                    location: img.location.clone(),
                })
                .collect(),
            uuids: metadata.uuids.clone(),
        }
    }
}
