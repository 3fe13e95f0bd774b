use crate::binary::BinaryCodec;
use crate::error::{FwumdError, InvariantKind, Result};
use crate::layout::Layout;
use crate::naming::{self, NameTemplate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The two dimensions that decide the shape of a record.
///
/// Serialized as the `configs` section of the text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dims {
    pub nb_fw_img: usize,
    pub nb_fw_banks: usize,
}

impl Dims {
    pub fn new(nb_fw_img: usize, nb_fw_banks: usize) -> Self {
        Self {
            nb_fw_img,
            nb_fw_banks,
        }
    }

    /// Rejects dimensions no binary record can have: empty ones, and ones
    /// whose layout does not fit a 32-bit size.
    pub fn checked(nb_fw_img: usize, nb_fw_banks: usize) -> Result<Self> {
        if nb_fw_img == 0 || nb_fw_banks == 0 {
            return Err(FwumdError::InvariantViolation(
                InvariantKind::EmptyDimensions,
            ));
        }
        let dims = Self::new(nb_fw_img, nb_fw_banks);
        Layout::for_dims(dims).map_err(|_| {
            FwumdError::InvariantViolation(InvariantKind::TooLarge {
                nb_fw_img,
                nb_fw_banks,
            })
        })?;
        Ok(dims)
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} images x {} banks", self.nb_fw_img, self.nb_fw_banks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BankEntry {
    pub accepted: bool,
    /// Implementation-defined data, carried through untouched.
    pub reserved: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub name: String,
    pub location: String,
    pub banks: Vec<BankEntry>,
}

impl ImageEntry {
    pub fn bank_name(&self, bank: usize) -> String {
        naming::bank_name(&self.name, bank)
    }
}

/// Name to UUID mappings for locations and for images/banks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UuidTable {
    pub locations: IndexMap<String, Uuid>,
    pub entries: IndexMap<String, Uuid>,
}

/// The firmware-update metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub version: u32,
    pub active_index: u32,
    pub previous_active_index: u32,
    pub img_entries: Vec<ImageEntry>,
    pub uuids: UuidTable,
    pub config: Dims,
    pub checksum: u32,
}

/// Bank acceptance policy as typed in the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Accept,
    Refuse,
}

impl Policy {
    pub fn is_accepted(self) -> bool {
        matches!(self, Policy::Accept)
    }
}

impl FromStr for Policy {
    type Err = FwumdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accept" | "1" | "true" => Ok(Policy::Accept),
            "refuse" | "0" | "false" => Ok(Policy::Refuse),
            other => Err(FwumdError::Usage(format!(
                "Policy '{}' not recognized (accept, 1, true / refuse, 0, false)",
                other
            ))),
        }
    }
}

impl Metadata {
    /// Builds a default record: every bank accepted, fresh random UUIDs.
    pub fn dummy(dims: Dims) -> Result<Self> {
        let dims = Dims::checked(dims.nb_fw_img, dims.nb_fw_banks)?;
        let mut template = NameTemplate::synthesized(dims);
        for uuid in template
            .uuids
            .locations
            .values_mut()
            .chain(template.uuids.entries.values_mut())
        {
            *uuid = Uuid::new_v4();
        }
        let banks = vec![
            BankEntry {
                accepted: true,
                reserved: 0,
            };
            dims.nb_fw_banks
        ];
        let mut metadata = Self::from_template(
            template,
            0,
            u32::from(dims.nb_fw_banks > 1),
            0,
            |_| banks.clone(),
        );
        BinaryCodec::default().seal(&mut metadata)?;
        Ok(metadata)
    }

    /// Assembles a record from names plus the scalar values a codec produced.
    pub(crate) fn from_template(
        template: NameTemplate,
        version: u32,
        active_index: u32,
        previous_active_index: u32,
        mut banks_for: impl FnMut(usize) -> Vec<BankEntry>,
    ) -> Self {
        let config = template.dims;
        let img_entries = template
            .images
            .into_iter()
            .enumerate()
            .map(|(i, names)| ImageEntry {
                name: names.name,
                location: names.location,
                banks: banks_for(i),
            })
            .collect();
        Self {
            version,
            active_index,
            previous_active_index,
            img_entries,
            uuids: template.uuids,
            config,
            checksum: 0,
        }
    }

    pub fn dims(&self) -> Dims {
        self.config
    }

    /// Finds an image by exact name, then zero-based index, then image UUID.
    pub fn resolve_image(&self, image_ref: &str) -> Result<usize> {
        if let Some(pos) = self.img_entries.iter().position(|img| img.name == image_ref) {
            return Ok(pos);
        }
        if let Ok(index) = image_ref.parse::<usize>() {
            if index < self.img_entries.len() {
                return Ok(index);
            }
        }
        if let Ok(uuid) = Uuid::parse_str(image_ref) {
            let by_uuid = self
                .img_entries
                .iter()
                .position(|img| self.uuids.entries.get(&img.name) == Some(&uuid));
            if let Some(pos) = by_uuid {
                return Ok(pos);
            }
        }
        Err(FwumdError::UnknownImage(image_ref.to_string()))
    }

    pub fn set_bank_policy(&mut self, image_ref: &str, bank: usize, policy: Policy) -> Result<()> {
        let image = self.resolve_image(image_ref)?;
        let entry = &mut self.img_entries[image];
        let name = entry.name.clone();
        let slot = entry
            .banks
            .get_mut(bank)
            .ok_or_else(|| FwumdError::UnknownBank {
                image: name,
                bank: bank.to_string(),
            })?;
        slot.accepted = policy.is_accepted();
        Ok(())
    }

    pub fn set_active_index(&mut self, index: u32) -> Result<()> {
        self.check_bank_index("active_index", index)?;
        self.active_index = index;
        Ok(())
    }

    pub fn set_previous_active_index(&mut self, index: u32) -> Result<()> {
        self.check_bank_index("previous_active_index", index)?;
        self.previous_active_index = index;
        Ok(())
    }

    fn check_bank_index(&self, field: &'static str, index: u32) -> Result<()> {
        if (index as usize) < self.config.nb_fw_banks {
            Ok(())
        } else {
            Err(FwumdError::InvariantViolation(
                InvariantKind::IndexOutOfRange {
                    field,
                    index,
                    nb_fw_banks: self.config.nb_fw_banks,
                },
            ))
        }
    }

    /// True when every image accepts the bank selected by `active_index`.
    pub fn will_boot(&self) -> bool {
        self.img_entries.iter().all(|img| {
            img.banks
                .get(self.active_index as usize)
                .is_some_and(|bank| bank.accepted)
        })
    }
}
