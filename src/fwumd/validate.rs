//! Consistency checks for a single record and for a json/binary pair.

use crate::error::{FwumdError, InvariantKind, Result};
use crate::model::Metadata;
use crate::naming;
use std::collections::HashSet;
use std::fmt::Display;
use tracing::warn;

/// Where the names of a binary-decoded record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    /// Taken from a text-form record.
    Template,
    /// Made up by the decoder; carries no information.
    Synthesized,
}

/// Checks that the entry sequences have the shape `config` declares.
pub fn check_shape(metadata: &Metadata) -> Result<()> {
    let dims = metadata.dims();
    if dims.nb_fw_img == 0 || dims.nb_fw_banks == 0 {
        return Err(violation(InvariantKind::EmptyDimensions));
    }
    if metadata.img_entries.len() != dims.nb_fw_img {
        return Err(violation(InvariantKind::ImageCount {
            expected: dims.nb_fw_img,
            found: metadata.img_entries.len(),
        }));
    }
    for img in &metadata.img_entries {
        if img.banks.len() != dims.nb_fw_banks {
            return Err(violation(InvariantKind::BankCount {
                image: img.name.clone(),
                expected: dims.nb_fw_banks,
                found: img.banks.len(),
            }));
        }
    }
    Ok(())
}

/// Checks every record invariant, reporting the first one broken.
pub fn validate(metadata: &Metadata) -> Result<()> {
    check_shape(metadata)?;
    check_names(metadata)?;
    check_uuids(metadata)?;
    check_indexes(metadata)
}

fn check_names(metadata: &Metadata) -> Result<()> {
    let mut seen = HashSet::new();
    for img in &metadata.img_entries {
        if !naming::is_valid_image_name(&img.name) {
            return Err(violation(InvariantKind::InvalidName(img.name.clone())));
        }
        if !seen.insert(img.name.as_str()) {
            return Err(violation(InvariantKind::DuplicateName(img.name.clone())));
        }
        if img.location.is_empty() {
            return Err(violation(InvariantKind::InvalidName(img.location.clone())));
        }
    }
    Ok(())
}

fn check_uuids(metadata: &Metadata) -> Result<()> {
    let uuids = &metadata.uuids;
    let mut expected_entries = HashSet::new();

    for img in &metadata.img_entries {
        if !uuids.locations.contains_key(&img.location) {
            return Err(violation(InvariantKind::MissingUuid(img.location.clone())));
        }
        if !uuids.entries.contains_key(&img.name) {
            return Err(violation(InvariantKind::MissingUuid(img.name.clone())));
        }
        expected_entries.insert(img.name.clone());
        for bank in 0..img.banks.len() {
            let name = img.bank_name(bank);
            if !uuids.entries.contains_key(&name) {
                return Err(violation(InvariantKind::MissingUuid(name)));
            }
            expected_entries.insert(name);
        }
    }

    for name in uuids.entries.keys() {
        if expected_entries.contains(name) {
            continue;
        }
        // A bank-shaped key for a known image whose number is out of range
        // is an orphan; anything not even bank-shaped breaks the naming rule.
        return Err(match naming::parse_bank_name(name) {
            Some(_) => violation(InvariantKind::OrphanUuid(name.clone())),
            None if name.contains(naming::BANK_SEPARATOR) => {
                violation(InvariantKind::InvalidName(name.clone()))
            }
            None => violation(InvariantKind::OrphanUuid(name.clone())),
        });
    }

    for location in uuids.locations.keys() {
        if !metadata
            .img_entries
            .iter()
            .any(|img| &img.location == location)
        {
            return Err(violation(InvariantKind::OrphanUuid(location.clone())));
        }
    }
    Ok(())
}

fn check_indexes(metadata: &Metadata) -> Result<()> {
    let nb_fw_banks = metadata.dims().nb_fw_banks;
    for (field, index) in [
        ("active_index", metadata.active_index),
        ("previous_active_index", metadata.previous_active_index),
    ] {
        if index as usize >= nb_fw_banks {
            return Err(violation(InvariantKind::IndexOutOfRange {
                field,
                index,
                nb_fw_banks,
            }));
        }
    }
    Ok(())
}

fn mismatch<T: Display + ?Sized>(field: impl AsRef<str>, json: &T, binary: &T) -> FwumdError {
    FwumdError::PairMismatch(format!(
        "{}: json={} binary={}",
        field.as_ref(),
        json,
        binary
    ))
}

fn violation(kind: InvariantKind) -> FwumdError {
    FwumdError::InvariantViolation(kind)
}

/// Checks that a json-loaded and a binary-loaded record describe the same
/// logical record.
///
/// Names are compared only when the binary side got its names from a
/// template. UUID differences are tolerated when the dimensions agree, since
/// the binary form has no UUIDs of its own.
pub fn cross_validate(json: &Metadata, binary: &Metadata, binary_names: NameSource) -> Result<()> {
    let (jd, bd) = (json.dims(), binary.dims());
    if jd.nb_fw_img != bd.nb_fw_img {
        return Err(mismatch("configs.nb_fw_img", &jd.nb_fw_img, &bd.nb_fw_img));
    }
    if jd.nb_fw_banks != bd.nb_fw_banks {
        return Err(mismatch(
            "configs.nb_fw_banks",
            &jd.nb_fw_banks,
            &bd.nb_fw_banks,
        ));
    }
    if json.version != binary.version {
        return Err(mismatch("metadata.version", &json.version, &binary.version));
    }
    if json.active_index != binary.active_index {
        return Err(mismatch(
            "metadata.active_index",
            &json.active_index,
            &binary.active_index,
        ));
    }
    if json.previous_active_index != binary.previous_active_index {
        return Err(mismatch(
            "metadata.previous_active_index",
            &json.previous_active_index,
            &binary.previous_active_index,
        ));
    }

    for (i, (ji, bi)) in json.img_entries.iter().zip(&binary.img_entries).enumerate() {
        if binary_names == NameSource::Template {
            if ji.name != bi.name {
                return Err(mismatch(format!("img_entry[{}].name", i), &ji.name, &bi.name));
            }
            if ji.location != bi.location {
                return Err(mismatch(
                    format!("img_entry[{}].location", i),
                    &ji.location,
                    &bi.location,
                ));
            }
        }
        for (j, (jb, bb)) in ji.banks.iter().zip(&bi.banks).enumerate() {
            if jb.accepted != bb.accepted {
                return Err(mismatch(
                    format!("{}.accepted", ji.bank_name(j)),
                    &jb.accepted,
                    &bb.accepted,
                ));
            }
            if jb.reserved != bb.reserved {
                return Err(mismatch(
                    format!("{}.reserved", ji.bank_name(j)),
                    &jb.reserved,
                    &bb.reserved,
                ));
            }
        }
    }

    if json.uuids != binary.uuids {
        warn!("UUID tables differ between json and binary; keeping the json UUIDs");
    }
    Ok(())
}
