//! One-shot operations behind the `dummy`, `jsonparse`, `binparse` and
//! `dump` subcommands, plus the result types every command (and the shell)
//! hands back to its caller.
//!
//! Nothing here prints. Output is described by [`CmdResult`] and rendered by
//! whichever client called in.

use crate::binary::{self, FieldValue};
use crate::error::Result;
use crate::model::Metadata;
use crate::naming;
use crate::text;
use std::path::PathBuf;
use uuid::Uuid;

pub mod binparse;
pub mod dummy;
pub mod dump;
pub mod jsonparse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Snapshot of a record for display: the raw words and, optionally, the
/// text form.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpView {
    pub fields: Vec<FieldValue>,
    pub text: Option<String>,
}

impl DumpView {
    pub fn binary(metadata: &Metadata) -> Result<Self> {
        let bytes = binary::encode(metadata)?;
        Ok(Self {
            fields: binary::fields(&bytes)?,
            text: None,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            fields: binary::fields(bytes)?,
            text: None,
        })
    }

    pub fn with_text(mut self, metadata: &Metadata) -> Result<Self> {
        self.text = Some(text::encode(metadata)?);
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankUuids {
    pub image: String,
    pub uuid: Option<Uuid>,
    pub banks: Vec<(String, Uuid)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankChoice {
    pub image: String,
    pub bank: String,
    pub uuid: Option<Uuid>,
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UuidReport {
    /// Every UUID of the table, grouped by image.
    All {
        locations: Vec<(String, Uuid)>,
        images: Vec<BankUuids>,
    },
    /// The bank `active_index` selects in every image.
    Choices {
        active_index: u32,
        choices: Vec<BankChoice>,
        will_boot: bool,
    },
}

impl UuidReport {
    pub fn all(metadata: &Metadata) -> Self {
        let entries = &metadata.uuids.entries;
        let images = entries
            .iter()
            .filter(|(name, _)| naming::parse_bank_name(name).is_none())
            .map(|(image, uuid)| BankUuids {
                image: image.clone(),
                uuid: Some(*uuid),
                banks: entries
                    .iter()
                    .filter(|(name, _)| {
                        naming::parse_bank_name(name).is_some_and(|(owner, _)| owner == image)
                    })
                    .map(|(name, uuid)| (name.clone(), *uuid))
                    .collect(),
            })
            .collect();
        UuidReport::All {
            locations: metadata
                .uuids
                .locations
                .iter()
                .map(|(name, uuid)| (name.clone(), *uuid))
                .collect(),
            images,
        }
    }

    pub fn choices(metadata: &Metadata) -> Self {
        let active = metadata.active_index as usize;
        let choices = metadata
            .img_entries
            .iter()
            .map(|img| {
                let bank = img.bank_name(active);
                BankChoice {
                    image: img.name.clone(),
                    uuid: metadata.uuids.entries.get(&bank).copied(),
                    accepted: img.banks.get(active).is_some_and(|b| b.accepted),
                    bank,
                }
            })
            .collect();
        UuidReport::Choices {
            active_index: metadata.active_index,
            choices,
            will_boot: metadata.will_boot(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub messages: Vec<CmdMessage>,
    pub dump: Option<DumpView>,
    pub uuids: Option<UuidReport>,
    pub written: Vec<PathBuf>,
    /// Set by `exit`; the caller stops reading commands.
    pub exit: bool,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_dump(mut self, dump: DumpView) -> Self {
        self.dump = Some(dump);
        self
    }

    pub fn with_uuids(mut self, uuids: UuidReport) -> Self {
        self.uuids = Some(uuids);
        self
    }

    pub fn with_written(mut self, paths: Vec<PathBuf>) -> Self {
        self.written = paths;
        self
    }

    /// Folds a later result into this one; output keeps its order.
    pub fn merge(&mut self, other: CmdResult) {
        self.messages.extend(other.messages);
        if other.dump.is_some() {
            self.dump = other.dump;
        }
        if other.uuids.is_some() {
            self.uuids = other.uuids;
        }
        self.written.extend(other.written);
        self.exit |= other.exit;
    }
}
