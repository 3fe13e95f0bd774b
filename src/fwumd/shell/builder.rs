//! Guided construction of a record, one question at a time.
//!
//! The builder walks `NeedDims → NeedHeader → NeedImage(i) → NeedBank(i, j)
//! → NeedUuids → Done`. Every question has a default that an empty answer
//! takes; an answer that does not parse leaves the builder where it was so
//! the same question can be asked again. Input comes through a [`Prompter`]
//! so the walk runs without a terminal.

use crate::binary::BinaryCodec;
use crate::error::{FwumdError, Result};
use crate::model::{BankEntry, Dims, Metadata, Policy, UuidTable};
use crate::naming::{self, ImageNames, NameTemplate};
use indexmap::IndexMap;
use std::str::FromStr;
use uuid::Uuid;

/// Source of answers for the builder.
pub trait Prompter {
    /// Asks one question and returns the raw answer. `default` is what an
    /// empty answer stands for.
    fn ask(&mut self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Reports something to the person answering.
    fn tell(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    NeedDims,
    NeedHeader,
    NeedImage(usize),
    NeedBank(usize, usize),
    NeedUuids,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Question {
    NbFwImg,
    NbFwBanks,
    Version,
    ActiveIndex,
    PreviousActiveIndex,
    ImageName(usize),
    Location(usize),
    Accepted(usize, usize),
    Reserved(usize, usize),
    Uuids,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub default: Option<String>,
}

#[derive(Debug, Clone)]
struct ImageDraft {
    name: String,
    location: String,
    banks: Vec<BankEntry>,
}

#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    question: Question,
    default_dims: Dims,
    default_location: String,
    dims: Dims,
    version: u32,
    active_index: u32,
    previous_active_index: u32,
    images: Vec<ImageDraft>,
    locations: IndexMap<String, Option<Uuid>>,
    entries: IndexMap<String, Option<Uuid>>,
}

impl MetadataBuilder {
    pub fn new(default_dims: Dims, default_location: impl Into<String>) -> Self {
        Self {
            question: Question::NbFwImg,
            default_dims,
            default_location: default_location.into(),
            dims: default_dims,
            version: 0,
            active_index: 0,
            previous_active_index: 0,
            images: Vec::new(),
            locations: IndexMap::new(),
            entries: IndexMap::new(),
        }
    }

    pub fn step(&self) -> Step {
        match self.question {
            Question::NbFwImg | Question::NbFwBanks => Step::NeedDims,
            Question::Version | Question::ActiveIndex | Question::PreviousActiveIndex => {
                Step::NeedHeader
            }
            Question::ImageName(i) | Question::Location(i) => Step::NeedImage(i),
            Question::Accepted(i, j) | Question::Reserved(i, j) => Step::NeedBank(i, j),
            Question::Uuids => Step::NeedUuids,
            Question::Finished => Step::Done,
        }
    }

    /// The question to ask next, or `None` once the builder is done.
    pub fn prompt(&self) -> Option<Prompt> {
        let (text, default) = match self.question {
            Question::NbFwImg => (
                "The number of image entries".to_string(),
                self.default_dims.nb_fw_img.to_string(),
            ),
            Question::NbFwBanks => (
                "The number of banks per image".to_string(),
                self.default_dims.nb_fw_banks.to_string(),
            ),
            Question::Version => ("Metadata version".to_string(), "0".to_string()),
            Question::ActiveIndex => ("Active index".to_string(), "0".to_string()),
            Question::PreviousActiveIndex => {
                ("Previous active index".to_string(), "0".to_string())
            }
            Question::ImageName(i) => (
                format!("Image {} name", i),
                naming::synthesized_image_name(i),
            ),
            Question::Location(i) => (
                format!("Location of image {}", self.images[i].name),
                self.default_location.clone(),
            ),
            Question::Accepted(i, j) => (
                format!("{} bank {} accepted", self.images[i].name, j),
                "true".to_string(),
            ),
            Question::Reserved(i, j) => (
                format!("{} bank {} reserved field data", self.images[i].name, j),
                "0".to_string(),
            ),
            Question::Uuids => {
                let missing: Vec<&str> = self
                    .locations
                    .iter()
                    .chain(self.entries.iter())
                    .filter(|(_, uuid)| uuid.is_none())
                    .map(|(name, _)| name.as_str())
                    .collect();
                (
                    format!(
                        "Known UUID as '<id> <uuid>', q to finish (still unknown: {})",
                        if missing.is_empty() {
                            "none".to_string()
                        } else {
                            missing.join(", ")
                        }
                    ),
                    "q".to_string(),
                )
            }
            Question::Finished => return None,
        };
        Some(Prompt {
            text,
            default: Some(default),
        })
    }

    /// Applies one answer. On error nothing changes.
    pub fn answer(&mut self, input: &str) -> Result<()> {
        let input = input.trim();
        let default = self.prompt().and_then(|p| p.default).unwrap_or_default();
        let input = if input.is_empty() {
            default.as_str()
        } else {
            input
        };

        self.question = match self.question {
            Question::NbFwImg => {
                self.dims.nb_fw_img = Dims::checked(parse_count(input)?, 1)?.nb_fw_img;
                Question::NbFwBanks
            }
            Question::NbFwBanks => {
                self.dims = Dims::checked(self.dims.nb_fw_img, parse_count(input)?)?;
                Question::Version
            }
            Question::Version => {
                self.version = parse_number(input)?;
                Question::ActiveIndex
            }
            Question::ActiveIndex => {
                self.active_index = self.parse_bank_index(input)?;
                Question::PreviousActiveIndex
            }
            Question::PreviousActiveIndex => {
                self.previous_active_index = self.parse_bank_index(input)?;
                Question::ImageName(0)
            }
            Question::ImageName(i) => {
                if !naming::is_valid_image_name(input) {
                    return Err(FwumdError::Usage(format!(
                        "'{}' is not a valid image name (no spaces, no '{}')",
                        input,
                        naming::BANK_SEPARATOR
                    )));
                }
                if self.images.iter().any(|img| img.name == input) {
                    return Err(FwumdError::Usage(format!(
                        "Image '{}' already exists",
                        input
                    )));
                }
                self.images.push(ImageDraft {
                    name: input.to_string(),
                    location: String::new(),
                    banks: Vec::new(),
                });
                Question::Location(i)
            }
            Question::Location(i) => {
                if input.contains(char::is_whitespace) {
                    return Err(FwumdError::Usage(format!(
                        "Location '{}' may not contain spaces",
                        input
                    )));
                }
                self.images[i].location = input.to_string();
                Question::Accepted(i, 0)
            }
            Question::Accepted(i, j) => {
                let policy = Policy::from_str(&input.to_lowercase())?;
                self.images[i].banks.push(BankEntry {
                    accepted: policy.is_accepted(),
                    reserved: 0,
                });
                Question::Reserved(i, j)
            }
            Question::Reserved(i, j) => {
                let reserved = parse_number(input)?;
                if let Some(bank) = self.images[i].banks.last_mut() {
                    bank.reserved = reserved;
                }
                if j + 1 < self.dims.nb_fw_banks {
                    Question::Accepted(i, j + 1)
                } else if i + 1 < self.dims.nb_fw_img {
                    Question::ImageName(i + 1)
                } else {
                    self.collect_names();
                    Question::Uuids
                }
            }
            Question::Uuids => {
                if input == "q" {
                    Question::Finished
                } else {
                    self.record_uuid(input)?;
                    Question::Uuids
                }
            }
            Question::Finished => Question::Finished,
        };
        Ok(())
    }

    /// Builds the record, generating the UUIDs nobody supplied.
    pub fn finish(self) -> Result<Metadata> {
        if self.question != Question::Finished {
            return Err(FwumdError::Usage(
                "create_metadata was interrupted before all answers were given".to_string(),
            ));
        }
        let uuids = UuidTable {
            locations: fill_missing(self.locations),
            entries: fill_missing(self.entries),
        };
        let mut banks: Vec<Vec<BankEntry>> = Vec::with_capacity(self.images.len());
        let mut images = Vec::with_capacity(self.images.len());
        for draft in self.images {
            banks.push(draft.banks);
            images.push(ImageNames {
                name: draft.name,
                location: draft.location,
            });
        }
        let template = NameTemplate {
            dims: self.dims,
            images,
            uuids,
        };
        let mut metadata = Metadata::from_template(
            template,
            self.version,
            self.active_index,
            self.previous_active_index,
            |i| std::mem::take(&mut banks[i]),
        );
        BinaryCodec::default().seal(&mut metadata)?;
        Ok(metadata)
    }

    /// Asks every question through `prompter`, re-asking after bad answers.
    pub fn run(mut self, prompter: &mut dyn Prompter) -> Result<Metadata> {
        while let Some(prompt) = self.prompt() {
            let answer = prompter.ask(&prompt.text, prompt.default.as_deref())?;
            if let Err(e) = self.answer(&answer) {
                prompter.tell(&e.to_string());
            }
        }
        prompter.tell("Generating missing UUIDs");
        self.finish()
    }

    fn parse_bank_index(&self, input: &str) -> Result<u32> {
        let index: u32 = parse_number(input)?;
        if index as usize >= self.dims.nb_fw_banks {
            return Err(FwumdError::Usage(format!(
                "Index {} is outside [0, {})",
                index, self.dims.nb_fw_banks
            )));
        }
        Ok(index)
    }

    fn collect_names(&mut self) {
        for img in &self.images {
            self.locations.entry(img.location.clone()).or_insert(None);
            self.entries.entry(img.name.clone()).or_insert(None);
            for bank in 0..img.banks.len() {
                self.entries
                    .entry(naming::bank_name(&img.name, bank))
                    .or_insert(None);
            }
        }
    }

    fn record_uuid(&mut self, input: &str) -> Result<()> {
        let mut parts = input.split_whitespace();
        let (Some(id), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(FwumdError::Usage(
                "Expected '<id> <uuid>' or q".to_string(),
            ));
        };
        let uuid = Uuid::parse_str(value).map_err(|_| {
            FwumdError::Usage(format!(
                "Wrong UUID '{}', must be of format xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx",
                value
            ))
        })?;
        let mut known = false;
        for table in [&mut self.locations, &mut self.entries] {
            if let Some(slot) = table.get_mut(id) {
                *slot = Some(uuid);
                known = true;
            }
        }
        if !known {
            return Err(FwumdError::Usage(format!("ID '{}' not recognized", id)));
        }
        Ok(())
    }
}

fn parse_number(input: &str) -> Result<u32> {
    input
        .parse()
        .map_err(|_| FwumdError::Usage(format!("'{}' is not a number", input)))
}

fn parse_count(input: &str) -> Result<usize> {
    match input.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(FwumdError::Usage(format!(
            "'{}' is not a positive number",
            input
        ))),
    }
}

fn fill_missing(table: IndexMap<String, Option<Uuid>>) -> IndexMap<String, Uuid> {
    table
        .into_iter()
        .map(|(name, uuid)| (name, uuid.unwrap_or_else(Uuid::new_v4)))
        .collect()
}
