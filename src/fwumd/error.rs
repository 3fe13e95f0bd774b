use std::fmt;
use thiserror::Error;

/// The invariant a metadata record broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantKind {
    /// `nb_fw_img` or `nb_fw_banks` is zero.
    EmptyDimensions,
    /// The record would be larger than a 32-bit size can describe.
    TooLarge { nb_fw_img: usize, nb_fw_banks: usize },
    ImageCount { expected: usize, found: usize },
    BankCount {
        image: String,
        expected: usize,
        found: usize,
    },
    MissingUuid(String),
    OrphanUuid(String),
    DuplicateName(String),
    InvalidName(String),
    IndexOutOfRange {
        field: &'static str,
        index: u32,
        nb_fw_banks: usize,
    },
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantKind::EmptyDimensions => {
                write!(f, "nb_fw_img and nb_fw_banks must both be at least 1")
            }
            InvariantKind::TooLarge {
                nb_fw_img,
                nb_fw_banks,
            } => write!(
                f,
                "{} images x {} banks do not fit a 32-bit record",
                nb_fw_img, nb_fw_banks
            ),
            InvariantKind::ImageCount { expected, found } => write!(
                f,
                "image count: configs declare {} images, found {}",
                expected, found
            ),
            InvariantKind::BankCount {
                image,
                expected,
                found,
            } => write!(
                f,
                "bank count: image '{}' has {} banks, configs declare {}",
                image, found, expected
            ),
            InvariantKind::MissingUuid(name) => write!(f, "missing UUID for '{}'", name),
            InvariantKind::OrphanUuid(name) => {
                write!(f, "UUID declared for unknown name '{}'", name)
            }
            InvariantKind::DuplicateName(name) => write!(f, "name '{}' is used twice", name),
            InvariantKind::InvalidName(name) => write!(
                f,
                "name '{}' does not follow the <image>_bank_<n> naming",
                name
            ),
            InvariantKind::IndexOutOfRange {
                field,
                index,
                nb_fw_banks,
            } => write!(
                f,
                "{} {} is outside [0, {})",
                field, index, nb_fw_banks
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum FwumdError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Layout mismatch: {0}")]
    LayoutMismatch(String),

    #[error("Checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("Invariant violated: {0}")]
    InvariantViolation(InvariantKind),

    #[error("JSON and binary metadata differ: {0}")]
    PairMismatch(String),

    #[error("Image '{0}' not found in metadata")]
    UnknownImage(String),

    #[error("Bank {bank} not found in image '{image}'")]
    UnknownBank { image: String, bank: String },

    #[error("Command '{0}' is only available in interactive mode")]
    InteractiveCommandForbidden(String),

    #[error("No metadata loaded (use load, autodummy or create_metadata first)")]
    NoModelLoaded,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0}")]
    Usage(String),

    #[error("Script stopped at command {index}/{total} (line {line}: '{command}'): {source}")]
    Script {
        line: usize,
        index: usize,
        total: usize,
        command: String,
        source: Box<FwumdError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl FwumdError {
    /// Unwraps script context to the error that actually stopped the run.
    pub fn root(&self) -> &FwumdError {
        match self {
            FwumdError::Script { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, FwumdError>;
