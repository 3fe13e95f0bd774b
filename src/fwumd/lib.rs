//! # fwumd Architecture
//!
//! fwumd maintains a firmware-update metadata record: a set of firmware
//! images, each spread over the same number of redundant storage banks, with
//! one global selector saying which bank set boots. The record lives in two
//! forms that must stay in step: a fixed-layout little-endian binary read by
//! the bootloader, and a JSON document people edit.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, reads the terminal     │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands and the shell engine           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/, shell/)                          │
//! │  - One-shot conversions and the line-oriented engine        │
//! │  - Return CmdResult, never print                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Codec Layer (layout, binary, text, naming, validate)       │
//! │  - Pure functions over Metadata and bytes                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - DataStore trait: FileStore, InMemoryStore                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shape comes from the data
//!
//! `configs.nb_fw_img` and `configs.nb_fw_banks` decide how long the binary
//! is and where every bank lives. [`layout`] is the only module that turns
//! them into offsets; [`binary`] encodes and decodes by walking that layout.
//!
//! ## Names live outside the binary
//!
//! The binary carries no names and no UUIDs. Decoding takes them from a
//! [`naming::NameTemplate`], either one taken from a JSON record with the
//! same dimensions or a generated one.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: `dummy`, `jsonparse`, `binparse`, `dump` and `CmdResult`
//! - [`shell`]: The command engine, its script parser and the interactive builder
//! - [`model`]: `Metadata`, `ImageEntry`, `BankEntry`, `Dims`
//! - [`layout`], [`binary`], [`checksum`]: The binary form
//! - [`text`]: The JSON form
//! - [`naming`]: Bank naming and UUID templates
//! - [`validate`]: Record and pair consistency checks
//! - [`store`]: Storage abstraction and implementations
//! - [`config`]: Configuration management
//! - [`error`]: Error types
//! - `cli`: Argument parsing, printing and terminal input for the binary (not part of the lib API)

pub mod api;
pub mod binary;
pub mod checksum;
pub mod commands;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod naming;
pub mod shell;
pub mod store;
pub mod text;
pub mod validate;
