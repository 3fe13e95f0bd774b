//! # CLI Behavior
//!
//! This is **one possible UI client** for fwumd. It is the only place that
//! knows about terminal I/O, exit codes and output formatting.
//!
//! ## Subcommands
//!
//! - `dummy`: write a default record as `dummy.json` / `dummy.bin`
//! - `jsonparse <json>`: validate a JSON record and write its binary
//! - `binparse <bin>`: decode a binary and write its JSON, names taken from
//!   `--template` when given
//! - `dump <bin>`: list the words of a binary
//! - `shell`: run commands against one record, from a script, from the
//!   command line, or typed at the `fwupd> ` prompt
//!
//! The dimension flags can still be spelled `-ni` / `-nb`; those are
//! rewritten to their long forms before clap sees them.
//!
//! ## Shell sessions
//!
//! Files given with `-j` / `-b` are loaded before anything runs (as a pair
//! when both are given) and written back from the session's record when it
//! ends. A failing script stops the session before anything is written back.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Per-command handlers that call the API and print results
//! - `print`: Output formatting
//! - `prompt`: Terminal input for the shell and `create_metadata`

mod commands;
mod print;
mod prompt;
pub mod setup;

pub use commands::run;
