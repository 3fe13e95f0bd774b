use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fwumd", bin_name = "fwumd", version)]
#[command(
    about = "Inspect, convert and script firmware-update metadata",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Number of firmware images in entries
    #[arg(
        long = "nb-fw-imgs",
        visible_alias = "nb-img-in-banks",
        global = true,
        help_heading = "Options"
    )]
    pub nb_fw_imgs: Option<usize>,

    /// Number of firmware banks for each image
    #[arg(long = "nb-banks", global = true, help_heading = "Options")]
    pub nb_banks: Option<usize>,

    /// Refuse binaries whose stored checksum does not match their content
    #[arg(long, global = true, help_heading = "Options")]
    pub verify_checksum: bool,

    /// Directory holding config.json
    #[arg(long, global = true, help_heading = "Options")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a dummy JSON metadata file and a dummy binary metadata file
    Dummy {
        /// Display the content of the binary metadata after creation
        #[arg(short = 'v', long)]
        display: bool,

        /// The JSON file where to write the dummy metadata
        #[arg(short = 'j', long = "jsonfile", default_value = "dummy.json")]
        jsonfile: PathBuf,

        /// The binary file where to write the dummy metadata
        #[arg(short = 'b', long = "binfile", default_value = "dummy.bin")]
        binfile: PathBuf,
    },

    /// Parse a JSON metadata file and create the binary metadata file
    Jsonparse {
        /// The JSON file to read the metadata from
        jsonfile: PathBuf,

        /// Display the content of the binary metadata after creation
        #[arg(short = 'v', long)]
        display: bool,

        /// The binary file where to write the binary metadata
        #[arg(short = 'b', long = "binfile", default_value = "fwupd.bin")]
        binfile: PathBuf,
    },

    /// Parse a binary metadata file and generate the JSON metadata file
    Binparse {
        /// The binary file to read the metadata from
        binfile: PathBuf,

        /// Display the content of the binary metadata
        #[arg(short = 'v', long)]
        display: bool,

        /// The JSON file where to write the generated JSON metadata
        #[arg(short = 'j', long = "jsonfile", default_value = "fwupd.json")]
        jsonfile: PathBuf,

        /// A JSON metadata file to take dimensions, names and UUIDs from
        #[arg(short = 't', long)]
        template: Option<PathBuf>,
    },

    /// Read a binary metadata file and print its data
    Dump {
        /// The binary file to read the metadata from
        binfile: PathBuf,
    },

    /// Open a shell to interact with the metadata
    Shell {
        /// The JSON file to interact with
        #[arg(short = 'j', long = "jsonfile")]
        jsonfile: Option<PathBuf>,

        /// The binary file to interact with
        #[arg(short = 'b', long = "binfile")]
        binfile: Option<PathBuf>,

        /// A file containing the commands to pass to the shell
        #[arg(short = 's', long)]
        script: Option<PathBuf>,

        /// Keep the shell open for interactive commands after the script
        #[arg(short = 'k', long)]
        keep: bool,

        /// Display the commands as they run
        #[arg(short = 'v', long)]
        verbose: bool,

        /// Comma-separated commands, run after the script
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        commands: Vec<String>,
    },
}

const LEGACY_FLAGS: [(&str, &str); 2] = [("-ni", "--nb-fw-imgs"), ("-nb", "--nb-banks")];

/// Rewrites the two-letter single-dash flags clap cannot express.
///
/// Everything after a bare `--` is left alone.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            for (legacy, long) in LEGACY_FLAGS {
                if text == legacy {
                    return OsString::from(long);
                }
                if let Some(value) = text.strip_prefix(legacy).and_then(|v| v.strip_prefix('=')) {
                    return OsString::from(format!("{}={}", long, value));
                }
            }
            arg
        })
        .collect()
}

pub fn parse() -> Cli {
    Cli::parse_from(normalize_legacy_flags(std::env::args_os()))
}
