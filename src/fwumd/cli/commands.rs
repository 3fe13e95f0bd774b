use super::print::{print_messages, print_result};
use super::prompt::{TerminalInput, SHELL_INTRO, SHELL_PROMPT};
use super::setup::{self, Cli, Commands};
use colored::Colorize;
use fwumd::api::{CmdMessage, FwumdApi};
use fwumd::binary::BinaryCodec;
use fwumd::config::FwumdConfig;
use fwumd::error::Result;
use fwumd::model::Dims;
use fwumd::shell::script::Script;
use fwumd::shell::{ScriptEvent, Session};
use fwumd::store::fs::FileStore;
use fwumd::store::DataStore;
use std::path::{Path, PathBuf};
use tracing::debug;

struct AppContext {
    api: FwumdApi<FileStore>,
    config: FwumdConfig,
    /// Dimensions given on the command line, if any
    pinned_dims: Option<Dims>,
}

impl AppContext {
    /// Dimensions for new records: flags first, then config.
    fn dims(&self) -> Dims {
        self.pinned_dims.unwrap_or_else(|| self.config.dims())
    }
}

struct ShellOptions {
    jsonfile: Option<PathBuf>,
    binfile: Option<PathBuf>,
    script: Option<PathBuf>,
    keep: bool,
    verbose: bool,
    commands: Vec<String>,
}

pub fn run() -> Result<()> {
    let cli = setup::parse();
    let ctx = init_context(&cli)?;

    match cli.command {
        Commands::Dummy {
            display,
            jsonfile,
            binfile,
        } => handle_dummy(ctx, display, &jsonfile, &binfile),
        Commands::Jsonparse {
            jsonfile,
            display,
            binfile,
        } => handle_jsonparse(ctx, &jsonfile, &binfile, display),
        Commands::Binparse {
            binfile,
            display,
            jsonfile,
            template,
        } => handle_binparse(ctx, &binfile, &jsonfile, template.as_deref(), display),
        Commands::Dump { binfile } => handle_dump(ctx, &binfile),
        Commands::Shell {
            jsonfile,
            binfile,
            script,
            keep,
            verbose,
            commands,
        } => handle_shell(
            ctx,
            ShellOptions {
                jsonfile,
                binfile,
                script,
                keep,
                verbose,
                commands,
            },
        ),
    }
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let config = match FwumdConfig::resolve_dir(cli.config.as_deref()) {
        Some(dir) => FwumdConfig::load(&dir)?,
        None => FwumdConfig::default(),
    };
    debug!(?config, "configuration loaded");

    let pinned_dims = match (cli.nb_fw_imgs, cli.nb_banks) {
        (None, None) => None,
        (nb_fw_img, nb_fw_banks) => Some(Dims::checked(
            nb_fw_img.unwrap_or(config.nb_fw_img),
            nb_fw_banks.unwrap_or(config.nb_fw_banks),
        )?),
    };

    let codec =
        BinaryCodec::default().with_verification(cli.verify_checksum || config.verify_checksum);
    Ok(AppContext {
        api: FwumdApi::new(FileStore::new(), codec),
        config,
        pinned_dims,
    })
}

fn handle_dummy(mut ctx: AppContext, display: bool, jsonfile: &Path, binfile: &Path) -> Result<()> {
    let dims = ctx.dims();
    let result = ctx.api.dummy(dims, jsonfile, binfile, display)?;
    print_result(&result);
    Ok(())
}

fn handle_jsonparse(
    mut ctx: AppContext,
    jsonfile: &Path,
    binfile: &Path,
    display: bool,
) -> Result<()> {
    let result = ctx.api.jsonparse(jsonfile, binfile, display)?;
    print_result(&result);
    Ok(())
}

fn handle_binparse(
    mut ctx: AppContext,
    binfile: &Path,
    jsonfile: &Path,
    template: Option<&Path>,
    display: bool,
) -> Result<()> {
    let expected = ctx.pinned_dims;
    let result = ctx
        .api
        .binparse(binfile, jsonfile, template, expected, display)?;
    print_result(&result);
    Ok(())
}

fn handle_dump(ctx: AppContext, binfile: &Path) -> Result<()> {
    let result = ctx.api.dump(binfile, ctx.pinned_dims)?;
    print_result(&result);
    Ok(())
}

fn handle_shell(ctx: AppContext, options: ShellOptions) -> Result<()> {
    let AppContext {
        api,
        config,
        pinned_dims,
    } = ctx;
    let mut session = api
        .into_session()
        .with_defaults(config.dims(), config.default_location.clone())
        .with_prompter(Box::new(TerminalInput::new()));

    match (&options.jsonfile, &options.binfile) {
        (Some(json), Some(bin)) => print_result(&session.load_pair(json, bin)?),
        (Some(json), None) => print_result(&session.load_json(json)?),
        (None, Some(bin)) => print_result(&session.load_binary(bin, pinned_dims)?),
        (None, None) => {}
    }

    let mut script = match &options.script {
        Some(path) => Script::parse(&session.store().read_to_string(path)?),
        None => Script::default(),
    };
    if !options.commands.is_empty() {
        script.push_line(&options.commands.join(" "));
    }

    session.set_interactive(false);
    let verbose = options.verbose;
    let outcome = session.run_script_with(&script, |event| match event {
        ScriptEvent::Started(command) if verbose => {
            println!("{}", format!("+ {}", command.text).dimmed())
        }
        ScriptEvent::Started(_) => {}
        ScriptEvent::Finished(_, result) => print_result(result),
    })?;

    if !outcome.exit && (options.keep || script.is_empty()) {
        interact(&mut session)?;
    }

    write_back(&mut session, &options)
}

/// The read-eval-print loop behind `fwupd> `.
fn interact<S: DataStore>(session: &mut Session<S>) -> Result<()> {
    session.set_interactive(true);
    let input = TerminalInput::new();
    println!("{}", SHELL_INTRO);
    while let Some(line) = input.read_line(SHELL_PROMPT)? {
        match session.execute_line(&line) {
            Ok(result) => {
                print_result(&result);
                if result.exit {
                    break;
                }
            }
            Err(e) => eprintln!("{} {}", "Error:".red(), e),
        }
    }
    println!();
    Ok(())
}

/// Writes the files the session was opened with from its final record.
fn write_back<S: DataStore>(session: &mut Session<S>, options: &ShellOptions) -> Result<()> {
    if session.metadata().is_none() {
        if options.jsonfile.is_some() || options.binfile.is_some() {
            print_messages(&[CmdMessage::warning("No metadata in memory, nothing written back")]);
        }
        return Ok(());
    }
    if let Some(json) = &options.jsonfile {
        print_result(&session.save_json(json)?);
    }
    if let Some(bin) = &options.binfile {
        print_result(&session.save_binary(bin)?);
    }
    Ok(())
}
