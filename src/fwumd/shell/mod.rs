//! # Command Engine
//!
//! A [`Session`] holds one canonical [`Metadata`] and a side table of the
//! last names it saw. Every file it writes is derived from that one record,
//! so a json/binary pair saved together cannot disagree.
//!
//! Commands arrive as text, either typed by a person (`interactive`) or read
//! from a script. The script allowlist is checked before a command's
//! arguments are even looked at, so a forbidden command never touches the
//! session. Mutations are applied to a copy that must pass validation before
//! it replaces the current record.

use crate::binary::{self, BinaryCodec};
use crate::commands::{CmdMessage, CmdResult, DumpView, UuidReport};
use crate::error::{FwumdError, Result};
use crate::model::{Dims, Metadata, Policy};
use crate::naming::NameTemplate;
use crate::store::DataStore;
use crate::text;
use crate::validate::{self, NameSource};
use std::path::Path;
use tracing::{debug, info};

pub mod builder;
pub mod catalog;
pub mod script;

use builder::{MetadataBuilder, Prompter};
use catalog::CommandSpec;
use script::{Script, ScriptCommand};

#[derive(Debug)]
pub enum ScriptEvent<'a> {
    Started(&'a ScriptCommand),
    Finished(&'a ScriptCommand, &'a CmdResult),
}

pub struct Session<S: DataStore> {
    store: S,
    codec: BinaryCodec,
    model: Option<Metadata>,
    names: Option<NameTemplate>,
    interactive: bool,
    prompter: Option<Box<dyn Prompter>>,
    default_dims: Dims,
    default_location: String,
}

impl<S: DataStore> Session<S> {
    pub fn new(store: S, codec: BinaryCodec) -> Self {
        Self {
            store,
            codec,
            model: None,
            names: None,
            interactive: false,
            prompter: None,
            default_dims: Dims::new(1, 2),
            default_location: "sda".to_string(),
        }
    }

    /// Defaults offered by `create_metadata`.
    pub fn with_defaults(mut self, dims: Dims, location: impl Into<String>) -> Self {
        self.default_dims = dims;
        self.default_location = location.into();
        self
    }

    pub fn with_prompter(mut self, prompter: Box<dyn Prompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.model.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // --- Commands with typed arguments ---

    pub fn autodummy(&mut self, dims: Dims) -> Result<CmdResult> {
        let metadata = Metadata::dummy(dims)?;
        self.install(metadata)?;
        Ok(CmdResult::default().with_message(CmdMessage::success(format!(
            "Dummy metadata ({}) created",
            dims
        ))))
    }

    pub fn load_json(&mut self, path: &Path) -> Result<CmdResult> {
        let metadata = text::decode(&self.store.read_to_string(path)?)?;
        let dims = metadata.dims();
        self.install(metadata)?;
        info!(path = %path.display(), %dims, "loaded json metadata");
        Ok(CmdResult::default().with_message(CmdMessage::success(format!(
            "Loaded {} ({})",
            path.display(),
            dims
        ))))
    }

    /// Loads a binary record, naming it after the last record seen when the
    /// dimensions agree.
    pub fn load_binary(&mut self, path: &Path, expected: Option<Dims>) -> Result<CmdResult> {
        let bytes = self.store.read(path)?;
        let dims = binary::read_dims(&bytes)?;
        let template = self.names.as_ref().filter(|names| names.dims == dims);
        let templated = template.is_some();
        let metadata = self.codec.decode(&bytes, expected, template)?;
        self.install(metadata)?;
        info!(path = %path.display(), %dims, templated, "loaded binary metadata");

        let mut result = CmdResult::default().with_message(CmdMessage::success(format!(
            "Loaded {} ({})",
            path.display(),
            dims
        )));
        if !templated {
            result.add_message(CmdMessage::info(
                "No known names for these dimensions: names were generated",
            ));
        }
        Ok(result)
    }

    /// Loads json, then checks the binary describes the same record.
    pub fn load_pair(&mut self, json_path: &Path, bin_path: &Path) -> Result<CmdResult> {
        let json = text::decode(&self.store.read_to_string(json_path)?)?;
        validate::validate(&json)?;

        let bytes = self.store.read(bin_path)?;
        let (binary, source) = if binary::read_dims(&bytes)? == json.dims() {
            let template = NameTemplate::from_metadata(&json);
            let decoded = self.codec.decode(&bytes, None, Some(&template))?;
            (decoded, NameSource::Template)
        } else {
            (self.codec.decode(&bytes, None, None)?, NameSource::Synthesized)
        };
        validate::validate(&binary)?;
        validate::cross_validate(&json, &binary, source)?;

        let dims = json.dims();
        self.install(json)?;
        info!(
            json = %json_path.display(),
            bin = %bin_path.display(),
            %dims,
            "loaded metadata pair"
        );
        Ok(CmdResult::default().with_message(CmdMessage::success(format!(
            "Loaded pair {} and {} ({})",
            json_path.display(),
            bin_path.display(),
            dims
        ))))
    }

    pub fn save_json(&mut self, path: &Path) -> Result<CmdResult> {
        let content = text::encode(self.current()?)?;
        self.store.write(path, content.as_bytes())?;
        info!(path = %path.display(), "saved json metadata");
        Ok(saved(path))
    }

    pub fn save_binary(&mut self, path: &Path) -> Result<CmdResult> {
        let bytes = self.codec.encode(self.current()?)?;
        self.store.write(path, &bytes)?;
        info!(path = %path.display(), "saved binary metadata");
        Ok(saved(path))
    }

    pub fn save_pair(&mut self, json_path: &Path, bin_path: &Path) -> Result<CmdResult> {
        let mut result = self.save_json(json_path)?;
        result.merge(self.save_binary(bin_path)?);
        Ok(result)
    }

    pub fn set_bank_policy(
        &mut self,
        image_ref: &str,
        bank: usize,
        policy: Policy,
    ) -> Result<CmdResult> {
        self.mutate(|m| m.set_bank_policy(image_ref, bank, policy))?;
        Ok(CmdResult::default())
    }

    pub fn set_active_index(&mut self, index: u32) -> Result<CmdResult> {
        self.mutate(|m| m.set_active_index(index))?;
        Ok(CmdResult::default())
    }

    pub fn set_previous_active_index(&mut self, index: u32) -> Result<CmdResult> {
        self.mutate(|m| m.set_previous_active_index(index))?;
        Ok(CmdResult::default())
    }

    pub fn dump(&self) -> Result<CmdResult> {
        let metadata = self.current()?;
        let view = DumpView::binary(metadata)?.with_text(metadata)?;
        Ok(CmdResult::default().with_dump(view))
    }

    pub fn print_all_uuids(&self) -> Result<CmdResult> {
        Ok(CmdResult::default().with_uuids(UuidReport::all(self.current()?)))
    }

    pub fn print_choices_uuids(&self) -> Result<CmdResult> {
        Ok(CmdResult::default().with_uuids(UuidReport::choices(self.current()?)))
    }

    pub fn create_metadata(&mut self) -> Result<CmdResult> {
        if !self.interactive {
            return Err(FwumdError::InteractiveCommandForbidden(
                "create_metadata".to_string(),
            ));
        }
        let builder = MetadataBuilder::new(self.default_dims, self.default_location.clone());
        let prompter = self.prompter.as_deref_mut().ok_or_else(|| {
            FwumdError::Usage("create_metadata needs someone to answer its questions".to_string())
        })?;
        let metadata = builder.run(prompter)?;
        self.install(metadata)?;
        Ok(CmdResult::default().with_message(CmdMessage::info(
            "Call command 'save' to write changes to filesystem",
        )))
    }

    // --- Text commands ---

    /// Runs every command on one input line (`,`-separated, `#` comments),
    /// stopping at the first error or at `exit`.
    pub fn execute_line(&mut self, line: &str) -> Result<CmdResult> {
        let mut result = CmdResult::default();
        for command in script::split_line(line) {
            result.merge(self.execute(command)?);
            if result.exit {
                break;
            }
        }
        Ok(result)
    }

    /// Runs a script, halting at the first failing command.
    pub fn run_script(&mut self, script: &Script) -> Result<CmdResult> {
        self.run_script_with(script, |_| {})
    }

    /// Like [`Session::run_script`], reporting each command as it starts and
    /// finishes so output can be shown as it happens.
    pub fn run_script_with(
        &mut self,
        script: &Script,
        mut observe: impl FnMut(ScriptEvent<'_>),
    ) -> Result<CmdResult> {
        let total = script.len();
        let mut result = CmdResult::default();
        for (index, command) in script.commands().iter().enumerate() {
            observe(ScriptEvent::Started(command));
            match self.execute(&command.text) {
                Ok(outcome) => {
                    observe(ScriptEvent::Finished(command, &outcome));
                    result.merge(outcome);
                    if result.exit {
                        debug!(line = command.line, "script ended by exit");
                        break;
                    }
                }
                Err(source) => {
                    return Err(FwumdError::Script {
                        line: command.line,
                        index: index + 1,
                        total,
                        command: command.text.clone(),
                        source: Box::new(source),
                    })
                }
            }
        }
        Ok(result)
    }

    /// Runs a single command with its arguments.
    pub fn execute(&mut self, command: &str) -> Result<CmdResult> {
        let command = command.trim();
        let mut words = command.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(CmdResult::default());
        };
        let args: Vec<&str> = words.collect();

        let spec = catalog::lookup(name).ok_or_else(|| FwumdError::UnknownCommand(name.to_string()))?;
        if !self.interactive && !spec.scriptable {
            return Err(FwumdError::InteractiveCommandForbidden(spec.name.to_string()));
        }
        debug!(command = spec.name, ?args, "executing shell command");

        match spec.name {
            "echo" => {
                let text = command[name.len()..].trim();
                Ok(CmdResult::default().with_message(CmdMessage::info(text)))
            }
            "exit" => Ok(CmdResult {
                exit: true,
                ..CmdResult::default()
            }),
            "test" => Ok(CmdResult::default()
                .with_message(CmdMessage::info("Hello world!"))
                .with_message(CmdMessage::info(args.join(" ")))),
            "help" => help(args.first().copied()),
            "get_script_cmds" => {
                let mut result = CmdResult::default();
                for name in catalog::script_commands() {
                    result.add_message(CmdMessage::info(name));
                }
                Ok(result)
            }
            "load" => {
                expect_args(spec, &args, 1)?;
                match args[0] {
                    "json" => self.run_load_json(spec, &args[1..]),
                    "binary" => self.run_load_binary(spec, &args[1..]),
                    "pair" => {
                        expect_args(spec, &args, 3)?;
                        self.load_pair(Path::new(args[1]), Path::new(args[2]))
                    }
                    other => Err(wrong_argument(spec, other)),
                }
            }
            "load_json" => self.run_load_json(spec, &args),
            "load_binary" => self.run_load_binary(spec, &args),
            "save" => {
                expect_args(spec, &args, 2)?;
                match args[0] {
                    "json" => self.save_json(Path::new(args[1])),
                    "binary" => self.save_binary(Path::new(args[1])),
                    "pair" => {
                        expect_args(spec, &args, 3)?;
                        self.save_pair(Path::new(args[1]), Path::new(args[2]))
                    }
                    other => Err(wrong_argument(spec, other)),
                }
            }
            "save_json" => {
                expect_args(spec, &args, 1)?;
                self.save_json(Path::new(args[0]))
            }
            "save_binary" => {
                expect_args(spec, &args, 1)?;
                self.save_binary(Path::new(args[0]))
            }
            "autodummy" => {
                expect_args(spec, &args, 2)?;
                let dims = Dims::new(parse_arg(args[0], "nb_fw_imgs")?, parse_arg(args[1], "nb_banks")?);
                self.autodummy(dims)
            }
            "dump" => self.dump(),
            "set_bank_policy" => {
                expect_args(spec, &args, 3)?;
                if !args[1].bytes().all(|b| b.is_ascii_digit()) {
                    return Err(FwumdError::Usage(format!(
                        "Bank has to be set by number (got '{}' which is not a number)",
                        args[1]
                    )));
                }
                let bank = parse_arg(args[1], "bank")?;
                let policy: Policy = args[2].parse()?;
                self.set_bank_policy(args[0], bank, policy)
            }
            "set_active_index" => {
                expect_args(spec, &args, 1)?;
                self.set_active_index(parse_arg(args[0], "index")?)
            }
            "set_previous_active_index" => {
                expect_args(spec, &args, 1)?;
                self.set_previous_active_index(parse_arg(args[0], "index")?)
            }
            "print_choices_uuids" => self.print_choices_uuids(),
            "print_all_uuids" => self.print_all_uuids(),
            "create_metadata" => self.create_metadata(),
            other => Err(FwumdError::UnknownCommand(other.to_string())),
        }
    }

    fn run_load_json(&mut self, spec: &CommandSpec, args: &[&str]) -> Result<CmdResult> {
        expect_args(spec, args, 1)?;
        self.load_json(Path::new(args[0]))
    }

    fn run_load_binary(&mut self, spec: &CommandSpec, args: &[&str]) -> Result<CmdResult> {
        let expected = match args.len() {
            1 => None,
            3 => Some(Dims::new(
                parse_arg(args[1], "nb_fw_imgs")?,
                parse_arg(args[2], "nb_banks")?,
            )),
            n => {
                return Err(FwumdError::Usage(format!(
                    "Expected 1 or 3 arguments, got {}\n\tUsage: {}",
                    n, spec.usage
                )))
            }
        };
        self.load_binary(Path::new(args[0]), expected)
    }

    fn current(&self) -> Result<&Metadata> {
        self.model.as_ref().ok_or(FwumdError::NoModelLoaded)
    }

    /// Validates `metadata` and makes it the session's record.
    fn install(&mut self, mut metadata: Metadata) -> Result<()> {
        validate::validate(&metadata)?;
        self.codec.seal(&mut metadata)?;
        self.names = Some(NameTemplate::from_metadata(&metadata));
        self.model = Some(metadata);
        Ok(())
    }

    fn mutate(&mut self, change: impl FnOnce(&mut Metadata) -> Result<()>) -> Result<()> {
        let mut next = self.current()?.clone();
        change(&mut next)?;
        self.install(next)
    }
}

fn saved(path: &Path) -> CmdResult {
    CmdResult::default()
        .with_written(vec![path.to_path_buf()])
        .with_message(CmdMessage::success(format!("Saved {}", path.display())))
}

fn help(topic: Option<&str>) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    match topic {
        Some(name) => {
            let spec = catalog::lookup(name)
                .ok_or_else(|| FwumdError::UnknownCommand(name.to_string()))?;
            result.add_message(CmdMessage::info(spec.help));
            result.add_message(CmdMessage::info(format!("\tUsage: {}", spec.usage)));
            if !spec.aliases.is_empty() {
                result.add_message(CmdMessage::info(format!(
                    "\tAliases: {}",
                    spec.aliases.join(" ")
                )));
            }
            if !spec.scriptable {
                result.add_message(CmdMessage::warning("\tInteractive mode only"));
            }
        }
        None => {
            for spec in catalog::COMMANDS {
                result.add_message(CmdMessage::info(format!("{:<28}{}", spec.name, spec.help)));
            }
        }
    }
    Ok(result)
}

fn expect_args(spec: &CommandSpec, args: &[&str], count: usize) -> Result<()> {
    if args.len() < count {
        return Err(FwumdError::Usage(format!(
            "Expected at least {} arguments, got {}\n\tUsage: {}",
            count,
            args.len(),
            spec.usage
        )));
    }
    Ok(())
}

fn wrong_argument(spec: &CommandSpec, arg: &str) -> FwumdError {
    FwumdError::Usage(format!("Wrong argument '{}'\n\tUsage: {}", arg, spec.usage))
}

fn parse_arg<T: std::str::FromStr>(arg: &str, what: &str) -> Result<T> {
    arg.parse()
        .map_err(|_| FwumdError::Usage(format!("{} must be a number, got '{}'", what, arg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvariantKind;
    use crate::store::memory::fixtures::PairFixture;
    use crate::store::memory::InMemoryStore;
    use std::collections::VecDeque;

    fn session() -> Session<InMemoryStore> {
        Session::new(InMemoryStore::new(), BinaryCodec::default())
    }

    fn model(session: &Session<InMemoryStore>) -> &Metadata {
        session.metadata().unwrap()
    }

    struct Answers(VecDeque<&'static str>);

    impl Prompter for Answers {
        fn ask(&mut self, _prompt: &str, _default: Option<&str>) -> Result<String> {
            Ok(self.0.pop_front().unwrap_or("").to_string())
        }

        fn tell(&mut self, _message: &str) {}
    }

    #[test]
    fn autodummy_then_dump_shows_one_image_two_banks() {
        let mut s = session();
        s.execute("autodummy 1 2").unwrap();
        let result = s.execute("dump").unwrap();
        let dump = result.dump.unwrap();
        assert_eq!(dump.fields.len(), 6 + 2 * 2);
        let m = text::decode(dump.text.as_deref().unwrap()).unwrap();
        assert_eq!(m.img_entries.len(), 1);
        assert_eq!(m.img_entries[0].banks.len(), 2);
        assert_eq!(m.active_index, 1);
        assert_eq!(m.previous_active_index, 0);
    }

    #[test]
    fn refuse_then_accept_restores_every_bank() {
        let mut s = session();
        s.execute("autodummy 2 3").unwrap();
        for image in 0..2 {
            for bank in 0..3 {
                let before = model(&s).img_entries[image].banks[bank].accepted;
                s.execute(&format!("set_bank_policy {} {} refuse", image, bank))
                    .unwrap();
                assert!(!model(&s).img_entries[image].banks[bank].accepted);
                s.execute(&format!("set_bank_policy {} {} accept", image, bank))
                    .unwrap();
                assert_eq!(model(&s).img_entries[image].banks[bank].accepted, before);
            }
        }
    }

    #[test]
    fn policy_by_name_and_uuid() {
        let mut s = session();
        s.execute("autodummy 2 2").unwrap();
        s.execute("set_bank_policy img_1 0 0").unwrap();
        assert!(!model(&s).img_entries[1].banks[0].accepted);

        let uuid = model(&s).uuids.entries["img_0"];
        s.execute(&format!("set_bank_policy {} 1 false", uuid)).unwrap();
        assert!(!model(&s).img_entries[0].banks[1].accepted);

        assert!(matches!(
            s.execute("set_bank_policy nope 0 accept"),
            Err(FwumdError::UnknownImage(_))
        ));
        assert!(matches!(
            s.execute("set_bank_policy img_0 5 accept"),
            Err(FwumdError::UnknownBank { .. })
        ));
        assert!(matches!(
            s.execute("set_bank_policy img_0 one accept"),
            Err(FwumdError::Usage(_))
        ));
        assert!(matches!(
            s.execute("set_bank_policy img_0 0 maybe"),
            Err(FwumdError::Usage(_))
        ));
    }

    #[test]
    fn mutations_keep_the_checksum_fresh() {
        let mut s = session();
        s.execute("autodummy 1 3").unwrap();
        s.execute_line("set_active_index 2, set_previous_active_index 1")
            .unwrap();
        let m = model(&s).clone();
        assert_eq!((m.active_index, m.previous_active_index), (2, 1));
        let bytes = binary::encode(&m).unwrap();
        let reread = BinaryCodec::default()
            .with_verification(true)
            .decode(&bytes, None, Some(&NameTemplate::from_metadata(&m)))
            .unwrap();
        assert_eq!(reread, m);
    }

    #[test]
    fn out_of_range_index_leaves_the_record_alone() {
        let mut s = session();
        s.execute("autodummy 1 2").unwrap();
        let before = model(&s).clone();
        assert!(matches!(
            s.execute("set_active_index 2"),
            Err(FwumdError::InvariantViolation(_))
        ));
        assert_eq!(model(&s), &before);
    }

    #[test]
    fn commands_need_a_record() {
        let mut s = session();
        for command in ["dump", "save json a.json", "set_active_index 0", "print_all_uuids"] {
            assert!(
                matches!(s.execute(command), Err(FwumdError::NoModelLoaded)),
                "{}",
                command
            );
        }
    }

    #[test]
    fn create_metadata_is_forbidden_in_scripts() {
        let mut s = session().with_prompter(Box::new(Answers(VecDeque::new())));
        s.execute("autodummy 1 2").unwrap();
        let before = model(&s).clone();

        let script = Script::parse("create_metadata\nautodummy 3 3");
        let err = s.run_script(&script).unwrap_err();
        assert!(matches!(
            err.root(),
            FwumdError::InteractiveCommandForbidden(name) if name == "create_metadata"
        ));
        assert_eq!(model(&s), &before);
    }

    #[test]
    fn create_metadata_runs_when_interactive() {
        let answers = VecDeque::from(vec!["2", "2"]);
        let mut s = session().with_prompter(Box::new(Answers(answers)));
        s.set_interactive(true);
        s.execute("create_metadata").unwrap();
        assert_eq!(model(&s).dims(), Dims::new(2, 2));
    }

    #[test]
    fn script_errors_carry_position() {
        let mut s = session();
        let script = Script::parse("# setup\nautodummy 1 2\n\necho ok, set_active_index 7\ndump");
        match s.run_script(&script).unwrap_err() {
            FwumdError::Script {
                line,
                index,
                total,
                command,
                source,
            } => {
                assert_eq!(line, 4);
                assert_eq!(index, 3);
                assert_eq!(total, 4);
                assert_eq!(command, "set_active_index 7");
                assert!(matches!(*source, FwumdError::InvariantViolation(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn observer_sees_each_command() {
        let mut s = session();
        let script = Script::parse("autodummy 1 2, echo hi");
        let mut seen = Vec::new();
        s.run_script_with(&script, |event| match event {
            ScriptEvent::Started(command) => seen.push(format!("> {}", command.text)),
            ScriptEvent::Finished(_, result) => seen.push(format!("< {}", result.messages.len())),
        })
        .unwrap();
        assert_eq!(seen, vec!["> autodummy 1 2", "< 1", "> echo hi", "< 1"]);
    }

    #[test]
    fn exit_ends_a_script_successfully() {
        let mut s = session();
        let script = Script::parse("autodummy 1 2\nbye\nset_active_index 9");
        let result = s.run_script(&script).unwrap();
        assert!(result.exit);
        assert_eq!(model(&s).active_index, 1);
    }

    #[test]
    fn unknown_commands_are_reported() {
        let mut s = session();
        assert!(matches!(
            s.execute("frobnicate"),
            Err(FwumdError::UnknownCommand(name)) if name == "frobnicate"
        ));
        assert!(matches!(s.execute("load yaml x"), Err(FwumdError::Usage(_))));
        assert!(matches!(s.execute("autodummy 1"), Err(FwumdError::Usage(_))));
    }

    #[test]
    fn autodummy_refuses_dims_too_large_for_the_binary() {
        let mut s = session();
        for command in ["autodummy 1 5000000000", "autodummy 536870909 1"] {
            assert!(
                matches!(
                    s.execute(command),
                    Err(FwumdError::InvariantViolation(InvariantKind::TooLarge { .. }))
                ),
                "{} should be refused",
                command
            );
        }
        assert!(s.metadata().is_none());
    }

    #[test]
    fn binary_with_active_index_out_of_range_is_not_loaded() {
        let mut bytes = binary::encode(&Metadata::dummy(Dims::new(1, 2)).unwrap()).unwrap();
        bytes[8..12].copy_from_slice(&2u32.to_le_bytes());
        let store = InMemoryStore::new().with_file("bad.bin", bytes);
        let mut s = Session::new(store, BinaryCodec::default());
        assert!(matches!(
            s.execute("load binary bad.bin"),
            Err(FwumdError::InvariantViolation(InvariantKind::IndexOutOfRange {
                field: "active_index",
                ..
            }))
        ));
        assert!(s.metadata().is_none());
    }

    #[test]
    fn save_pair_writes_files_that_load_back_as_a_pair() {
        let mut s = session();
        s.execute_line("autodummy 2 2, set_bank_policy img_1 1 refuse").unwrap();
        let result = s.execute("save pair out.json out.bin").unwrap();
        assert_eq!(result.written.len(), 2);
        let saved = model(&s).clone();

        let mut other = Session::new(s.into_store(), BinaryCodec::default().with_verification(true));
        other.execute("load pair out.json out.bin").unwrap();
        assert_eq!(model(&other), &saved);
    }

    #[test]
    fn pair_from_different_records_is_rejected() {
        let a = PairFixture::new(1, 2);
        let mut b = Metadata::dummy(Dims::new(1, 2)).unwrap();
        b.set_bank_policy("img_0", 0, Policy::Refuse).unwrap();
        let store = a
            .store
            .with_file("other.bin", binary::encode(&b).unwrap());

        let mut s = Session::new(store, BinaryCodec::default());
        let err = s
            .execute(&format!("load pair {} other.bin", PairFixture::JSON))
            .unwrap_err();
        assert!(matches!(err, FwumdError::PairMismatch(_)));
        assert!(s.metadata().is_none());

        let larger = Metadata::dummy(Dims::new(3, 2)).unwrap();
        let store = s.into_store().with_file("larger.bin", binary::encode(&larger).unwrap());
        let mut s = Session::new(store, BinaryCodec::default());
        assert!(matches!(
            s.execute(&format!("load pair {} larger.bin", PairFixture::JSON)),
            Err(FwumdError::PairMismatch(_))
        ));
    }

    #[test]
    fn load_binary_reuses_known_names() {
        let mut m = Metadata::dummy(Dims::new(1, 2)).unwrap();
        m.img_entries[0].location = "emmc".into();
        let uuid = m.uuids.locations.shift_remove("loc_0").unwrap();
        m.uuids.locations.insert("emmc".into(), uuid);
        let fixture = PairFixture::from_metadata(m.clone());

        let mut s = Session::new(fixture.store, BinaryCodec::default());
        s.execute(&format!("load_json {}", PairFixture::JSON)).unwrap();
        let result = s
            .execute(&format!("load binary {} 1 2", PairFixture::BIN))
            .unwrap();
        assert_eq!(result.messages.len(), 1);
        assert_eq!(model(&s).img_entries[0].location, "emmc");

        let mut fresh = Session::new(s.into_store(), BinaryCodec::default());
        let result = fresh
            .execute(&format!("load_binary {}", PairFixture::BIN))
            .unwrap();
        assert_eq!(result.messages.len(), 2);
        assert_eq!(model(&fresh).img_entries[0].location, "loc_0");
    }

    #[test]
    fn inspection_does_not_mutate() {
        let mut s = session();
        s.execute("autodummy 2 2").unwrap();
        let before = model(&s).clone();
        for command in ["dump", "print_all_uuids", "print_choices_uuids", "help", "get_script_cmds"] {
            s.execute(command).unwrap();
        }
        assert_eq!(model(&s), &before);
    }

    #[test]
    fn choices_warn_when_the_setup_cannot_boot() {
        let mut s = session();
        s.execute_line("autodummy 2 2, set_bank_policy img_1 1 refuse").unwrap();
        match s.execute("print_choices_uuids").unwrap().uuids {
            Some(UuidReport::Choices { will_boot, .. }) => assert!(!will_boot),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn echo_and_help_produce_messages() {
        let mut s = session();
        let result = s.execute("echo  hello,  world").unwrap();
        assert_eq!(result.messages[0].content, "hello,  world");

        let result = s.execute("help q").unwrap();
        assert!(result.messages[0].content.starts_with("Exit"));
        let result = s.execute("get_script_cmds").unwrap();
        assert!(!result
            .messages
            .iter()
            .any(|m| m.content == "create_metadata"));
    }
}
