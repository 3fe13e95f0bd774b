//! The shell's command table: names, usage, help and script permission.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub help: &'static str,
    /// Usable when the shell runs a script rather than a person.
    pub scriptable: bool,
}

impl CommandSpec {
    const fn new(name: &'static str, usage: &'static str, help: &'static str) -> Self {
        Self {
            name,
            aliases: &[],
            usage,
            help,
            scriptable: true,
        }
    }

    const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    const fn interactive_only(mut self) -> Self {
        self.scriptable = false;
        self
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| *alias == name)
    }
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("echo", "echo <text>", "Prints a message in the shell"),
    CommandSpec::new("exit", "exit", "Exit the shell").aliases(&["quit", "q", "Q", "bye"]),
    CommandSpec::new(
        "test",
        "test [args...]",
        "Test command for the shell, prints hello world and echoes the args",
    ),
    CommandSpec::new(
        "help",
        "help [command]",
        "Lists the commands, or shows the usage of one",
    ),
    CommandSpec::new(
        "get_script_cmds",
        "get_script_cmds",
        "Get the shell commands allowed inside a script",
    ),
    CommandSpec::new(
        "load",
        "load json <file> | load binary <file> [nb_fw_imgs nb_banks] | load pair <json> <bin>",
        "Loads a file in memory. A pair is loaded json first, then checked against the binary",
    ),
    CommandSpec::new("load_json", "load_json <file>", "Loads a JSON metadata file"),
    CommandSpec::new(
        "load_binary",
        "load_binary <file> [nb_fw_imgs nb_banks]",
        "Loads a binary metadata file, reusing known names when the dimensions match",
    ),
    CommandSpec::new(
        "save",
        "save json <file> | save binary <file> | save pair <json> <bin>",
        "Writes the metadata in memory to disk",
    ),
    CommandSpec::new("save_json", "save_json <file>", "Save the metadata as a JSON file"),
    CommandSpec::new(
        "save_binary",
        "save_binary <file>",
        "Save the metadata as a binary file",
    ),
    CommandSpec::new(
        "autodummy",
        "autodummy <nb_fw_imgs> <nb_banks>",
        "Auto-generate a dummy metadata in memory",
    ),
    CommandSpec::new("dump", "dump", "Dump the metadata held in memory"),
    CommandSpec::new(
        "set_bank_policy",
        "set_bank_policy <image name|index|uuid> <bank number> <accept|1|true|refuse|0|false>",
        "Set the policy (accept / refuse) of a bank",
    ),
    CommandSpec::new(
        "set_active_index",
        "set_active_index <index>",
        "Changes the active_index in the metadata",
    ),
    CommandSpec::new(
        "set_previous_active_index",
        "set_previous_active_index <index>",
        "Changes the previous_active_index in the metadata",
    ),
    CommandSpec::new(
        "print_choices_uuids",
        "print_choices_uuids",
        "Prints the UUID of the images selected from the banks",
    ),
    CommandSpec::new(
        "print_all_uuids",
        "print_all_uuids",
        "Prints the UUIDs for all the images, image types and locations",
    ),
    CommandSpec::new(
        "create_metadata",
        "create_metadata",
        "Interactive human-friendly tool to create metadata from scratch",
    )
    .interactive_only(),
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.matches(name))
}

/// Names of the commands a script may use, in table order.
pub fn script_commands() -> impl Iterator<Item = &'static str> {
    COMMANDS
        .iter()
        .filter(|spec| spec.scriptable)
        .map(|spec| spec.name)
}
