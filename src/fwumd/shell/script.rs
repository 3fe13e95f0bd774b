//! Script text to command list.
//!
//! Commands are separated by newlines or `,`. A `#` starts a comment that
//! runs to the end of the line. Blank pieces are dropped and never counted.

pub const COMMENT_MARKER: char = '#';
pub const SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    /// 1-based source line.
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    commands: Vec<ScriptCommand>,
    lines: usize,
}

impl Script {
    pub fn parse(source: &str) -> Self {
        let mut script = Self::default();
        for line in source.lines() {
            script.push_line(line);
        }
        script
    }

    /// Appends one more source line, numbered after the ones already read.
    pub fn push_line(&mut self, line: &str) {
        self.lines += 1;
        let number = self.lines;
        self.commands.extend(split_line(line).map(|text| ScriptCommand {
            line: number,
            text: text.to_string(),
        }));
    }

    pub fn commands(&self) -> &[ScriptCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// The commands on a single line, comment stripped.
pub fn split_line(line: &str) -> impl Iterator<Item = &str> {
    let code = match line.find(COMMENT_MARKER) {
        Some(pos) => &line[..pos],
        None => line,
    };
    code.split(SEPARATOR)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blank_lines_are_not_commands() {
        let script = Script::parse("# header\n\nautodummy 1 2 # make one\n   \ndump\n");
        let texts: Vec<&str> = script.commands().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["autodummy 1 2", "dump"]);
        assert_eq!(script.commands()[0].line, 3);
        assert_eq!(script.commands()[1].line, 5);
    }

    #[test]
    fn commas_split_a_line() {
        let script = Script::parse("autodummy 1 2 , set_active_index 0,,dump");
        assert_eq!(script.len(), 3);
        assert!(script.commands().iter().all(|c| c.line == 1));
        assert_eq!(script.commands()[1].text, "set_active_index 0");
    }

    #[test]
    fn pushed_lines_continue_numbering() {
        let mut script = Script::parse("echo a\necho b");
        script.push_line("dump, exit");
        assert_eq!(script.commands()[2].line, 3);
        assert_eq!(script.commands()[3].text, "exit");
    }

    #[test]
    fn empty_source_has_no_commands() {
        assert!(Script::parse("").is_empty());
        assert!(Script::parse("#only a comment").is_empty());
    }
}
