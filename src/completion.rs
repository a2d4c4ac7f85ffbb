use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use rustyline::{
    completion::Completer as RustylineCompleter, completion::Pair, highlight::Highlighter,
    hint::Hinter, validate::Validator, Context, Helper, Result,
};

use crate::builtins::BUILTINS;

/// Tab completion for the interactive editor: command names in command
/// position, file paths everywhere else.
pub struct Completer {
    commands: Vec<String>,
}

impl Completer {
    pub fn new(nested_command: &str) -> Self {
        Self {
            commands: Self::find_commands(nested_command),
        }
    }

    fn find_commands(nested_command: &str) -> Vec<String> {
        let mut commands: Vec<String> = BUILTINS.iter().map(|&cmd| cmd.to_string()).collect();
        commands.push(nested_command.to_string());

        if let Ok(path) = std::env::var("PATH") {
            for dir in path.split(':').filter(|d| !d.is_empty()) {
                let Ok(entries) = fs::read_dir(dir) else {
                    continue;
                };
                for entry in entries.filter_map(|r| r.ok()) {
                    if is_executable(&entry.path()) {
                        if let Some(name) = entry.file_name().to_str() {
                            commands.push(name.to_string());
                        }
                    }
                }
            }
        }

        commands.sort();
        commands.dedup();
        commands
    }

    /// Candidates for the word ending at the cursor. `line` is the text up
    /// to the cursor.
    pub fn candidates(&self, line: &str) -> Vec<String> {
        let word = line
            .rsplit(is_word_break)
            .next()
            .unwrap_or("");
        if in_command_position(line, word) {
            self.complete_command(word)
        } else {
            complete_path(word)
        }
    }

    fn complete_command(&self, prefix: &str) -> Vec<String> {
        self.commands
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .cloned()
            .collect()
    }
}

fn is_word_break(c: char) -> bool {
    c.is_whitespace() || "|&<>".contains(c)
}

/// Byte offset where the word ending at the end of `line` begins.
pub(crate) fn word_start(line: &str) -> usize {
    line.char_indices()
        .rev()
        .find(|&(_, c)| is_word_break(c))
        .map_or(0, |(i, c)| i + c.len_utf8())
}

/// True when the word being typed is the first word of a command: at the
/// start of the line or right after `|` or `&&`.
fn in_command_position(line: &str, word: &str) -> bool {
    let before = line[..line.len() - word.len()].trim_end();
    before.is_empty() || before.ends_with('|') || before.ends_with("&&")
}

fn complete_path(prefix: &str) -> Vec<String> {
    let (dir, name_prefix) = match prefix.rfind('/') {
        Some(idx) => (PathBuf::from(&prefix[..=idx]), &prefix[idx + 1..]),
        None => (PathBuf::from("."), prefix),
    };
    let shown_dir = &prefix[..prefix.len() - name_prefix.len()];

    let mut completions = Vec::new();
    if let Ok(entries) = fs::read_dir(&dir) {
        for entry in entries.filter_map(|r| r.ok()) {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with(name_prefix) {
                continue;
            }
            let mut completion = format!("{}{}", shown_dir, name);
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                completion.push('/');
            }
            completions.push(completion);
        }
    }
    completions.sort();
    completions
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

impl Helper for Completer {}

impl RustylineCompleter for Completer {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        let start = word_start(line);

        let pairs = self
            .candidates(line)
            .into_iter()
            .map(|s| Pair {
                display: s.clone(),
                replacement: s,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for Completer {}
impl Hinter for Completer {
    type Hint = String;
}
impl Validator for Completer {}
