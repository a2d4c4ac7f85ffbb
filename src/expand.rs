use std::collections::HashMap;

/// Read-only view of the variables `$NAME` references resolve against.
///
/// The interpreter never mutates its environment; tests hand in a map.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The interpreter's own process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Substitutes the first `$NAME` in `word`.
///
/// Only one reference per word is replaced; text after the name is copied
/// verbatim, including any further `$`. An unset variable becomes the empty
/// string and a `$` not followed by a name character is left alone.
pub fn expand_word(word: &str, env: &dyn Environment) -> String {
    let Some(dollar) = word.find('$') else {
        return word.to_string();
    };
    let tail = &word[dollar + 1..];
    let name_len = tail.find(|c: char| !is_name_char(c)).unwrap_or(tail.len());
    if name_len == 0 {
        return word.to_string();
    }

    let name = &tail[..name_len];
    let value = env.var(name).unwrap_or_default();
    let mut expanded = String::with_capacity(word.len() + value.len());
    expanded.push_str(&word[..dollar]);
    expanded.push_str(&value);
    expanded.push_str(&tail[name_len..]);
    expanded
}

pub fn expand_words(words: &[String], env: &dyn Environment) -> Vec<String> {
    words.iter().map(|w| expand_word(w, env)).collect()
}
