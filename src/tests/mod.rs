use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use crate::config::Config;
use crate::shell::{Input, Shell};

mod completion_tests;
mod pipeline_tests;
mod repl_tests;

/// In-memory sink standing in for the interpreter's stdout or stderr.
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct TestShell {
    pub shell: Shell,
    pub out: Capture,
    pub err: Capture,
}

pub fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn test_shell_with(config: Config, env: HashMap<String, String>, input: &str) -> TestShell {
    let out = Capture::default();
    let err = Capture::default();
    let shell = Shell::with_io(
        config,
        Box::new(env),
        Input::Stream(Box::new(Cursor::new(input.as_bytes().to_vec()))),
        Box::new(out.clone()),
        Box::new(err.clone()),
    );
    TestShell { shell, out, err }
}

/// A shell on an empty input with the real PATH, so external programs resolve.
pub fn test_shell() -> TestShell {
    let env = env_of(&[("HOME", "/tmp"), ("GREETING", "hello")]);
    test_shell_with(Config::default(), env, "")
}
