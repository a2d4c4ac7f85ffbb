use std::fs;

use tempfile::tempdir;

use crate::config::Config;
use crate::tests::{env_of, test_shell_with};

#[test]
fn test_no_prompt_without_terminal() {
    let mut t = test_shell_with(Config::default(), env_of(&[]), "true\n\n   \ntrue\n");
    assert_eq!(t.shell.run(), 0);
    assert_eq!(t.out.text(), "");
    assert_eq!(t.err.text().lines().count(), 2);
}

#[test]
fn test_errors_do_not_stop_the_loop() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let input = format!(
        "cat <\ncat >\nno_such_command_vtsh\necho still here > {}\n",
        out.display()
    );
    let mut t = test_shell_with(Config::default(), env_of(&[]), &input);

    assert_eq!(t.shell.run(), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "still here\n");
    let err = t.err.text();
    assert_eq!(err.matches("syntax error").count(), 2);
    assert!(err.contains("exit status: 127"));
}

#[test]
fn test_exit_stops_reading() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let input = format!("exit 2\necho unreachable > {}\n", out.display());
    let mut t = test_shell_with(Config::default(), env_of(&[]), &input);

    assert_eq!(t.shell.run(), 2);
    assert!(!out.exists());
}

#[test]
fn test_crlf_lines() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let input = format!("echo dos > {}\r\n", out.display());
    let mut t = test_shell_with(Config::default(), env_of(&[]), &input);

    assert_eq!(t.shell.run(), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "dos\n");
}

#[test]
fn test_cat_consumes_rest_of_input() {
    let mut t = test_shell_with(Config::default(), env_of(&[]), "cat\necho not run\nexit 3\n");
    assert_eq!(t.shell.run(), 0);
    assert_eq!(t.out.text(), "echo not run\nexit 3\n");
}
