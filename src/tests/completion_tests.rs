use std::fs;

use tempfile::tempdir;

use crate::completion::{word_start, Completer};

#[test]
fn test_command_position_offers_builtins() {
    let completer = Completer::new("./shell");
    let found = completer.candidates("ex");
    assert!(found.contains(&"exit".to_string()));

    let found = completer.candidates("ls | c");
    assert!(found.contains(&"cd".to_string()));

    let found = completer.candidates("true && ./sh");
    assert_eq!(found, vec!["./shell".to_string()]);
}

#[test]
fn test_argument_position_completes_paths() -> Result<(), String> {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();

    let completer = Completer::new("./shell");
    let prefix = format!("{}/n", dir.path().display());
    let found = completer.candidates(&format!("cat {}", prefix));

    let base = dir.path().display().to_string();
    assert_eq!(
        found,
        vec![format!("{}/nested/", base), format!("{}/notes.txt", base)]
    );

    let found = completer.candidates(&format!("sort < {}/no", base));
    assert_eq!(found, vec![format!("{}/notes.txt", base)]);
    Ok(())
}

#[test]
fn test_word_start_after_wide_separator() {
    assert_eq!(word_start("cat\u{3000}no"), "cat\u{3000}".len());
    assert_eq!(word_start("ls|so"), 3);
    assert_eq!(word_start("echo"), 0);
    assert_eq!(word_start("echo "), 5);
}
