use crate::ast::{CommandLine, Pipeline};
use crate::redirect;
use crate::tokenizer::Token;
use crate::types::{ShellError, ShellResult};

/// Builds a command line from tokens. An empty token list yields `None`.
///
/// Binding, loosest first: a trailing `&`, then `&&`, then `|`, then the
/// redirections of each command.
pub fn parse(tokens: &[Token]) -> ShellResult<Option<CommandLine>> {
    if tokens.is_empty() {
        return Ok(None);
    }

    let (tokens, background) = match tokens.split_last() {
        Some((Token::Background, rest)) => (rest, true),
        _ => (tokens, false),
    };
    if tokens.contains(&Token::Background) || tokens.is_empty() {
        return Err(ShellError::syntax("unexpected `&`"));
    }

    let pipelines = parse_and_list(tokens)?;
    let line = CommandLine { pipelines, background };

    log::debug!("parsed: {:?}", line);
    Ok(Some(line))
}

fn parse_and_list(tokens: &[Token]) -> ShellResult<Vec<Pipeline>> {
    tokens
        .split(|t| *t == Token::And)
        .map(|segment| {
            if segment.is_empty() {
                Err(ShellError::syntax("missing command around `&&`"))
            } else {
                parse_pipeline(segment)
            }
        })
        .collect()
}

fn parse_pipeline(tokens: &[Token]) -> ShellResult<Pipeline> {
    let commands = tokens
        .split(|t| *t == Token::Pipe)
        .map(|stage| {
            if stage.is_empty() {
                Err(ShellError::syntax("missing command around `|`"))
            } else {
                redirect::resolve(stage)
            }
        })
        .collect::<ShellResult<Vec<_>>>()?;
    Ok(Pipeline { commands })
}
