use std::io;
use std::process::exit;

use anyhow::Result;
use vtsh::config::Args;
use vtsh::expand::ProcessEnv;
use vtsh::{logging, Config, Input, Shell};

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    let config = Config::from_args(&args)?;
    logging::init(config.log_level)?;

    let code = match &args.command {
        Some(line) => {
            let input = Input::Stream(Box::new(io::stdin().lock()));
            let mut shell = Shell::with_io(
                config,
                Box::new(ProcessEnv),
                input,
                Box::new(io::stdout()),
                Box::new(io::stderr()),
            );
            shell.execute_line(line).status()
        }
        None => Shell::new(config)?.run(),
    };
    exit(code);
}
