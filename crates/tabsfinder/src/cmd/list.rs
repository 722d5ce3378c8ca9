use std::path::Path;

use tabsfinder_pipe::discover;

use crate::cmd::ListArgs;
use crate::exit::{pipe_error, CliResult, SUCCESS};
use crate::output::{print_pipes, OutputFormat};

pub fn run(_args: ListArgs, dir: &Path, format: OutputFormat) -> CliResult<i32> {
    let pipes = discover(dir).map_err(|err| pipe_error("pipe discovery failed", err))?;
    print_pipes(&pipes, format);
    Ok(SUCCESS)
}
