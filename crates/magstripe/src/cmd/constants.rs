use crate::cmd::ConstantsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_constants, OutputFormat};

pub fn run(_args: ConstantsArgs, format: OutputFormat) -> CliResult<i32> {
    print_constants(format);
    Ok(SUCCESS)
}
