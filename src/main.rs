use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use wordrank::tool::{self, Config, Input};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Words file to count; `-` reads standard input.
    input: PathBuf,
    /// Initial slot table capacity (rounded up to a power of two).
    #[clap(long, default_value = "16")]
    initial_capacity: usize,
    /// Bytes read from the input per chunk.
    #[clap(long, default_value = "65536")]
    buffer_size: usize,
    /// Print only the N most frequent words.
    #[clap(long, value_name = "N")]
    top: Option<usize>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let input = if args.input.as_os_str() == "-" {
            Input::Stdin
        } else {
            Input::Path(args.input)
        };
        Config {
            input,
            initial_capacity: args.initial_capacity,
            buffer_size: args.buffer_size,
            top: args.top,
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(tool::USAGE_EXIT_CODE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    wordrank::logging::setup();

    let config = Config::from(args);
    log::debug!("config: {config:?}");
    match tool::run(&config, io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("wordrank: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
