use std::process::ExitCode;

use clap::Parser;

use radius_denoise::cli::Cli;
use radius_denoise::{logging, run};

fn main() -> ExitCode {
    let args = Cli::parse();
    logging::init(args.verbose);

    match run(&args.config()) {
        Ok(summary) => {
            print!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
