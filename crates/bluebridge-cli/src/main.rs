use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = bluebridge_cli::Cli::parse();
    let mut stdout = std::io::stdout();
    match bluebridge_cli::run(&cli, &mut stdout) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(error) => {
            eprintln!("bluebridge: {error}");
            ExitCode::FAILURE
        }
    }
}
