use std::process::ExitCode;

fn main() -> ExitCode {
    match bluebridged::run_server() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("bluebridged: {error}");
            ExitCode::FAILURE
        }
    }
}
