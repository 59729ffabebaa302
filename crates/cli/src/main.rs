use std::process::ExitCode;

fn main() -> ExitCode {
    parcelo_cli::run()
}
