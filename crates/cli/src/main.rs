use std::process::ExitCode;

fn main() -> ExitCode {
    leadmate_cli::run()
}
