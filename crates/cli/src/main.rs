use std::process::ExitCode;

fn main() -> ExitCode {
    stayfinder_cli::run()
}
