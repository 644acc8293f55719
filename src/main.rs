use std::process::ExitCode;

fn main() -> ExitCode {
    draftsman::cli::run()
}
