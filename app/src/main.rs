//! FILENAME: app/src/main.rs
// PURPOSE: CLI entry point with unified logging.
// FORMAT: seq|level|category|message

fn main() -> std::process::ExitCode {
    app_lib::run()
}
