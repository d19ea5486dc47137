//! FILENAME: app/src/main.rs
// PURPOSE: Binary entry point. Commands on stdin, responses on stdout,
// diagnostics in the unified log file.

fn main() {
    if let Err(e) = grid_app::run() {
        eprintln!("grid-app: {}", e);
        std::process::exit(1);
    }
}
