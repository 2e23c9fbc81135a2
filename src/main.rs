//! Kodegen Bundler Pack - cross-compile a project and pack each binary.
//!
//! This binary builds every requested target in its own sandbox, then lays
//! each binary out as a Linux executable, a Windows `.exe` or a macOS `.app`
//! and `.dmg`.

use env_logger::Env;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match kodegen_bundler_pack::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
            1
        }
    };

    process::exit(exit_code);
}
