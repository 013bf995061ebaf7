//! bg-studio CLI
//!
//! Runs the web studio or processes single images from the command line.

#[cfg(feature = "cli")]
use bg_studio::cli;

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
