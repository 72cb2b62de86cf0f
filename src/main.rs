use clap::Parser;
use switchback::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
