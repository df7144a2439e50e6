use clap::Parser;
use riskcalc::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
