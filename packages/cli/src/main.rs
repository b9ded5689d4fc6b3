use std::io;

use clap::Parser;
use dirb::Cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = dirb::run(&cli, &mut stdin.lock(), &mut stdout.lock()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
