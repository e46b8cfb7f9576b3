use clap::Parser;

use docfill::cli::{Cli, exit_code, run};

fn main() {
    let cli = Cli::parse();
    if let Err(err) = docfill::init(cli.log_target()).and_then(|()| run(cli)) {
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}
