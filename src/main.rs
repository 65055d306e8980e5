use clap::Parser;

use swiftcare_lib::cli::{self, Cli};

fn main() {
    let args = Cli::parse();
    swiftcare_lib::init_tracing();

    if let Err(e) = cli::run(args) {
        tracing::error!(error = %e, "SwiftCare exited with an error");
        eprintln!("swiftcare: {e}");
        std::process::exit(1);
    }
}
