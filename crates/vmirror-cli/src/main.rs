use vmirror_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible.
    logging::init_logging();

    if let Err(err) = Cli::run_from_args().await {
        eprintln!("vmirror error: {:#}", err);
        std::process::exit(1);
    }
}
