use human_panic::{metadata, setup_panic};
use log::error;
use mercado::cli::run_cli;
use mercado::log::is_logger_initialised;

fn main() {
    setup_panic!(metadata!());

    if let Err(err) = run_cli() {
        if is_logger_initialised() {
            error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        // Terminate program, signalling an error
        std::process::exit(1);
    }
}
