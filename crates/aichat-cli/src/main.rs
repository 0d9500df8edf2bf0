mod cli;

use aichat_core::interrupt;

fn main() {
    if let Err(e) = cli::run() {
        if e.downcast_ref::<interrupt::InterruptedError>().is_some() {
            std::process::exit(130);
        }
        if let Some(warning) = cli::validation_error(&e) {
            eprintln!("Warning: {warning}");
            std::process::exit(2);
        }
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}
