use std::io::{stdin, stdout};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use telx_srt::cli::parse_config;
use telx_srt::pipeline::run;
use telx_srt::RunError;

fn main() -> ExitCode {
    let config = match parse_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("- {e}");
            return ExitCode::FAILURE;
        }
    };

    if config.verbose && std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "trace");
    }
    pretty_env_logger::init();

    let stop_requested = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop_requested);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    }) {
        eprintln!("- Unable to install signal handler: {e}");
    }

    let stdin = stdin();
    let stdout = stdout();
    match run(stdin.lock(), stdout.lock(), &config, &stop_requested) {
        Ok(cues) => {
            eprintln!("- Done ({cues} SRT frames written)");
            ExitCode::SUCCESS
        }
        Err(RunError::Io(e)) => {
            eprintln!("- I/O error: {e}");
            ExitCode::FAILURE
        }
        Err(RunError::Parse(e)) => {
            eprintln!("- {e}");
            ExitCode::FAILURE
        }
    }
}
