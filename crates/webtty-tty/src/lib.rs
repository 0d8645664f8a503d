//! webtty-tty: the terminal front-end
//!
//! Parses the command line, sets up logging, starts the websocket server
//! the browser extension connects to and runs the session loop against the
//! real terminal. With `--raw-text` it skips the terminal entirely and
//! prints the text of one page.

pub mod cli;
pub mod clipboard;
pub mod error;
pub mod raw_text;
pub mod server;
pub mod session;
pub mod terminal;

use std::fs::File;
use std::process::ExitCode;

use cli::Cli;
pub use error::{Result, TtyError};

/// Run webtty and report how it ended
pub fn run() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    match run_with(&cli) {
        Ok(()) => {
            log::info!("Exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("webtty: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_with(cli: &Cli) -> Result<()> {
    let config = cli.config()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match &cli.raw_text {
        Some(url) => {
            let text = runtime.block_on(raw_text::fetch(&config, url, raw_text::DEFAULT_TIMEOUT))?;
            println!("{}", text);
        }
        None => runtime.block_on(session::run(config))?,
    }
    Ok(())
}

/// The terminal belongs to the UI, so logs only go to `./debug.log` and
/// only when asked for
fn init_logging(debug: bool) {
    if !debug {
        return;
    }
    let file = match File::create("debug.log") {
        Ok(file) => file,
        Err(e) => {
            eprintln!("webtty: cannot create debug.log: {}", e);
            return;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    log::info!("Starting webtty {}", env!("CARGO_PKG_VERSION"));
}
