//! webtty - drive a real web browser from your terminal
//!
//! The front-end lives in `webtty-tty`; this binary only hands over to it.

use std::process::ExitCode;

fn main() -> ExitCode {
    webtty_tty::run()
}
