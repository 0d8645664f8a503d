//! The session loop
//!
//! Everything that changes the [`Browser`] arrives here as an [`AppEvent`]
//! and is applied in arrival order: messages from the websocket, terminal
//! input, and the periodic tick. The screen is redrawn after each one.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use uuid::Uuid;

use webtty_app::protocol::Incoming;
use webtty_app::{Browser, Config};
use webtty_ui::events::InputEvent;

use crate::clipboard::SystemClipboard;
use crate::error::{Result, TtyError};
use crate::server::{OutboundQueue, Server};
use crate::terminal::{self, CrosstermSurface, TerminalGuard};

/// Period of the timer that expires wait mode and counts down the time limit
const TICK: Duration = Duration::from_millis(100);

/// The time limit is announced in the status line for this long
const COUNTDOWN: Duration = Duration::from_secs(5);

/// Something for the session loop to apply
#[derive(Debug)]
pub enum AppEvent {
    /// A browser connected
    Connected,
    /// The browser went away; another may connect
    Disconnected,
    Message(Incoming),
    Input(InputEvent),
    /// Stop with an error
    Fatal(TtyError),
}

/// Status line text while the time limit runs out
pub fn countdown(remaining: Duration) -> Option<String> {
    if remaining > COUNTDOWN {
        return None;
    }
    let seconds = remaining.as_millis().div_ceil(1000);
    Some(format!("webtty will close in {} seconds", seconds))
}

/// Decode a base64 screenshot and write it to the temp directory
pub fn save_screenshot(data: &str) -> Result<PathBuf> {
    let bytes = STANDARD.decode(data.trim())?;
    let path = std::env::temp_dir().join(format!("webtty-screenshot-{}.jpg", Uuid::new_v4()));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Run the terminal UI until the user quits or something fails
pub async fn run(config: Config) -> Result<()> {
    let server = Server::bind(&config.browser.bind, config.browser.websocket_port).await?;
    let address = server.local_addr()?;
    log::info!("Waiting for the browser on {}", address);

    let (outbox, queue) = OutboundQueue::new();
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let serving = {
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = server.serve(queue, events_tx.clone()).await {
                let _ = events_tx.send(AppEvent::Fatal(e));
            }
        })
    };

    let (width, height) = terminal::size()?;
    let _guard = TerminalGuard::enter()?;
    let mut surface = CrosstermSurface::new(io::stdout(), width, height);
    terminal::spawn_input_thread(events_tx)?;

    let mut browser = Browser::new(
        &config,
        outbox,
        Box::new(SystemClipboard::new()),
        (width, height),
    );
    browser.set_status(Some(format!("Waiting for the browser on {}", address)));
    browser.render(&mut surface)?;

    let deadline = config
        .browser
        .time_limit
        .map(|seconds| Instant::now() + Duration::from_secs(seconds));
    let mut ticks = interval(TICK);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break Ok(());
                };
                if let Err(e) = apply(&mut browser, &mut surface, event) {
                    break Err(e);
                }
            }
            now = ticks.tick() => {
                let changed = browser.tick(now.into_std());
                if let Some(deadline) = deadline {
                    let remaining = deadline.saturating_duration_since(now);
                    if remaining.is_zero() {
                        log::info!("Time limit reached");
                        browser.quit();
                    } else if let Some(status) = countdown(remaining) {
                        if browser.status() != status {
                            browser.announce(status);
                        }
                    }
                } else if !changed {
                    continue;
                }
            }
        }
        if browser.should_quit() {
            break Ok(());
        }
        if let Err(e) = browser.render(&mut surface) {
            break Err(e.into());
        }
    };

    serving.abort();
    result
}

fn apply<W: io::Write>(
    browser: &mut Browser,
    surface: &mut CrosstermSurface<W>,
    event: AppEvent,
) -> Result<()> {
    match event {
        AppEvent::Connected => {
            browser.set_status(None);
            browser.on_connected();
        }
        AppEvent::Disconnected => {
            browser.set_status(Some("Browser disconnected, waiting for it to reconnect".into()));
        }
        AppEvent::Message(Incoming::Screenshot(data)) => match save_screenshot(&data) {
            Ok(path) => {
                log::info!("Saved screenshot to {}", path.display());
                browser.announce(format!("Saved screenshot to {}", path.display()));
            }
            Err(e) => log::warn!("Could not save screenshot: {}", e),
        },
        AppEvent::Message(message) => browser.handle_message(message),
        AppEvent::Input(input) => {
            if let InputEvent::Resize { width, height } = input {
                surface.resize(width, height);
            }
            if matches!(input, InputEvent::Key(_)) && browser.status().starts_with("Saved screenshot") {
                browser.set_status(None);
            }
            browser.handle_input(input);
        }
        AppEvent::Fatal(e) => return Err(e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown() {
        assert_eq!(countdown(Duration::from_secs(10)), None);
        assert_eq!(
            countdown(Duration::from_secs(5)).as_deref(),
            Some("webtty will close in 5 seconds")
        );
        assert_eq!(
            countdown(Duration::from_millis(2100)).as_deref(),
            Some("webtty will close in 3 seconds")
        );
    }

    #[test]
    fn test_save_screenshot() {
        let path = save_screenshot("aGVsbG8=").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        std::fs::remove_file(path).unwrap();

        assert!(matches!(
            save_screenshot("not base64!"),
            Err(TtyError::Screenshot(_))
        ));
    }

    #[test]
    fn test_screenshot_status_clears_on_key() {
        let (outbox, mut rx) = webtty_app::Outbox::channel();
        let mut browser = Browser::new(
            &Config::default(),
            outbox,
            Box::new(webtty_ui::traits::MemoryClipboard::default()),
            (20, 6),
        );
        let mut surface = CrosstermSurface::new(Vec::new(), 20, 6);
        apply(
            &mut browser,
            &mut surface,
            AppEvent::Message(Incoming::Screenshot("aGVsbG8=".into())),
        )
        .unwrap();
        assert!(browser.status().starts_with("Saved screenshot to "));
        assert!(matches!(
            rx.try_recv(),
            Ok(webtty_app::Outgoing::Status(text)) if text.starts_with("Saved screenshot")
        ));
        let path = browser.status().trim_start_matches("Saved screenshot to ").to_string();
        std::fs::remove_file(path).unwrap();

        apply(
            &mut browser,
            &mut surface,
            AppEvent::Input(InputEvent::Key(webtty_ui::events::KeyEvent::char('j'))),
        )
        .unwrap();
        assert_eq!(browser.status(), "");
    }
}
