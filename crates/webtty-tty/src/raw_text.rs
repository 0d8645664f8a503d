//! Fetching the text of a page without a terminal UI
//!
//! A request is registered under a fresh id, sent to the browser, and the
//! answer is picked up by polling the table until it arrives or the wait
//! times out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant};
use uuid::Uuid;

use webtty_app::protocol::{Incoming, Outgoing, RawText};
use webtty_app::Config;

use crate::error::{Result, TtyError};
use crate::server::{OutboundQueue, Server};
use crate::session::AppEvent;

/// How often the table is checked for an answer
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to wait for the browser to answer
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw text requests waiting for an answer, keyed by request id
#[derive(Debug, Default)]
pub struct RawTextRequests {
    pending: Mutex<HashMap<String, Option<String>>>,
}

impl RawTextRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request and return its id
    pub fn register(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.pending.lock().insert(id.clone(), None);
        id
    }

    /// Record an answer. Returns false if nobody asked for it.
    pub fn fulfil(&self, answer: RawText) -> bool {
        match self.pending.lock().get_mut(&answer.request_id) {
            Some(slot) => {
                *slot = Some(answer.json);
                true
            }
            None => {
                log::warn!("Raw text for unknown request {}", answer.request_id);
                false
            }
        }
    }

    /// Take the answer for `id` if it has arrived
    pub fn take(&self, id: &str) -> Option<String> {
        let mut pending = self.pending.lock();
        let text = pending.get_mut(id)?.take()?;
        pending.remove(id);
        Some(text)
    }

    /// Poll for the answer to `id` until `timeout` passes
    pub async fn wait(&self, id: &str, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let mut ticks = interval(POLL_INTERVAL);
        loop {
            ticks.tick().await;
            if let Some(text) = self.take(id) {
                return Ok(text);
            }
            if Instant::now() >= deadline {
                self.pending.lock().remove(id);
                return Err(TtyError::RawTextTimeout(id.to_string()));
            }
        }
    }
}

/// Wait for a browser, ask it for the text of `url` and return the answer
pub async fn fetch(config: &Config, url: &str, timeout: Duration) -> Result<String> {
    let server = Server::bind(&config.browser.bind, config.browser.websocket_port).await?;
    log::info!("Waiting for the browser on {}", server.local_addr()?);

    let (outbox, queue) = OutboundQueue::new();
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let serving = tokio::spawn(server.serve(queue, events_tx));

    let requests = Arc::new(RawTextRequests::new());
    let id = requests.register();
    let extension_config = serde_json::to_string(config)?;

    let answer = {
        let requests = Arc::clone(&requests);
        let id = id.clone();
        async move { requests.wait(&id, timeout).await }
    };
    tokio::pin!(answer);

    let result = loop {
        tokio::select! {
            result = &mut answer => break result,
            event = events.recv() => match event {
                Some(AppEvent::Connected) => {
                    outbox.send(Outgoing::Config(extension_config.clone()));
                    outbox.send(Outgoing::RawTextRequest {
                        id: id.clone(),
                        url: url.to_string(),
                    });
                }
                Some(AppEvent::Message(Incoming::RawText(text))) => {
                    requests.fulfil(text);
                }
                Some(AppEvent::Fatal(e)) => break Err(e),
                Some(_) => {}
                None => break Err(TtyError::RawTextTimeout(id.clone())),
            },
        }
    };
    serving.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_are_taken_once() {
        let requests = RawTextRequests::new();
        let id = requests.register();
        assert_eq!(requests.take(&id), None);

        assert!(requests.fulfil(RawText {
            request_id: id.clone(),
            json: "{\"text\":\"hi\"}".into(),
        }));
        assert_eq!(requests.take(&id).as_deref(), Some("{\"text\":\"hi\"}"));
        assert_eq!(requests.take(&id), None);
    }

    #[test]
    fn test_unknown_answers_are_ignored() {
        let requests = RawTextRequests::new();
        assert!(!requests.fulfil(RawText {
            request_id: "nope".into(),
            json: String::new(),
        }));
    }

    #[tokio::test]
    async fn test_wait_polls_until_answered() {
        let requests = Arc::new(RawTextRequests::new());
        let id = requests.register();
        let answering = {
            let requests = Arc::clone(&requests);
            let id = id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(120)).await;
                requests.fulfil(RawText {
                    request_id: id,
                    json: "done".into(),
                });
            })
        };
        let text = requests.wait(&id, Duration::from_secs(5)).await.unwrap();
        assert_eq!(text, "done");
        answering.await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let requests = RawTextRequests::new();
        let id = requests.register();
        let result = requests.wait(&id, Duration::from_millis(100)).await;
        assert!(matches!(result, Err(TtyError::RawTextTimeout(_))));
        assert_eq!(requests.pending.lock().len(), 0);
    }
}
