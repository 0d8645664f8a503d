//! Messages exchanged with the browser extension
//!
//! Every message is a single text frame of the form `/<name>,<payload>`.
//! The payload may itself contain commas; only the first one separates it
//! from the name.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc;

use webtty_core::{FramePixels, FrameText};
use webtty_ui::events::{KeyEvent, MouseEvent};

use crate::hints::HintRect;

/// Decoding errors. A browser sending malformed data is a bug, so these
/// end the session.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("message does not start with '/': {0:.40}")]
    NoCommand(String),

    #[error("bad payload for {command}: {source}")]
    Json {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Tab metadata sent whenever a tab changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabState {
    pub id: i64,
    pub active: bool,
    pub title: String,
    pub uri: String,
    pub page_state: String,
    pub status_message: String,
}

/// Answer to a raw text request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawText {
    pub request_id: String,
    #[serde(default)]
    pub json: String,
}

/// A message from the browser
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    FrameText(FrameText),
    FramePixels(FramePixels),
    TabState(TabState),
    LinkHints(Vec<HintRect>),
    /// Base64 encoded image
    Screenshot(String),
    RawText(RawText),
    /// Anything this client does not act on
    Other { command: String, payload: String },
}

fn split(message: &str) -> Result<(&str, &str), ProtocolError> {
    let body = message
        .strip_prefix('/')
        .ok_or_else(|| ProtocolError::NoCommand(message.to_string()))?;
    Ok(body.split_once(',').unwrap_or((body, "")))
}

fn decode<T: for<'de> Deserialize<'de>>(command: &str, payload: &str) -> Result<T, ProtocolError> {
    serde_json::from_str(payload).map_err(|source| ProtocolError::Json {
        command: command.to_string(),
        source,
    })
}

impl Incoming {
    /// Parse one websocket text frame
    pub fn parse(message: &str) -> Result<Self, ProtocolError> {
        let (command, payload) = split(message)?;
        Ok(match command {
            "frame_text" => Self::FrameText(decode(command, payload)?),
            "frame_pixels" => Self::FramePixels(decode(command, payload)?),
            "tab_state" => Self::TabState(decode(command, payload)?),
            "link_hints" => Self::LinkHints(decode(command, payload)?),
            "raw_text" => Self::RawText(decode(command, payload)?),
            "screenshot" => Self::Screenshot(payload.to_string()),
            _ => Self::Other {
                command: command.to_string(),
                payload: payload.to_string(),
            },
        })
    }
}

/// Commands run against the current tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabCommand {
    Url(String),
    UrlUp,
    UrlRoot,
    HistoryBack,
    HistoryForward,
    Reload,
    FindNext(String),
    FindPrevious(String),
    FocusFirstTextInput,
    FollowLinkLabeledNext,
    FollowLinkLabeledPrevious,
    GetClickableHints,
    GetLinkHints,
    /// Viewport offset; the vertical value is in pixel rows
    ScrollStatus { x: usize, y: usize },
    InputBox { id: String, text: String },
}

impl TabCommand {
    fn to_wire(&self) -> String {
        match self {
            Self::Url(url) => format!("/url,{url}"),
            Self::UrlUp => "/url_up".into(),
            Self::UrlRoot => "/url_root".into(),
            Self::HistoryBack => "/history_back".into(),
            Self::HistoryForward => "/history_forward".into(),
            Self::Reload => "/reload".into(),
            Self::FindNext(text) => format!("/find_next,{text}"),
            Self::FindPrevious(text) => format!("/find_previous,{text}"),
            Self::FocusFirstTextInput => "/focus_first_text_input".into(),
            Self::FollowLinkLabeledNext => "/follow_link_labeled_next".into(),
            Self::FollowLinkLabeledPrevious => "/follow_link_labeled_previous".into(),
            Self::GetClickableHints => "/get_clickable_hints".into(),
            Self::GetLinkHints => "/get_link_hints".into(),
            Self::ScrollStatus { x, y } => format!("/scroll_status,{x},{y}"),
            Self::InputBox { id, text } => {
                format!("/input_box,{}", json!({ "id": id, "text": text }))
            }
        }
    }
}

/// A message to the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Key(KeyEvent),
    /// Mouse event at page coordinates
    Mouse {
        event: MouseEvent,
        x: usize,
        y: usize,
        y_hack: bool,
    },
    TtySize { width: usize, height: usize },
    Tab(TabCommand),
    NewTab(String),
    SwitchToTab(i64),
    RemoveTab(i64),
    RestoreTab,
    DuplicateTab(i64),
    Status(String),
    Config(String),
    RawTextRequest { id: String, url: String },
    /// Not sent: tells the writer to let go of the queue
    CloseWriter,
}

impl Outgoing {
    /// Text frame for this message; `None` for the writer sentinel
    pub fn to_wire(&self) -> Option<String> {
        let wire = match self {
            Self::Key(key) => {
                let body = json!({
                    "key": key.wire_key(),
                    "char": key.wire_char(),
                    "mod": key.modifiers.bits(),
                });
                format!("/stdin,{body}")
            }
            Self::Mouse {
                event,
                x,
                y,
                y_hack,
            } => {
                let mut body = json!({
                    "button": event.wire_button(),
                    "mouse_x": x,
                    "mouse_y": y,
                    "modifiers": event.modifiers.bits(),
                });
                if *y_hack {
                    body["y_hack"] = json!(true);
                }
                format!("/stdin,{body}")
            }
            Self::TtySize { width, height } => format!("/tty_size,{width},{height}"),
            Self::Tab(command) => format!("/tab_command,{}", command.to_wire()),
            Self::NewTab(url) => format!("/new_tab,{url}"),
            Self::SwitchToTab(id) => format!("/switch_to_tab,{id}"),
            Self::RemoveTab(id) => format!("/remove_tab,{id}"),
            Self::RestoreTab => "/restore_tab".into(),
            Self::DuplicateTab(id) => format!("/duplicate_tab,{id}"),
            Self::Status(text) => format!("/status,{text}"),
            Self::Config(json) => format!("/config,{json}"),
            Self::RawTextRequest { id, url } => format!("/raw_text_request,{id},{url}"),
            Self::CloseWriter => return None,
        };
        Some(wire)
    }
}

/// Sending half of the outbound queue
///
/// Messages are delivered in the order they are sent. While no browser is
/// connected they are logged and dropped.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Outgoing>,
    connected: Arc<AtomicBool>,
}

impl Outbox {
    pub fn new(tx: mpsc::UnboundedSender<Outgoing>, connected: Arc<AtomicBool>) -> Self {
        Self { tx, connected }
    }

    /// An outbox that is always connected, plus the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, Arc::new(AtomicBool::new(true))), rx)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn send(&self, message: Outgoing) {
        if !self.is_connected() {
            log::info!("Not connected, dropping {:?}", message);
            return;
        }
        if self.tx.send(message).is_err() {
            log::warn!("Outbound queue closed");
        }
    }

    pub fn tab(&self, command: TabCommand) {
        self.send(Outgoing::Tab(command));
    }
}
