//! Websocket server the browser extension connects to
//!
//! One browser is served at a time. Each connection gets a read loop that
//! feeds parsed messages to the session and a write loop that drains the
//! outbound queue. When the connection ends the read loop pushes
//! [`Outgoing::CloseWriter`] so the write loop lets go of the queue, ready
//! for the next connection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::{self, Message};

use webtty_app::protocol::{Incoming, Outbox, Outgoing};

use crate::error::Result;
use crate::session::AppEvent;

/// The receiving end of the outbound queue, plus the connection flag the
/// matching [`Outbox`] checks
pub struct OutboundQueue {
    tx: UnboundedSender<Outgoing>,
    rx: UnboundedReceiver<Outgoing>,
    connected: Arc<AtomicBool>,
}

impl OutboundQueue {
    /// Create the queue and the outbox that feeds it
    pub fn new() -> (Outbox, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));
        let outbox = Outbox::new(tx.clone(), Arc::clone(&connected));
        (outbox, Self { tx, rx, connected })
    }
}

/// Listens for the browser extension
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Bind the listening socket
    pub async fn bind(addr: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((addr, port)).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve browsers one after another. Returns once nobody is listening
    /// for events any more.
    pub async fn serve(self, mut queue: OutboundQueue, events: UnboundedSender<AppEvent>) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let websocket = match accept_async(stream).await {
                Ok(websocket) => websocket,
                Err(e) => {
                    log::warn!("Websocket handshake with {} failed: {}", peer, e);
                    continue;
                }
            };
            log::info!("Browser connected from {}", peer);

            queue.connected.store(true, Ordering::SeqCst);
            if events.send(AppEvent::Connected).is_err() {
                return Ok(());
            }

            let (sink, stream) = websocket.split();
            tokio::join!(
                read_loop(stream, &queue.tx, &queue.connected, &events),
                write_loop(sink, &mut queue.rx),
            );

            log::info!("Browser at {} disconnected", peer);
            if events.send(AppEvent::Disconnected).is_err() {
                return Ok(());
            }
        }
    }
}

async fn read_loop<S>(
    mut stream: S,
    tx: &UnboundedSender<Outgoing>,
    connected: &AtomicBool,
    events: &UnboundedSender<AppEvent>,
) where
    S: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                log::trace!("<- {:.120}", text.as_str());
                let event = match Incoming::parse(text.as_str()) {
                    Ok(incoming) => AppEvent::Message(incoming),
                    Err(e) => {
                        let _ = events.send(AppEvent::Fatal(e.into()));
                        break;
                    }
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!("Websocket read failed: {}", e);
                break;
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
    let _ = tx.send(Outgoing::CloseWriter);
}

async fn write_loop<S>(mut sink: S, queue: &mut UnboundedReceiver<Outgoing>)
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let mut open = true;
    while let Some(message) = queue.recv().await {
        let Some(text) = message.to_wire() else {
            break;
        };
        if !open {
            log::debug!("Connection closing, dropping {:.80}", text);
            continue;
        }
        log::debug!("-> {:.120}", text);
        if let Err(e) = sink.send(Message::text(text)).await {
            log::warn!("Websocket write failed: {}", e);
            open = false;
        }
    }
    let _ = sink.close().await;
}
