//! WebSocket transport backed by `tokio-tungstenite`

use crate::traits::*;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens real WebSocket connections
///
/// Each open transport is pumped by its own task: inbound data frames become
/// [`TransportEvent::Frame`], outbound [`TransportCommand::Send`] become text
/// frames. Control frames (ping/pong) are answered by tungstenite and never
/// surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self, endpoint: &str) -> Result<Transport> {
        let (ws_stream, _response) = connect_async(endpoint).await?;
        info!("Connected to {}", endpoint);

        let (transport, peer) = Transport::pair();
        tokio::spawn(pump(ws_stream, peer));

        Ok(transport)
    }
}

/// Move frames between the socket and the manager until either side stops
async fn pump(ws_stream: WsStream, peer: TransportPeer) {
    let (mut write, mut read) = ws_stream.split();
    let TransportPeer {
        mut commands,
        events,
    } = peer;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        let Some(frame) = tungstenite_to_frame(msg) else {
                            continue;
                        };
                        if events.send(TransportEvent::Frame(frame)).is_err() {
                            debug!("Manager side dropped, closing socket");
                            let _ = write.close().await;
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        let _ = events.send(TransportEvent::Error(e.to_string()));
                        let _ = events.send(TransportEvent::Closed);
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        let _ = events.send(TransportEvent::Closed);
                        break;
                    }
                }
            }

            cmd = commands.recv() => {
                match cmd {
                    Some(TransportCommand::Send(text)) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            warn!("Failed to write frame: {}", e);
                            let _ = events.send(TransportEvent::Error(e.to_string()));
                            let _ = events.send(TransportEvent::Closed);
                            break;
                        }
                    }
                    Some(TransportCommand::Close) | None => {
                        debug!("Closing WebSocket on request");
                        let _ = write.close().await;
                        break;
                    }
                }
            }
        }
    }
}

/// Data frames pass through; a close frame ends the stream on the next read
fn tungstenite_to_frame(msg: Message) -> Option<Frame> {
    match msg {
        Message::Text(text) => Some(Frame::Text(text)),
        Message::Binary(data) => Some(Frame::Binary(data)),
        Message::Close(close) => {
            debug!("Received close frame: {:?}", close);
            None
        }
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}
