//! Production transport over `tokio-tungstenite`.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::SocketError;
use crate::transport::{Connector, Transport, TransportEvent, TransportSink, TransportSource};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials real WebSocket connections.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Transport, SocketError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| SocketError::Transport(e.to_string()))?;
        debug!("websocket handshake complete");
        let (sink, source) = stream.split();
        Ok(Transport {
            sink: Box::new(WsSink { inner: sink }),
            source: Box::new(WsSource { inner: source }),
        })
    }
}

struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl TransportSink for WsSink {
    async fn send(&mut self, text: String) -> Result<(), SocketError> {
        self.inner
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| SocketError::Transport(e.to_string()))
    }

    async fn close(&mut self, code: u16) -> Result<(), SocketError> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: "".into(),
        };
        // Close errors are uninteresting: the peer may already be gone.
        let _ = self.inner.send(Message::Close(Some(frame))).await;
        self.inner
            .close()
            .await
            .map_err(|e| SocketError::Transport(e.to_string()))
    }
}

struct WsSource {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl TransportSource for WsSource {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            return match self.inner.next().await? {
                Ok(Message::Text(text)) => Some(TransportEvent::Text(text.to_string())),
                Ok(Message::Close(frame)) => Some(TransportEvent::Closed {
                    code: frame.map_or(crate::transport::ABNORMAL_CLOSURE, |f| f.code.into()),
                }),
                // Control and binary frames carry nothing for the router.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_)) => {
                    continue;
                }
                Err(e) => Some(TransportEvent::Error(e.to_string())),
            };
        }
    }
}
