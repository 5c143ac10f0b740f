use super::{Channel, TransportError};
use crate::messages::{Inbound, Request};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// JSON-over-WebSocket channel to obs-websocket
pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl WebSocketChannel {
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        tracing::debug!("Connecting to {}", url);

        let (stream, _response) =
            tokio_tungstenite::connect_async(url)
                .await
                .map_err(|source| TransportError::Connect {
                    url: url.to_string(),
                    source,
                })?;

        tracing::info!("Connected to {}", url);
        Ok(Self {
            stream,
            closed: false,
        })
    }
}

#[async_trait]
impl Channel for WebSocketChannel {
    async fn send(&mut self, request: &Request) -> Result<(), TransportError> {
        let text = serde_json::to_string(request)?;
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Inbound>, TransportError> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => match Inbound::parse(text.as_str()) {
                    Ok(inbound) => return Ok(Some(inbound)),
                    Err(e) => tracing::warn!("Skipping malformed message: {}", e),
                },
                Message::Close(frame) => {
                    tracing::debug!("Server closed the connection: {:?}", frame);
                    return Ok(None);
                }
                // Pings are answered by tungstenite itself
                _ => {}
            }
        }

        Ok(None)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            // The peer got there first
            Err(
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed
                | tungstenite::Error::Protocol(ProtocolError::SendAfterClosing),
            ) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
