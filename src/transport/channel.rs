use super::TransportError;
use crate::messages::{Inbound, Request};
use async_trait::async_trait;

/// Bidirectional message channel to the OBS server
///
/// Implementations frame and decode messages; the session driver only sees
/// typed requests going out and classified inbound messages coming back.
#[async_trait]
pub trait Channel: Send {
    /// Send one request
    async fn send(&mut self, request: &Request) -> Result<(), TransportError>;

    /// Wait for the next inbound message. `None` means the peer closed the channel.
    async fn recv(&mut self) -> Result<Option<Inbound>, TransportError>;

    /// Close the channel
    async fn close(&mut self) -> Result<(), TransportError>;
}
