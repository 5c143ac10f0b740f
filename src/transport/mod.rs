pub mod channel;
pub mod error;
pub mod websocket;

pub use channel::Channel;
pub use error::TransportError;
pub use websocket::WebSocketChannel;
