//! Connection abstraction between an occupant and its transport.

use super::{errors::ConnectionError, messages::Message};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::sync::{Mutex, mpsc};

/// Bidirectional structured-message channel to one client.
///
/// Implementations own framing and authentication; the room only sees
/// decoded [`Message`]s.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Next inbound message, `Ok(None)` once the peer has closed.
    async fn recv(&self) -> Result<Option<Message>, ConnectionError>;

    /// Deliver one outbound message.
    async fn send(&self, message: &Message) -> Result<(), ConnectionError>;
}

/// In-process connection backed by channels.
pub struct ChannelConnection {
    inbound: Mutex<mpsc::UnboundedReceiver<Message>>,
    outbound: mpsc::UnboundedSender<Message>,
}

/// The client side of a [`ChannelConnection`].
pub struct ClientEnd {
    to_server: mpsc::UnboundedSender<Message>,
    from_server: mpsc::UnboundedReceiver<Message>,
}

impl ChannelConnection {
    /// Create a connected pair
    ///
    /// # Returns
    ///
    /// * `(Arc<ChannelConnection>, ClientEnd)` - Server side and client side
    pub fn pair() -> (Arc<Self>, ClientEnd) {
        let (to_server, inbound) = mpsc::unbounded_channel();
        let (outbound, from_server) = mpsc::unbounded_channel();
        let conn = Arc::new(Self {
            inbound: Mutex::new(inbound),
            outbound,
        });
        (
            conn,
            ClientEnd {
                to_server,
                from_server,
            },
        )
    }
}

#[async_trait]
impl Connection for ChannelConnection {
    async fn recv(&self) -> Result<Option<Message>, ConnectionError> {
        Ok(self.inbound.lock().await.recv().await)
    }

    async fn send(&self, message: &Message) -> Result<(), ConnectionError> {
        self.outbound
            .send(message.clone())
            .map_err(|_| ConnectionError::Closed)
    }
}

impl ClientEnd {
    /// Send a message to the server side. Returns false once it is gone.
    pub fn send(&self, message: Message) -> bool {
        self.to_server.send(message).is_ok()
    }

    /// Next message from the server, `None` once it is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        self.from_server.recv().await
    }

    /// Next message from the server within `timeout`.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<Message> {
        tokio::time::timeout(timeout, self.from_server.recv())
            .await
            .ok()
            .flatten()
    }

    /// Message already delivered, without waiting.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.from_server.try_recv().ok()
    }
}
