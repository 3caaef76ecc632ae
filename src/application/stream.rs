//! Transport-neutral full-duplex stream sessions.
//!
//! A session is created as a pair: the [`StreamSession`] is handed to the
//! application, the [`StreamPeer`] stays with whatever carries the bytes
//! (the axum WebSocket bridge in production, the test itself in unit tests).

use axum::body::Bytes;
use axum::http::{Extensions, HeaderMap, Uri};
use tokio::sync::mpsc;

use super::Inbound;

const CHANNEL_CAPACITY: usize = 64;

/// Close code for a policy violation (no route, redirect required).
pub const CLOSE_POLICY: u16 = 1008;
/// Close code for an internal failure (application build failed).
pub const CLOSE_INTERNAL: u16 = 1011;

/// A discrete stream message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    Text(String),
    Binary(Bytes),
    Close(Option<CloseReason>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

impl CloseReason {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// Application side of an accepted stream.
#[derive(Debug)]
pub struct StreamSession {
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    incoming: mpsc::Receiver<StreamMessage>,
    outgoing: mpsc::Sender<StreamMessage>,
}

/// Transport side of an accepted stream.
#[derive(Debug)]
pub struct StreamPeer {
    pub to_application: mpsc::Sender<StreamMessage>,
    pub from_application: mpsc::Receiver<StreamMessage>,
}

impl StreamSession {
    /// Open a connected session/peer pair.
    pub fn pair(uri: Uri, headers: HeaderMap) -> (StreamSession, StreamPeer) {
        let (to_application, incoming) = mpsc::channel(CHANNEL_CAPACITY);
        let (outgoing, from_application) = mpsc::channel(CHANNEL_CAPACITY);
        let session = StreamSession {
            uri,
            headers,
            extensions: Extensions::new(),
            incoming,
            outgoing,
        };
        let peer = StreamPeer {
            to_application,
            from_application,
        };
        (session, peer)
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Next message from the client. `None` once the client side is gone.
    pub async fn recv(&mut self) -> Option<StreamMessage> {
        self.incoming.recv().await
    }

    /// Send a message to the client. Returns false if the client side is gone.
    pub async fn send(&self, message: StreamMessage) -> bool {
        self.outgoing.send(message).await.is_ok()
    }

    /// Send a close frame and drop the session.
    pub async fn close(self, reason: Option<CloseReason>) {
        let _ = self.outgoing.send(StreamMessage::Close(reason)).await;
    }

    /// Split into independent receive and send halves.
    pub fn into_split(self) -> (mpsc::Receiver<StreamMessage>, mpsc::Sender<StreamMessage>) {
        (self.incoming, self.outgoing)
    }
}

impl Inbound for StreamSession {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn uri_mut(&mut self) -> &mut Uri {
        &mut self.uri
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl StreamPeer {
    pub async fn send(&self, message: StreamMessage) -> bool {
        self.to_application.send(message).await.is_ok()
    }

    pub async fn recv(&mut self) -> Option<StreamMessage> {
        self.from_application.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_is_connected_both_ways() {
        let (mut session, mut peer) = StreamSession::pair(Uri::from_static("/ws"), HeaderMap::new());

        assert!(peer.send(StreamMessage::Text("ping".into())).await);
        assert_eq!(session.recv().await, Some(StreamMessage::Text("ping".into())));

        assert!(session.send(StreamMessage::Text("pong".into())).await);
        assert_eq!(peer.recv().await, Some(StreamMessage::Text("pong".into())));
    }

    #[tokio::test]
    async fn test_close_then_channel_ends() {
        let (session, mut peer) = StreamSession::pair(Uri::from_static("/ws"), HeaderMap::new());
        session.close(Some(CloseReason::new(CLOSE_POLICY, "bye"))).await;

        assert_eq!(
            peer.recv().await,
            Some(StreamMessage::Close(Some(CloseReason::new(CLOSE_POLICY, "bye"))))
        );
        assert_eq!(peer.recv().await, None);
    }
}
