//! WebSocket bridging.
//!
//! # Responsibilities
//! - Turn an accepted axum [`WebSocket`] into a [`StreamSession`]
//! - Pump frames between the socket and the session channels
//! - Close the socket once the application is done with the session
//!
//! # Data Flow
//! ```text
//! Client ←── WebSocket frames ──→ bridge ←── StreamMessage ──→ Application
//! ```
//!
//! # Design Decisions
//! - Ping/pong handled by axum, never surfaced to applications
//! - The application's return ends the session; the socket is closed after
//!   any queued messages are flushed

use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket};
use axum::http::{HeaderMap, Uri};
use futures_util::{SinkExt, StreamExt};

use crate::application::{CloseReason, SharedApplication, StreamMessage, StreamSession};

/// Run `application` over `socket` until the application returns.
pub async fn bridge(socket: WebSocket, uri: Uri, headers: HeaderMap, application: SharedApplication) {
    let (session, peer) = StreamSession::pair(uri, headers);
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let to_application = peer.to_application;
    let mut from_application = peer.from_application;

    let reader = tokio::spawn(async move {
        while let Some(Ok(frame)) = ws_receiver.next().await {
            let Some(message) = from_ws(frame) else {
                continue;
            };
            let closing = matches!(message, StreamMessage::Close(_));
            if to_application.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    let writer = tokio::spawn(async move {
        let mut closed = false;
        while let Some(message) = from_application.recv().await {
            closed = matches!(message, StreamMessage::Close(_));
            if ws_sender.send(to_ws(message)).await.is_err() || closed {
                break;
            }
        }
        if !closed {
            let _ = ws_sender.send(WsMessage::Close(None)).await;
        }
        let _ = ws_sender.close().await;
    });

    application.handle_stream(session).await;

    if let Err(e) = writer.await {
        tracing::warn!(error = %e, "WebSocket writer task failed");
    }
    reader.abort();
}

fn from_ws(frame: WsMessage) -> Option<StreamMessage> {
    match frame {
        WsMessage::Text(text) => Some(StreamMessage::Text(text.to_string())),
        WsMessage::Binary(data) => Some(StreamMessage::Binary(data)),
        WsMessage::Close(frame) => Some(StreamMessage::Close(
            frame.map(|f| CloseReason::new(f.code, f.reason.to_string())),
        )),
        WsMessage::Ping(_) | WsMessage::Pong(_) => None,
    }
}

fn to_ws(message: StreamMessage) -> WsMessage {
    match message {
        StreamMessage::Text(text) => WsMessage::Text(text.into()),
        StreamMessage::Binary(data) => WsMessage::Binary(data),
        StreamMessage::Close(reason) => WsMessage::Close(reason.map(|r| CloseFrame {
            code: r.code,
            reason: r.reason.into(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_frame_conversion() {
        let message = StreamMessage::Close(Some(CloseReason::new(1008, "Not Found")));
        let frame = to_ws(message.clone());
        assert!(matches!(&frame, WsMessage::Close(Some(f)) if f.code == 1008 && f.reason.as_str() == "Not Found"));
        assert_eq!(from_ws(frame), Some(message));
    }

    #[test]
    fn test_control_frames_are_dropped() {
        assert_eq!(from_ws(WsMessage::Ping(Default::default())), None);
        assert_eq!(
            from_ws(WsMessage::Text("hi".into())),
            Some(StreamMessage::Text("hi".into()))
        );
    }
}
