//! Live-push channel.
//!
//! The backend pushes JSON frames of the form `{ "type": ..., "payload": ... }`
//! over a WebSocket. Delivery is at-least-once with best-effort ordering; the
//! merge step deduplicates and re-sorts, so frames are forwarded as they come.

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::error::{Error, Result};
use crate::models::{GroupId, Message, MessageGroup, RawMessage};

/// Frame envelope as sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum LiveFrame {
    Message(RawMessage),
    GroupUpdated(MessageGroup),
    Error { message: String },
}

/// Decoded, validated live event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    Message(Message),
    GroupUpdated(MessageGroup),
    ServerError(String),
}

impl LiveEvent {
    /// Conversation the event concerns, if any
    pub const fn group(&self) -> Option<GroupId> {
        match self {
            Self::Message(message) => Some(message.group),
            Self::GroupUpdated(group) => Some(group.id),
            Self::ServerError(_) => None,
        }
    }
}

/// Decode one text frame.
///
/// Message payloads missing required fields yield [`Error::MalformedRecord`].
pub fn decode_frame(text: &str) -> Result<LiveEvent> {
    let frame: LiveFrame = serde_json::from_str(text)?;
    Ok(match frame {
        LiveFrame::Message(raw) => LiveEvent::Message(raw.validate()?),
        LiveFrame::GroupUpdated(group) => LiveEvent::GroupUpdated(group),
        LiveFrame::Error { message } => LiveEvent::ServerError(message),
    })
}

/// WebSocket subscription forwarding decoded events through a channel
#[derive(Debug)]
pub struct LiveConnection {
    events: mpsc::UnboundedReceiver<LiveEvent>,
    reader: JoinHandle<()>,
}

impl LiveConnection {
    /// Connect to the live endpoint, authenticating with `access_token` if given
    pub async fn connect(url: &str, access_token: Option<&str>) -> Result<Self> {
        let url = match access_token {
            Some(token) => {
                let separator = if url.contains('?') { '&' } else { '?' };
                format!("{url}{separator}token={}", urlencoding::encode(token))
            }
            None => url.to_string(),
        };

        let (mut stream, _) = connect_async(url.as_str())
            .await
            .map_err(|error| Error::WebSocket(error.to_string()))?;
        tracing::info!("Connected to live channel");

        let (sender, events) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => match decode_frame(&text) {
                        Ok(event) => {
                            if sender.send(event).is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            tracing::warn!("Dropping live frame: {}", error);
                        }
                    },
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(error) => {
                        tracing::warn!("Live channel read failed: {}", error);
                        break;
                    }
                }
            }
            tracing::info!("Live channel closed");
        });

        Ok(Self { events, reader })
    }

    /// Next event, or `None` once the connection is gone
    pub async fn recv(&mut self) -> Option<LiveEvent> {
        self.events.recv().await
    }

    pub fn close(self) {
        self.reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_message_frame() {
        let frame = r#"{
            "type": "message",
            "payload": {
                "id": 3, "group": 9, "user": 2, "nickname": "Bo",
                "created_at": "2024-05-01T10:00:00Z", "message": "yo",
                "identifier": "k-1"
            }
        }"#;
        let event = decode_frame(frame).unwrap();
        assert_eq!(event.group(), Some(GroupId::new(9)));
        assert!(matches!(event, LiveEvent::Message(ref message) if message.message == "yo"));
    }

    #[test]
    fn malformed_message_frame_is_reported() {
        let frame = r#"{"type": "message", "payload": {"id": 3, "group": 9}}"#;
        assert!(matches!(
            decode_frame(frame),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn decodes_group_update_and_error_frames() {
        let update = r#"{"type": "group_updated", "payload": {"id": 4, "is_direct_message": true, "attendants": []}}"#;
        assert_eq!(decode_frame(update).unwrap().group(), Some(GroupId::new(4)));

        let error = r#"{"type": "error", "payload": {"message": "rate limited"}}"#;
        assert_eq!(
            decode_frame(error).unwrap(),
            LiveEvent::ServerError("rate limited".to_string())
        );
    }

    #[test]
    fn unknown_frame_type_is_a_serialization_error() {
        assert!(matches!(
            decode_frame(r#"{"type": "typing", "payload": {}}"#),
            Err(Error::Serialization(_))
        ));
    }
}
