//! Outgoing message model and the host seam.
//!
//! The host owns the message. The guard only needs to read its plain text,
//! swap the whole content chain, and leave an optional note for monitoring.

use serde::{Deserialize, Serialize};

use crate::error::AnnotationError;

/// One piece of an outgoing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Plain { text: String },
    Image { url: String },
    Mention { target: String },
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn as_plain(&self) -> Option<&str> {
        match self {
            Self::Plain { text } => Some(text),
            _ => None,
        }
    }
}

/// Concatenate every plain-text segment, in order.
pub fn plain_text(chain: &[Segment]) -> String {
    chain.iter().filter_map(Segment::as_plain).collect()
}

/// What the guard needs from a host's outgoing-message object.
pub trait ResponseEvent {
    /// The content chain, or `None` when no result has been produced.
    fn chain_mut(&mut self) -> Option<&mut Vec<Segment>>;

    /// Record the pre-replacement text for downstream monitoring.
    fn attach_annotation(&mut self, original: &str) -> Result<(), AnnotationError>;
}

/// Default in-process message used by the binary and tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Content chain; `None` until a result exists.
    pub chain: Option<Vec<Segment>>,
    /// Original text of a replaced response, for monitoring only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_error: Option<String>,
}

impl OutgoingMessage {
    /// A message whose chain is a single plain-text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_chain(vec![Segment::plain(text)])
    }

    pub fn with_chain(chain: Vec<Segment>) -> Self {
        Self {
            chain: Some(chain),
            reported_error: None,
        }
    }

    /// Plain text as it would be delivered.
    pub fn delivered_text(&self) -> String {
        self.chain.as_deref().map(plain_text).unwrap_or_default()
    }

    pub fn set_reported_error(&mut self, original: impl Into<String>) {
        self.reported_error = Some(original.into());
    }
}

impl ResponseEvent for OutgoingMessage {
    fn chain_mut(&mut self) -> Option<&mut Vec<Segment>> {
        self.chain.as_mut()
    }

    fn attach_annotation(&mut self, original: &str) -> Result<(), AnnotationError> {
        self.set_reported_error(original);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_skips_other_segments() {
        let chain = vec![
            Segment::plain("Hello "),
            Segment::Image {
                url: "https://example.com/a.png".into(),
            },
            Segment::plain("world"),
        ];
        assert_eq!(plain_text(&chain), "Hello world");
    }

    #[test]
    fn message_without_chain_has_no_text() {
        let msg = OutgoingMessage::default();
        assert_eq!(msg.delivered_text(), "");
    }

    #[test]
    fn annotation_sets_reported_error() {
        let mut msg = OutgoingMessage::text("boom");
        msg.attach_annotation("boom").unwrap();
        assert_eq!(msg.reported_error.as_deref(), Some("boom"));
    }

    #[test]
    fn segments_serialize_with_type_tag() {
        let json = serde_json::to_value(Segment::plain("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "plain", "text": "hi"}));
    }
}
