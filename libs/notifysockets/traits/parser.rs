use crate::error::{NotifySocketError, Result};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// One inbound data frame as handed over by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    /// Frame payload as UTF-8, decoding binary frames
    pub fn to_text(&self) -> Result<&str> {
        match self {
            Frame::Text(s) => Ok(s),
            Frame::Binary(b) => std::str::from_utf8(b)
                .map_err(|e| NotifySocketError::Parse(format!("binary frame is not UTF-8: {}", e))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Frame::Text(s) => s.len(),
            Frame::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Frame::Text(text)
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Frame::Text(text.to_owned())
    }
}

/// Turns a raw frame into the message type subscribers receive
///
/// Runs on the connection's session task, once per frame, in arrival order.
/// An `Err` skips delivery of that frame and is reported as a diagnostic; it
/// never closes the connection.
pub trait FrameParser<M>: Send + Sync + 'static {
    fn parse(&self, frame: &Frame) -> Result<M>;
}

/// Parses frames as JSON into any deserializable `M`
///
/// A frame must hold a JSON object or array; scalars (`42`, `"x"`, `null`)
/// are rejected as parse failures before deserialization.
pub struct JsonParser<M> {
    _message: PhantomData<fn() -> M>,
}

impl<M> JsonParser<M> {
    pub fn new() -> Self {
        Self {
            _message: PhantomData,
        }
    }
}

impl<M> Default for JsonParser<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for JsonParser<M> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<M> std::fmt::Debug for JsonParser<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonParser")
    }
}

impl<M> FrameParser<M> for JsonParser<M>
where
    M: DeserializeOwned + Send + Sync + 'static,
{
    fn parse(&self, frame: &Frame) -> Result<M> {
        let text = frame.to_text()?;
        if !matches!(text.trim_start().as_bytes().first(), Some(b'{') | Some(b'[')) {
            return Err(NotifySocketError::Parse(
                "frame must hold a JSON object or array".to_string(),
            ));
        }
        Ok(serde_json::from_str(text)?)
    }
}

impl<M, F> FrameParser<M> for F
where
    F: Fn(&Frame) -> Result<M> + Send + Sync + 'static,
{
    fn parse(&self, frame: &Frame) -> Result<M> {
        self(frame)
    }
}
