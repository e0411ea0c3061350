//! Envelope codec for frames pushed by the hub.
//!
//! A frame looks like
//! `{"C":"d-1F2E,0|A,2|B,2|C,0","M":[{"H":"ReportingHub","M":"StatusChanged","A":[...]}]}`.
//! Only envelopes whose channel identifier carries the expected group
//! markers hold device updates; everything else (keep-alive `{}` frames,
//! init messages, other groups) is filtered out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::DecodeError;

use super::events::LiveEvent;

/// Frames shorter than this are never envelopes.
pub const MIN_FRAME_LEN: usize = 10;

/// Leading digit both channel markers must carry for an envelope to be relevant.
const RELEVANT_MARKER: u32 = 2;

/// A transport frame: a channel identifier plus a batch of invocations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Comma-separated channel identifier.
    #[serde(rename = "C", default)]
    pub channel: String,
    /// Invocations, in the order the hub sent them.
    #[serde(rename = "M", default)]
    pub invocations: Vec<MethodInvocation>,
}

/// One hub method call with its raw arguments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodInvocation {
    /// Hub name.
    #[serde(rename = "H", default)]
    pub hub: String,
    /// Method name.
    #[serde(rename = "M", default)]
    pub method: String,
    /// Positional arguments, decoded on demand.
    #[serde(rename = "A", default)]
    pub arguments: Vec<Value>,
}

impl Envelope {
    /// Whether this envelope carries device updates.
    ///
    /// See [`is_relevant`].
    pub fn is_relevant(&self) -> bool {
        is_relevant(self)
    }

    /// Decode every invocation, preserving order.
    ///
    /// Each invocation is decoded independently, so one unknown method does
    /// not hide the events next to it.
    pub fn events(&self) -> impl Iterator<Item = Result<LiveEvent, DecodeError>> + '_ {
        self.invocations.iter().map(LiveEvent::decode)
    }
}

/// Decode a raw frame into an [`Envelope`].
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(DecodeError::TooShort {
            len: bytes.len(),
            min: MIN_FRAME_LEN,
        });
    }
    serde_json::from_slice(bytes).map_err(DecodeError::Malformed)
}

/// Best-effort relevance filter.
///
/// The channel identifier must have exactly five comma-separated parts, and
/// the third and fourth must each start with the digit 2. Anything that does
/// not parse is simply not relevant.
pub fn is_relevant(envelope: &Envelope) -> bool {
    let parts: Vec<&str> = envelope.channel.split(',').collect();
    if parts.len() != 5 {
        return false;
    }

    let Some(first) = leading_digit(parts[2]) else {
        warn!(channel = %envelope.channel, "unable to parse message ID 1");
        return false;
    };
    let Some(second) = leading_digit(parts[3]) else {
        warn!(channel = %envelope.channel, "unable to parse message ID 2");
        return false;
    };

    first == RELEVANT_MARKER && second == RELEVANT_MARKER
}

/// Decode a frame and apply [`is_relevant`], treating decode failures as
/// not relevant.
pub fn is_relevant_frame(bytes: &[u8]) -> bool {
    if bytes.len() < MIN_FRAME_LEN {
        return false;
    }
    match decode_envelope(bytes) {
        Ok(envelope) => envelope.is_relevant(),
        Err(e) => {
            warn!(error = %e, "unable to parse message");
            false
        }
    }
}

fn leading_digit(part: &str) -> Option<u32> {
    part.chars().next()?.to_digit(10)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
