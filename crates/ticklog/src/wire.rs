//! Wire format for the data and command sockets
//!
//! - Samples: the last frame of a message is a JSON array of numbers.
//! - Requests: after the ROUTER envelope, every frame is UTF-8 text split on
//!   whitespace into tokens.
//! - Replies: one frame holding the decimal status code.

use anyhow::{bail, Context, Result};

use crate::command::Reply;

/// Frames as raw bytes, independent of the socket library.
pub type Frames = Vec<Vec<u8>>;

pub fn encode_sample(values: &[f64]) -> Result<Vec<u8>> {
    serde_json::to_vec(values).context("failed to serialize sample")
}

pub fn decode_sample(frames: &[Vec<u8>]) -> Result<Vec<f64>> {
    let Some(data) = frames.last() else {
        bail!("empty sample message");
    };
    serde_json::from_slice(data).context("sample is not a JSON array of numbers")
}

/// Split a ROUTER message into its routing envelope and request tokens.
///
/// The envelope is the identity frame, plus the empty delimiter when one
/// directly follows it. Plain DEALER peers send no delimiter, so empty frames
/// further along belong to the body.
pub fn split_request(mut frames: Frames) -> Result<(Frames, Vec<String>)> {
    if frames.is_empty() {
        bail!("empty request message");
    }

    let envelope_len = match frames.get(1) {
        Some(delimiter) if delimiter.is_empty() => 2,
        _ => 1,
    };
    let body = frames.split_off(envelope_len);

    let mut tokens = Vec::new();
    for frame in body {
        let text = String::from_utf8(frame).context("request frame is not UTF-8")?;
        tokens.extend(text.split_whitespace().map(str::to_string));
    }

    Ok((frames, tokens))
}

/// Request frames as sent by a DEALER client, delimiter first.
pub fn encode_request<S: AsRef<str>>(tokens: &[S]) -> Frames {
    let mut frames = Vec::with_capacity(tokens.len() + 1);
    frames.push(Vec::new());
    frames.extend(tokens.iter().map(|t| t.as_ref().as_bytes().to_vec()));
    frames
}

pub fn encode_reply(mut envelope: Frames, reply: Reply) -> Frames {
    envelope.push(reply.code().to_string().into_bytes());
    envelope
}

/// Decode a reply as seen by a DEALER client (leading delimiters skipped).
pub fn decode_reply(frames: &[Vec<u8>]) -> Result<Reply> {
    let Some(data) = frames.iter().find(|f| !f.is_empty()) else {
        bail!("empty reply message");
    };
    let text = std::str::from_utf8(data).context("reply is not UTF-8")?;
    let code: i32 = text
        .trim()
        .parse()
        .with_context(|| format!("reply {:?} is not an integer", text))?;
    Reply::from_code(code).with_context(|| format!("unknown reply code {}", code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(parts: &[&str]) -> Frames {
        parts.iter().map(|p| p.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_decode_sample() {
        let values = decode_sample(&frames(&["[1.0, 2, -3.5]"])).unwrap();
        assert_eq!(values, vec![1.0, 2.0, -3.5]);

        let empty = decode_sample(&frames(&["[]"])).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_decode_sample_uses_last_frame() {
        let values = decode_sample(&frames(&["topic", "[4.0]"])).unwrap();
        assert_eq!(values, vec![4.0]);
    }

    #[test]
    fn test_decode_sample_rejects_garbage() {
        assert!(decode_sample(&[]).is_err());
        assert!(decode_sample(&frames(&["1 2 3"])).is_err());
        assert!(decode_sample(&frames(&["[\"x\"]"])).is_err());
    }

    #[test]
    fn test_encode_sample_is_json() {
        let bytes = encode_sample(&[1.5, 2.0]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "[1.5,2.0]");
    }

    #[test]
    fn test_split_request_from_dealer_with_delimiter() {
        let mp = frames(&["id", "", "record", "x", "y"]);
        let (envelope, tokens) = split_request(mp).unwrap();
        assert_eq!(envelope, frames(&["id", ""]));
        assert_eq!(tokens, vec!["record", "x", "y"]);
    }

    #[test]
    fn test_split_request_without_delimiter() {
        let (envelope, tokens) = split_request(frames(&["id", "quit"])).unwrap();
        assert_eq!(envelope, frames(&["id"]));
        assert_eq!(tokens, vec!["quit"]);
    }

    #[test]
    fn test_split_request_empty_body_frame_is_not_a_delimiter() {
        let (envelope, tokens) = split_request(frames(&["id", "record", "", "x"])).unwrap();
        assert_eq!(envelope, frames(&["id"]));
        assert_eq!(tokens, vec!["record", "x"]);

        let reply = encode_reply(envelope, Reply::Success);
        assert_eq!(reply, frames(&["id", "1"]));
    }

    #[test]
    fn test_split_request_single_text_frame() {
        let (_, tokens) = split_request(frames(&["id", "", "record  l_knee r_knee\n"])).unwrap();
        assert_eq!(tokens, vec!["record", "l_knee", "r_knee"]);
    }

    #[test]
    fn test_split_request_rejects_invalid_utf8() {
        let mp = vec![b"id".to_vec(), Vec::new(), vec![0xff, 0xfe]];
        assert!(split_request(mp).is_err());
        assert!(split_request(Vec::new()).is_err());
    }

    #[test]
    fn test_reply_roundtrip() {
        let envelope = frames(&["id", ""]);
        let reply = encode_reply(envelope, Reply::Success);
        assert_eq!(reply, frames(&["id", "", "1"]));

        // DEALER side sees the delimiter but not the identity
        assert_eq!(decode_reply(&frames(&["", "1"])).unwrap(), Reply::Success);
        assert_eq!(decode_reply(&frames(&["", "0"])).unwrap(), Reply::Failure);
        assert!(decode_reply(&frames(&["", "2"])).is_err());
        assert!(decode_reply(&frames(&[""])).is_err());
    }

    #[test]
    fn test_encode_request() {
        assert_eq!(encode_request(&["quit"]), frames(&["", "quit"]));
    }
}
