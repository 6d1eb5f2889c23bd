//! Chunk parser for text frames. Encoding lives on [`Frame::encode`].

use crate::error::ProtocolError;
use crate::frame::{Command, Frame};
use crate::FRAME_TERMINATOR;
use std::collections::BTreeMap;

/// Parses one raw frame (the text between two terminators, terminator excluded).
///
/// Returns `Ok(None)` when the text is blank, which is how heartbeats look
/// on the wire.
pub fn parse_frame(raw: &str) -> Result<Option<Frame>, ProtocolError> {
    let mut command: Option<Command> = None;
    let mut headers = BTreeMap::new();
    let mut consumed = 0;
    let mut body_start = None;

    for line in raw.split_inclusive('\n') {
        consumed += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        if command.is_none() {
            let word = content.trim();
            if word.is_empty() {
                continue;
            }
            command = Some(word.parse()?);
            continue;
        }

        if content.trim().is_empty() {
            body_start = Some(consumed);
            break;
        }

        let (key, value) = content
            .split_once(':')
            .ok_or_else(|| ProtocolError::MalformedHeader(content.to_string()))?;
        // Repeated headers: first one wins.
        headers
            .entry(key.trim().to_string())
            .or_insert_with(|| value.trim().to_string());
    }

    let Some(command) = command else {
        return Ok(None);
    };
    let body = body_start
        .map(|start| raw[start..].to_string())
        .unwrap_or_default();

    Ok(Some(Frame {
        command,
        headers,
        body,
    }))
}

/// Splits a received chunk into frames.
///
/// The chunk is assumed to hold whole frames: text after the last
/// terminator is left unparsed and can be inspected with
/// [`Frames::pending`]. Blank raw frames are absorbed, malformed ones are
/// skipped and counted.
pub fn parse_chunk(text: &str) -> Frames<'_> {
    Frames {
        rest: text,
        malformed: 0,
    }
}

/// Lazy iterator over the frames of one chunk. Not restartable.
#[derive(Debug)]
pub struct Frames<'a> {
    rest: &'a str,
    malformed: usize,
}

impl<'a> Frames<'a> {
    /// Number of raw frames skipped because they could not be parsed.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Unterminated text left over once the iterator is exhausted.
    pub fn pending(&self) -> &'a str {
        self.rest
    }
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        while let Some(end) = self.rest.find(FRAME_TERMINATOR) {
            let raw = &self.rest[..end];
            self.rest = &self.rest[end + FRAME_TERMINATOR.len_utf8()..];

            match parse_frame(raw) {
                Ok(Some(frame)) => return Some(frame),
                Ok(None) => continue,
                Err(_) => {
                    self.malformed += 1;
                    continue;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_connected_and_message_chunk() {
        let chunk = "CONNECTED\nversion:1.2\n\n\u{0}MESSAGE\ndestination:/topic/users/7/appointments\n\n{\"id\":1}\u{0}";
        let frames: Vec<Frame> = parse_chunk(chunk).collect();

        assert_eq!(frames.len(), 2);

        assert_eq!(frames[0].command, Command::Connected);
        assert_eq!(frames[0].header("version"), Some("1.2"));
        assert_eq!(frames[0].headers.len(), 1);
        assert_eq!(frames[0].body, "");

        assert_eq!(frames[1].command, Command::Message);
        assert_eq!(
            frames[1].header("destination"),
            Some("/topic/users/7/appointments")
        );
        assert_eq!(frames[1].body, "{\"id\":1}");
    }

    #[test]
    fn test_heartbeats_absorbed() {
        let chunk = "\n\u{0}\r\n\n\u{0}   \u{0}\u{0}";
        assert_eq!(parse_chunk(chunk).count(), 0);
        assert_eq!(parse_frame("\n\n  \n").unwrap(), None);
    }

    #[test]
    fn test_leading_blank_lines_skipped() {
        let chunk = "\n\nCONNECTED\nversion:1.2\n\n\u{0}";
        let frames: Vec<Frame> = parse_chunk(chunk).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, Command::Connected);
    }

    #[test]
    fn test_trailing_partial_frame_is_pending() {
        let mut frames = parse_chunk("CONNECTED\n\n\u{0}MESSAGE\ndestination:/x\n\n{\"id\"");
        assert_eq!(frames.next().unwrap().command, Command::Connected);
        assert!(frames.next().is_none());
        assert_eq!(frames.pending(), "MESSAGE\ndestination:/x\n\n{\"id\"");
    }

    #[test]
    fn test_chunk_without_terminator_yields_nothing() {
        assert_eq!(parse_chunk("CONNECTED\nversion:1.2\n\n").count(), 0);
        assert_eq!(parse_chunk("").count(), 0);
    }

    #[test]
    fn test_malformed_frames_skipped() {
        let chunk = "BOGUS\n\n\u{0}MESSAGE\nno-colon-here\n\nx\u{0}MESSAGE\n\n{}\u{0}";
        let mut frames = parse_chunk(chunk);
        let parsed: Vec<Frame> = frames.by_ref().collect();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].body, "{}");
        assert_eq!(frames.malformed(), 2);
    }

    #[test]
    fn test_parse_frame_errors() {
        assert_eq!(
            parse_frame("NACK\n\n"),
            Err(ProtocolError::UnknownCommand("NACK".to_string()))
        );
        assert_eq!(
            parse_frame("MESSAGE\nbroken\n\n"),
            Err(ProtocolError::MalformedHeader("broken".to_string()))
        );
    }

    #[test]
    fn test_header_split_on_first_colon_and_trimmed() {
        let frame = parse_frame("ERROR\n message : bad: destination \n\n")
            .unwrap()
            .unwrap();
        assert_eq!(frame.header("message"), Some("bad: destination"));
    }

    #[test]
    fn test_duplicate_header_first_wins() {
        let frame = parse_frame("MESSAGE\nfoo:1\nfoo:2\n\n").unwrap().unwrap();
        assert_eq!(frame.header("foo"), Some("1"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let frame = parse_frame("CONNECTED\r\nversion:1.2\r\n\r\nbody")
            .unwrap()
            .unwrap();
        assert_eq!(frame.command, Command::Connected);
        assert_eq!(frame.header("version"), Some("1.2"));
        assert_eq!(frame.body, "body");
    }

    #[test]
    fn test_body_preserves_blank_lines() {
        let frame = parse_frame("MESSAGE\n\nline one\n\nline three\n")
            .unwrap()
            .unwrap();
        assert_eq!(frame.body, "line one\n\nline three\n");
    }

    #[test]
    fn test_frame_without_header_terminator() {
        let frame = parse_frame("CONNECTED\nversion:1.2").unwrap().unwrap();
        assert_eq!(frame.header("version"), Some("1.2"));
        assert_eq!(frame.body, "");
    }

    fn encode_all(frames: &[Frame]) -> String {
        frames.iter().map(Frame::encode).collect()
    }

    #[test]
    fn test_encode_all() {
        let frames = [
            Frame::new(Command::Connected),
            Frame::new(Command::Message).with_body("{}"),
        ];
        let chunk = encode_all(&frames);
        let parsed: Vec<Frame> = parse_chunk(&chunk).collect();
        assert_eq!(parsed, frames);
    }

    fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            Just(Command::Connect),
            Just(Command::Subscribe),
            Just(Command::Send),
            Just(Command::Connected),
            Just(Command::Message),
            Just(Command::Error),
        ]
    }

    fn arb_frame() -> impl Strategy<Value = Frame> {
        (
            arb_command(),
            prop::collection::btree_map("[a-z][a-z-]{0,10}", "[A-Za-z0-9/,.]{0,12}", 0..4),
            "[A-Za-z0-9{}\":, \n]{0,40}",
        )
            .prop_map(|(command, headers, body)| Frame {
                command,
                headers,
                body,
            })
    }

    proptest! {
        #[test]
        fn prop_chunk_yields_every_frame_in_order(frames in prop::collection::vec(arb_frame(), 0..8)) {
            let chunk = encode_all(&frames);
            let parsed: Vec<Frame> = parse_chunk(&chunk).collect();
            prop_assert_eq!(parsed, frames);
        }

        #[test]
        fn prop_heartbeats_between_frames_are_ignored(
            frames in prop::collection::vec(arb_frame(), 1..5),
            beats in 0usize..4,
        ) {
            let mut chunk = String::new();
            for frame in &frames {
                for _ in 0..beats {
                    chunk.push_str("\n\u{0}");
                }
                chunk.push_str(&frame.encode());
            }
            prop_assert_eq!(parse_chunk(&chunk).count(), frames.len());
        }
    }
}
