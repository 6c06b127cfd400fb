//! Wire format helpers shared by the control and event sockets.
//!
//! # Requests
//!
//! A request is a bare ASCII string with no terminator, e.g.
//! `dispatch workspace 3`.  Prefixing a data command with `j/` asks Hyprland
//! for a JSON reply (`j/workspaces`).  The compositor closes the connection
//! once it has answered.
//!
//! # Events
//!
//! socket2 emits one record per line:
//!
//! ```text
//! createworkspacev2>>4,4\n
//! moveworkspacev2>>4,4,DP-2\n
//! ```
//!
//! Reads from the socket do not respect record boundaries, so incoming bytes
//! go through a [`LineDecoder`] before being split with
//! [`parse_event_record`].

use super::IpcError;
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Frame a data query so that Hyprland answers with JSON.
pub fn json_request(command: &str) -> String {
    format!("j/{}", command)
}

/// Frame a dispatcher invocation.
pub fn dispatch_request(args: &str) -> String {
    format!("dispatch {}", args)
}

/// Split an event record into `(name, payload)`.
///
/// Returns `None` when the `>>` delimiter is missing.
pub fn parse_event_record(record: &str) -> Option<(&str, &str)> {
    record.split_once(">>")
}

/// Parse a raw reply into a generic JSON tree.
pub fn parse_structured(bytes: &[u8]) -> Result<Value, IpcError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Parse a raw reply straight into a typed record.
pub fn parse_typed<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, IpcError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Field lookups with caller-supplied fallbacks.
///
/// A missing field, or one of an unexpected type, yields the default.
pub trait ValueExt {
    fn get_i64(&self, field: &str, default: i64) -> i64;
    fn get_bool(&self, field: &str, default: bool) -> bool;
    fn get_str<'a>(&'a self, field: &str, default: &'a str) -> &'a str;
    /// Walk nested objects, e.g. `["activeWorkspace", "id"]`.
    fn get_path(&self, path: &[&str]) -> Option<&Value>;
}

impl ValueExt for Value {
    fn get_i64(&self, field: &str, default: i64) -> i64 {
        self.get(field).and_then(Value::as_i64).unwrap_or(default)
    }

    fn get_bool(&self, field: &str, default: bool) -> bool {
        self.get(field).and_then(Value::as_bool).unwrap_or(default)
    }

    fn get_str<'a>(&'a self, field: &str, default: &'a str) -> &'a str {
        self.get(field).and_then(Value::as_str).unwrap_or(default)
    }

    fn get_path(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }
}

/// Reassembles newline-terminated records from arbitrarily chunked reads.
///
/// Bytes after the last newline of a chunk are kept and prefixed to the next
/// chunk.  Records are converted to text only once complete, so a UTF-8
/// sequence split across reads is decoded correctly.
///
/// An unfinished record longer than the limit is dropped up to its newline.
#[derive(Debug)]
pub struct LineDecoder {
    carry: Vec<u8>,
    limit: usize,
    /// Skipping the rest of an oversized record.
    discarding: bool,
}

/// Longest unfinished record [`LineDecoder::new`] holds on to.
pub const DEFAULT_MAX_PENDING: usize = 64 * 1024;

impl Default for LineDecoder {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_PENDING)
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            carry: Vec::new(),
            limit,
            discarding: false,
        }
    }

    /// Consume one chunk and return every record it completes, in order.
    /// Empty lines are skipped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut records = Vec::new();
        let mut start = 0;
        while let Some(offset) = chunk[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            if self.discarding {
                self.discarding = false;
                start = end + 1;
                continue;
            }
            let line = if self.carry.is_empty() {
                String::from_utf8_lossy(&chunk[start..end]).into_owned()
            } else {
                self.carry.extend_from_slice(&chunk[start..end]);
                let line = String::from_utf8_lossy(&self.carry).into_owned();
                self.carry.clear();
                line
            };
            if !line.is_empty() {
                records.push(line);
            }
            start = end + 1;
        }
        if !self.discarding {
            self.carry.extend_from_slice(&chunk[start..]);
            if self.carry.len() > self.limit {
                warn!(
                    "event record exceeds {} bytes without a newline, dropping it",
                    self.limit
                );
                self.carry.clear();
                self.discarding = true;
            }
        }
        records
    }

    /// Bytes of an unfinished record waiting for its newline.
    pub fn pending(&self) -> &[u8] {
        &self.carry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STREAM: &str = "createworkspacev2>>4,4\n\
                          moveworkspacev2>>4,4,DP-2\n\
                          renameworkspace>>4,mail, chat\n\
                          workspace>>4\n\
                          activespecial>>special:term,DP-1\n\
                          urgent>>55d0c3a1b2f0\n";

    fn expected() -> Vec<String> {
        STREAM.lines().map(str::to_owned).collect()
    }

    #[test]
    fn framing_helpers() {
        assert_eq!(json_request("workspaces"), "j/workspaces");
        assert_eq!(dispatch_request("workspace 3"), "dispatch workspace 3");
    }

    #[test]
    fn parse_event_record_valid() {
        assert_eq!(
            parse_event_record("createworkspacev2>>4,4"),
            Some(("createworkspacev2", "4,4"))
        );
        assert_eq!(parse_event_record("configreloaded>>"), Some(("configreloaded", "")));
    }

    #[test]
    fn parse_event_record_missing_delimiter() {
        assert_eq!(parse_event_record("garbage"), None);
        assert_eq!(parse_event_record("half>only"), None);
    }

    #[test]
    fn payload_may_contain_delimiter() {
        assert_eq!(
            parse_event_record("renameworkspace>>3,a>>b"),
            Some(("renameworkspace", "3,a>>b"))
        );
    }

    #[test]
    fn whole_stream_in_one_chunk() {
        let mut dec = LineDecoder::new();
        assert_eq!(dec.feed(STREAM.as_bytes()), expected());
        assert!(dec.pending().is_empty());
    }

    #[test]
    fn every_single_split_point() {
        let bytes = STREAM.as_bytes();
        for split in 0..=bytes.len() {
            let mut dec = LineDecoder::new();
            let mut got = dec.feed(&bytes[..split]);
            got.extend(dec.feed(&bytes[split..]));
            assert_eq!(got, expected(), "split at {}", split);
        }
    }

    #[test]
    fn every_chunk_size() {
        let bytes = STREAM.as_bytes();
        for size in 1..=bytes.len() {
            let mut dec = LineDecoder::new();
            let got: Vec<String> = bytes.chunks(size).flat_map(|c| dec.feed(c)).collect();
            assert_eq!(got, expected(), "chunk size {}", size);
        }
    }

    #[test]
    fn partial_record_is_held_back() {
        let mut dec = LineDecoder::new();
        assert!(dec.feed(b"workspace>").is_empty());
        assert_eq!(dec.pending(), b"workspace>");
        assert!(dec.feed(b">").is_empty());
        assert_eq!(dec.feed(b"7\nfocused"), vec!["workspace>>7".to_string()]);
        assert_eq!(dec.pending(), b"focused");
    }

    #[test]
    fn split_utf8_sequence_survives() {
        let record = "renameworkspace>>3,café\n".as_bytes();
        // 'é' is two bytes; cut between them.
        let cut = record.len() - 2;
        let mut dec = LineDecoder::new();
        assert!(dec.feed(&record[..cut]).is_empty());
        assert_eq!(dec.feed(&record[cut..]), vec!["renameworkspace>>3,café".to_string()]);
    }

    #[test]
    fn oversized_record_is_dropped_up_to_its_newline() {
        let mut dec = LineDecoder::with_limit(8);
        assert!(dec.feed(b"workspace>>").is_empty());
        assert!(dec.pending().is_empty());
        assert!(dec.feed(b"more-of-the-same").is_empty());
        assert!(dec.pending().is_empty());
        assert_eq!(
            dec.feed(b"12
ws>>1
ws>"),
            vec!["ws>>1".to_string()]
        );
        assert_eq!(dec.pending(), b"ws>");
    }

    #[test]
    fn complete_records_are_not_limited() {
        let mut dec = LineDecoder::with_limit(4);
        assert_eq!(dec.feed(b"workspace>>12
"), vec!["workspace>>12".to_string()]);
    }

    #[test]
    fn blank_lines_skipped() {
        let mut dec = LineDecoder::new();
        assert_eq!(dec.feed(b"\n\nworkspace>>1\n\n"), vec!["workspace>>1".to_string()]);
    }

    #[test]
    fn structured_reply_parses() {
        let v = parse_structured(br#"[{"id":1,"name":"1"}]"#).unwrap();
        assert_eq!(v[0].get_i64("id", 0), 1);
    }

    #[test]
    fn malformed_reply_is_protocol_error() {
        let err = parse_structured(b"unknown request").unwrap_err();
        assert!(matches!(err, IpcError::Protocol(_)));
    }

    #[test]
    fn value_ext_defaults() {
        let v = json!({
            "id": 3,
            "name": "3",
            "focused": true,
            "activeWorkspace": { "id": 5 }
        });
        assert_eq!(v.get_i64("id", -1), 3);
        assert_eq!(v.get_i64("missing", -1), -1);
        assert_eq!(v.get_i64("name", -1), -1);
        assert_eq!(v.get_str("name", ""), "3");
        assert_eq!(v.get_str("monitor", "none"), "none");
        assert!(v.get_bool("focused", false));
        assert!(!v.get_bool("persistent", false));
        assert_eq!(
            v.get_path(&["activeWorkspace", "id"]).and_then(Value::as_i64),
            Some(5)
        );
        assert!(v.get_path(&["specialWorkspace", "id"]).is_none());
    }
}
