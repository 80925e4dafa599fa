//! Event-stream framing and record-tree maintenance
//!
//! The realtime database delivers changes as a `text/event-stream` of
//! `put`/`patch` events whose payload carries a path into the record tree
//! and the data to apply there. These helpers are pure so the framing and
//! the path application can be tested without a network.

use serde_json::Value;

/// One parsed server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name (`put`, `patch`, `keep-alive`, `auth_revoked`, `cancel`)
    pub name: String,
    /// Raw data payload, joined across `data:` lines
    pub data: String,
}

/// Incremental parser for a server-sent event stream.
///
/// Feed raw chunks as they arrive; complete events are returned in order.
/// Partial lines and partial events are buffered across calls.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    name: String,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of the stream, returning any events it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                // Blank line terminates the pending event
                if !self.name.is_empty() || !self.data.is_empty() {
                    events.push(SseEvent {
                        name: std::mem::take(&mut self.name),
                        data: self.data.join("\n"),
                    });
                    self.data.clear();
                }
            } else if let Some(rest) = line.strip_prefix("event:") {
                self.name = rest.trim_start().to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data.push(rest.trim_start().to_string());
            }
            // Comment lines (leading ':') and unknown fields are ignored
        }
        events
    }
}

/// Replace the subtree at `path` with `data`.
///
/// `path` is `/`-separated with `/` denoting the record root. A `null`
/// payload removes the addressed key.
pub fn apply_put(tree: &mut Value, path: &str, data: Value) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        *tree = data;
        return;
    }

    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };
    let parent = node_at(tree, parents);
    let map = ensure_object(parent);
    if data.is_null() {
        map.remove(*last);
    } else {
        map.insert((*last).to_string(), data);
    }
}

/// Merge the keys of `data` into the subtree at `path`.
///
/// Keys with `null` values are removed; non-object payloads fall back to a
/// plain put.
pub fn apply_patch(tree: &mut Value, path: &str, data: Value) {
    let entries = match data {
        Value::Object(map) => map,
        other => {
            apply_put(tree, path, other);
            return;
        }
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let target = node_at(tree, &segments);
    let map = ensure_object(target);
    for (key, value) in entries {
        if value.is_null() {
            map.remove(&key);
        } else {
            map.insert(key, value);
        }
    }
}

fn node_at<'a>(tree: &'a mut Value, segments: &[&str]) -> &'a mut Value {
    let mut node = tree;
    for segment in segments {
        let map = ensure_object(node);
        node = map
            .entry((*segment).to_string())
            .or_insert(Value::Object(serde_json::Map::new()));
    }
    node
}

fn ensure_object(node: &mut Value) -> &mut serde_json::Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(serde_json::Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_single_event() {
        let mut parser = SseParser::new();
        let events = parser.push(b"event: put\ndata: {\"path\":\"/\",\"data\":null}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "put");
        assert_eq!(events[0].data, "{\"path\":\"/\",\"data\":null}");
    }

    #[test]
    fn parses_events_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"event: pu").is_empty());
        assert!(parser.push(b"t\ndata: {\"a\":1}").is_empty());
        let events = parser.push(b"\n\nevent: keep-alive\ndata: null\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "put");
        assert_eq!(events[0].data, "{\"a\":1}");
        assert_eq!(events[1].name, "keep-alive");
    }

    #[test]
    fn ignores_comment_lines() {
        let mut parser = SseParser::new();
        let events = parser.push(b": heartbeat\n\nevent: cancel\ndata: null\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "cancel");
    }

    #[test]
    fn put_at_root_replaces_tree() {
        let mut tree = json!({"status": 1});
        apply_put(&mut tree, "/", json!({"status": 2, "progress": 10}));
        assert_eq!(tree, json!({"status": 2, "progress": 10}));
    }

    #[test]
    fn put_at_path_replaces_subtree() {
        let mut tree = json!({"status": 1, "progress": 40});
        apply_put(&mut tree, "/status", json!(2));
        assert_eq!(tree, json!({"status": 2, "progress": 40}));
    }

    #[test]
    fn put_null_removes_key() {
        let mut tree = json!({"status": 1, "progress": 40});
        apply_put(&mut tree, "/progress", Value::Null);
        assert_eq!(tree, json!({"status": 1}));
    }

    #[test]
    fn put_creates_missing_parents() {
        let mut tree = Value::Null;
        apply_put(&mut tree, "/a/b", json!(1));
        assert_eq!(tree, json!({"a": {"b": 1}}));
    }

    #[test]
    fn patch_merges_keys() {
        let mut tree = json!({"status": 1, "progress": 40});
        apply_patch(&mut tree, "/", json!({"status": 2, "network": -60}));
        assert_eq!(tree, json!({"status": 2, "progress": 40, "network": -60}));
    }

    #[test]
    fn patch_null_value_removes_key() {
        let mut tree = json!({"status": 1, "progress": 40});
        apply_patch(&mut tree, "/", json!({"progress": null}));
        assert_eq!(tree, json!({"status": 1}));
    }
}
