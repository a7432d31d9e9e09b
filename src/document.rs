//! Builds the transient YAML document that bridges argument tokens into the
//! decode path.
//!
//! Each `key=value` token is resolved against the destination's
//! [`FieldInfo`] list and written at the matching nested path, so decoding
//! the result sets exactly the fields the tokens name. The produced
//! [`DocumentStream`] is created fresh per parse call, consumed once by the
//! decoder, then discarded.

use std::io::{self, Cursor, Read};

use serde_yaml::{Mapping, Value};

use crate::error::YamlfigError;
use crate::fields::{FieldInfo, PathSegment};

/// A field path with placeholders resolved to concrete indices and keys.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolvedSegment {
    Name(String),
    Index(usize),
}

/// Encode argument tokens as YAML bytes addressing FieldInfo paths.
///
/// Zero usable tokens yield an empty byte vector; decoding that must be a
/// no-op, not an error. Unmatched tokens are written at their literal dotted
/// path — only decode-time structural mismatches fail.
pub(crate) fn build_document(
    args: &[String],
    infos: &[FieldInfo],
) -> Result<Vec<u8>, YamlfigError> {
    let mut root = Value::Null;
    for token in args {
        let Some((key, raw_value)) = split_token(token) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        let path = resolve_key(key, infos).unwrap_or_else(|| literal_path(key));
        insert(&mut root, &path, parse_scalar(raw_value));
    }
    if root.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::to_string(&root)?.into_bytes())
}

/// Split a token into key and value at the first `=`, stripping an optional
/// `--` or `-` flag prefix. Tokens without `=` carry no assignment and are
/// skipped by the caller.
fn split_token(token: &str) -> Option<(&str, &str)> {
    let token = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .unwrap_or(token);
    token.split_once('=')
}

/// Resolve a token key to a concrete path. Flag aliases are tried first,
/// then the field path; the first FieldInfo that matches wins, in
/// declaration order.
fn resolve_key(key: &str, infos: &[FieldInfo]) -> Option<Vec<ResolvedSegment>> {
    for info in infos {
        if let Some(resolved) = match_flag(key, info) {
            return Some(resolved);
        }
        if let Some(resolved) = match_path(key, &info.path) {
            return Some(resolved);
        }
    }
    None
}

/// A flag alias matches the whole key exactly, and only addresses paths with
/// no placeholder segments.
fn match_flag(key: &str, info: &FieldInfo) -> Option<Vec<ResolvedSegment>> {
    if info.flag.as_deref() != Some(key) {
        return None;
    }
    info.path
        .iter()
        .map(|segment| match segment {
            PathSegment::Field(name) => Some(ResolvedSegment::Name(name.clone())),
            PathSegment::Index | PathSegment::Key => None,
        })
        .collect()
}

/// Match a token key against a field path.
///
/// Field names compare case-insensitively with `.`, `_`, and `-` accepted
/// interchangeably as separators, so `SERVER_HOST`, `server.host`, and
/// `server-host` all address the same field. `Index` placeholders consume a
/// numeric segment; `Key` placeholders consume a map key, backtracking over
/// split points so keys that themselves contain separators still resolve.
fn match_path(key: &str, path: &[PathSegment]) -> Option<Vec<ResolvedSegment>> {
    let Some((segment, rest)) = path.split_first() else {
        return key.is_empty().then(Vec::new);
    };
    match segment {
        PathSegment::Field(name) => {
            let prefix = key.get(..name.len())?;
            if !segment_eq(prefix, name) {
                return None;
            }
            let remainder = &key[name.len()..];
            let mut resolved = descend(remainder, rest)?;
            resolved.insert(0, ResolvedSegment::Name(name.clone()));
            Some(resolved)
        }
        PathSegment::Index => {
            let (digits, remainder) = until_separator(key);
            let index: usize = digits.parse().ok()?;
            let mut resolved = descend(remainder, rest)?;
            resolved.insert(0, ResolvedSegment::Index(index));
            Some(resolved)
        }
        PathSegment::Key => {
            for (part, remainder) in key_splits(key) {
                if part.is_empty() {
                    continue;
                }
                if let Some(mut resolved) = descend(remainder, rest) {
                    resolved.insert(0, ResolvedSegment::Name(part.to_string()));
                    return Some(resolved);
                }
            }
            None
        }
    }
}

/// Continue a match past a consumed segment: either the key is exhausted
/// along with the path, or a separator introduces the next segment.
fn descend(remainder: &str, rest: &[PathSegment]) -> Option<Vec<ResolvedSegment>> {
    if rest.is_empty() {
        return remainder.is_empty().then(Vec::new);
    }
    let remainder = strip_separator(remainder)?;
    match_path(remainder, rest)
}

fn is_separator(byte: u8) -> bool {
    matches!(byte, b'.' | b'_' | b'-')
}

fn strip_separator(key: &str) -> Option<&str> {
    let first = *key.as_bytes().first()?;
    is_separator(first).then(|| &key[1..])
}

/// Split off the longest prefix free of separators.
fn until_separator(key: &str) -> (&str, &str) {
    match key.find(['.', '_', '-']) {
        Some(pos) => (&key[..pos], &key[pos..]),
        None => (key, ""),
    }
}

/// All candidate (key, remainder) splits at separator positions, shortest
/// key first, ending with the whole string.
fn key_splits(key: &str) -> Vec<(&str, &str)> {
    let mut splits: Vec<(&str, &str)> = key
        .bytes()
        .enumerate()
        .filter(|&(_, byte)| is_separator(byte))
        .map(|(pos, _)| (&key[..pos], &key[pos..]))
        .collect();
    splits.push((key, ""));
    splits
}

/// Case-insensitive comparison treating `-` and `_` as the same character.
fn segment_eq(key_part: &str, name: &str) -> bool {
    key_part.len() == name.len()
        && key_part.bytes().zip(name.bytes()).all(|(a, b)| {
            let a = if a == b'-' { b'_' } else { a };
            let b = if b == b'-' { b'_' } else { b };
            a.eq_ignore_ascii_case(&b)
        })
}

/// Fallback for unmatched keys: a literal dotted path, case preserved.
fn literal_path(key: &str) -> Vec<ResolvedSegment> {
    key.split('.')
        .map(|part| ResolvedSegment::Name(part.to_string()))
        .collect()
}

/// Parse a token value as a YAML scalar (or flow collection), falling back
/// to a plain string.
fn parse_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Write `value` at `path`, creating mappings and sequences on the way.
/// Sequences grow with null padding up to the addressed index.
fn insert(node: &mut Value, path: &[ResolvedSegment], value: Value) {
    let Some((segment, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    match segment {
        ResolvedSegment::Name(name) => {
            if !matches!(node, Value::Mapping(_)) {
                *node = Value::Mapping(Mapping::new());
            }
            if let Value::Mapping(map) = node {
                let key = Value::String(name.clone());
                if !map.contains_key(&key) {
                    map.insert(key.clone(), Value::Null);
                }
                if let Some(child) = map.get_mut(&key) {
                    insert(child, rest, value);
                }
            }
        }
        ResolvedSegment::Index(index) => {
            if !matches!(node, Value::Sequence(_)) {
                *node = Value::Sequence(Vec::new());
            }
            if let Value::Sequence(seq) = node {
                // Unaddressed indices are padded so the addressed one lands
                // in place: empty mappings when elements hold nested fields
                // (they decode as defaulted structs and merge as no-ops),
                // nulls for directly assigned scalars.
                let padding = if rest.is_empty() {
                    Value::Null
                } else {
                    Value::Mapping(Mapping::new())
                };
                while seq.len() <= *index {
                    seq.push(padding.clone());
                }
                insert(&mut seq[*index], rest, value);
            }
        }
    }
}

/// The transient stream handed to the decoder: either the synthesized YAML
/// bytes, or a deferred construction failure surfaced on the first read so
/// failed construction flows through the same read pipeline as a normal
/// stream.
pub struct DocumentStream {
    state: StreamState,
}

enum StreamState {
    Ready(Cursor<Vec<u8>>),
    Failed(Option<YamlfigError>),
}

impl DocumentStream {
    pub(crate) fn ready(bytes: Vec<u8>) -> Self {
        Self {
            state: StreamState::Ready(Cursor::new(bytes)),
        }
    }

    pub(crate) fn failed(error: YamlfigError) -> Self {
        Self {
            state: StreamState::Failed(Some(error)),
        }
    }
}

impl Read for DocumentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.state {
            StreamState::Ready(cursor) => cursor.read(buf),
            StreamState::Failed(error) => match error.take() {
                Some(error) => Err(io::Error::other(error)),
                None => Ok(0),
            },
        }
    }
}
