//! Path addressing for documents in the store.
//!
//! A location inside a JSON document is an ordered list of [`Segment`]s.
//! On the wire every path travels in canonical bracket form: each segment is
//! wrapped in brackets, property names quoted and array indices bare, so
//! `["a", "b", 0]` becomes `['a']['b'][0]`. The document root is `.`.
//!
//! [`normalize`] is deliberately lenient: it never fails, it passes text that
//! is already in bracket form through untouched, and it stops at the first
//! empty segment of dotted text or a segment list (`"a..b"` addresses
//! `['a']`). Bracket text is taken literally: `['7']` stays a property name
//! and `['']` stays an empty one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Canonical text of the document root.
pub const ROOT: &str = ".";

/// One step of a [`Path`]: a property name or an array index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Index(u64),
    Name(String),
}

impl Segment {
    /// An empty property name. Empty segments terminate a path.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Name(name) if name.is_empty())
    }

    /// Resolve a numeric property name to the array index it denotes.
    fn canonicalize(self) -> Self {
        match self {
            Self::Name(name) => match parse_index(&name) {
                Some(index) => Self::Index(index),
                None => Self::Name(name),
            },
            index => index,
        }
    }

    fn write_bracketed(&self, out: &mut String) {
        match self {
            Self::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
            Self::Name(name) => {
                out.push_str("['");
                out.push_str(name);
                out.push_str("']");
            }
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Segment {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<u64> for Segment {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

/// A digit-only string that fits a `u64`.
fn parse_index(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// A path as supplied by a caller: dotted text or an explicit segment list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathInput {
    Text(String),
    Segments(Vec<Segment>),
}

impl PathInput {
    /// The document root.
    pub fn root() -> Self {
        Self::Segments(Vec::new())
    }
}

impl Default for PathInput {
    fn default() -> Self {
        Self::root()
    }
}

impl From<&str> for PathInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PathInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for PathInput {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<Vec<Segment>> for PathInput {
    fn from(segments: Vec<Segment>) -> Self {
        Self::Segments(segments)
    }
}

impl From<&[Segment]> for PathInput {
    fn from(segments: &[Segment]) -> Self {
        Self::Segments(segments.to_vec())
    }
}

impl From<Path> for PathInput {
    fn from(path: Path) -> Self {
        Self::Segments(path.segments)
    }
}

impl From<&Path> for PathInput {
    fn from(path: &Path) -> Self {
        Self::Segments(path.segments.clone())
    }
}

impl From<CanonicalPath> for PathInput {
    fn from(path: CanonicalPath) -> Self {
        Self::Text(path.0)
    }
}

impl From<&CanonicalPath> for PathInput {
    fn from(path: &CanonicalPath) -> Self {
        Self::Text(path.0.clone())
    }
}

/// A path in the store's canonical bracket syntax.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CanonicalPath> for String {
    fn from(path: CanonicalPath) -> Self {
        path.0
    }
}

/// Text made of one or more `[...]` groups is already canonical.
fn is_bracketed(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']')
}

fn render<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> CanonicalPath {
    let mut out = String::new();
    for segment in segments {
        segment.write_bracketed(&mut out);
    }
    if out.is_empty() {
        CanonicalPath::root()
    } else {
        CanonicalPath(out)
    }
}

/// Convert a caller-supplied path into canonical bracket form.
///
/// # Examples
///
/// ```
/// use jsonkv_types::path::{normalize, Segment};
///
/// assert_eq!(normalize("a.b.0").as_str(), "['a']['b'][0]");
/// assert_eq!(normalize(vec![Segment::from("a"), Segment::from(3u64)]).as_str(), "['a'][3]");
/// assert_eq!(normalize("['x'][1]").as_str(), "['x'][1]");
/// assert_eq!(normalize("").as_str(), ".");
/// ```
pub fn normalize(input: impl Into<PathInput>) -> CanonicalPath {
    match input.into() {
        PathInput::Text(text) if is_bracketed(&text) => CanonicalPath(text),
        PathInput::Text(text) => Path::new(text.split('.').map(Segment::from)).to_canonical(),
        PathInput::Segments(segments) => Path::new(segments).to_canonical(),
    }
}

/// An immutable, ordered list of segments addressing a location in a document.
///
/// Construction from dotted text or a segment list applies the same rules as
/// [`normalize`]: the list is cut at the first empty name and digit-only
/// names become indices. Bracket text is parsed literally. Either way a
/// `Path` renders to exactly what `normalize` produces for the same input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: impl IntoIterator<Item = Segment>) -> Self {
        let segments = segments
            .into_iter()
            .take_while(|s| !s.is_empty())
            .map(Segment::canonicalize)
            .collect();
        Self { segments }
    }

    /// Resolve a caller-supplied path into segments.
    ///
    /// Fails only when the input is bracket text that cannot be parsed.
    pub fn from_input(input: impl Into<PathInput>) -> TypeResult<Self> {
        match input.into() {
            PathInput::Text(text) if is_bracketed(&text) => Self::parse_canonical(&text),
            PathInput::Text(text) => Ok(Self::new(text.split('.').map(Segment::from))),
            PathInput::Segments(segments) => Ok(Self::new(segments)),
        }
    }

    /// Parse a path as the store receives it.
    ///
    /// Accepts the root sentinels `.` and `$` (and the empty string), bracket
    /// form with single- or double-quoted names, and dotted text with an
    /// optional leading `.`.
    pub fn parse_canonical(text: &str) -> TypeResult<Self> {
        let text = text.trim();
        if text.is_empty() || text == ROOT || text == "$" {
            return Ok(Self::root());
        }
        if text.starts_with('[') {
            return parse_brackets(text).map(|segments| Self { segments });
        }
        let dotted = text.strip_prefix('.').unwrap_or(text);
        Ok(Self::new(dotted.split('.').map(Segment::from)))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// The first `len` segments, taken as they are.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Split off the last segment. `None` at the root.
    pub fn split_last(&self) -> Option<(Self, &Segment)> {
        let (last, rest) = self.segments.split_last()?;
        Some((
            Self {
                segments: rest.to_vec(),
            },
            last,
        ))
    }

    pub fn to_canonical(&self) -> CanonicalPath {
        render(&self.segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_canonical().as_str())
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self::new(iter)
    }
}

fn parse_brackets(text: &str) -> TypeResult<Vec<Segment>> {
    let invalid = |reason: String| TypeError::InvalidPath {
        path: text.to_string(),
        reason,
    };

    let mut segments = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return Err(invalid(format!(
                "expected '[' at offset {}",
                text.len() - rest.len()
            )));
        };
        match inner.chars().next() {
            Some(quote @ ('\'' | '"')) => {
                let body = &inner[1..];
                let close = format!("{quote}]");
                let end = body
                    .find(&close)
                    .ok_or_else(|| invalid("unterminated quoted segment".into()))?;
                segments.push(Segment::Name(body[..end].to_string()));
                rest = &body[end + close.len()..];
            }
            _ => {
                let end = inner
                    .find(']')
                    .ok_or_else(|| invalid("unterminated index segment".into()))?;
                let raw = inner[..end].trim();
                let index = parse_index(raw)
                    .ok_or_else(|| invalid(format!("not an array index: {raw:?}")))?;
                segments.push(Segment::Index(index));
                rest = &inner[end + 1..];
            }
        }
    }
    Ok(segments)
}
