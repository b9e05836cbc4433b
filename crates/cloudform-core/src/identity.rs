//! Composite resource identities
//!
//! An identity is an ordered, non-empty list of segments joined with
//! [`DELIMITER`], e.g. `"42:7"` for an instance config `7` on instance `42`.
//! Identities are positional, so decoding always needs the layout the
//! resource kind expects.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between identity segments
pub const DELIMITER: char = ':';

/// A single identity segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Int(i64),
    Str(String),
}

impl Segment {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Int(_) => SegmentKind::Int,
            Segment::Str(_) => SegmentKind::Str,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Segment::Int(v) => Some(*v),
            Segment::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Segment::Str(s) => Some(s),
            Segment::Int(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Int(v) => write!(f, "{}", v),
            Segment::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Segment {
    fn from(value: i64) -> Self {
        Segment::Int(value)
    }
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        Segment::Str(value.to_string())
    }
}

impl From<String> for Segment {
    fn from(value: String) -> Self {
        Segment::Str(value)
    }
}

/// Expected type of a segment at a given position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Int,
    Str,
}

/// Join segments into an identity string.
///
/// Fails with a validation error for an empty list or a string segment
/// containing the delimiter.
pub fn encode(segments: &[Segment]) -> Result<String> {
    if segments.is_empty() {
        return Err(CloudError::validation(
            "id",
            "an identity needs at least one segment",
        ));
    }

    let mut parts = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        if let Segment::Str(s) = segment
            && s.contains(DELIMITER)
        {
            return Err(CloudError::validation(
                format!("id[{}]", index),
                format!("segment {:?} must not contain '{}'", s, DELIMITER),
            ));
        }
        parts.push(segment.to_string());
    }

    Ok(parts.join(&DELIMITER.to_string()))
}

/// Split an identity string according to `layout`.
pub fn decode(raw: &str, layout: &[SegmentKind]) -> Result<Vec<Segment>> {
    let parts: Vec<&str> = raw.split(DELIMITER).collect();
    if layout.is_empty() || parts.len() != layout.len() {
        return Err(CloudError::structural(
            raw,
            format!(
                "segment count mismatch: expected {}, got {}",
                layout.len(),
                parts.len()
            ),
        ));
    }

    parts
        .into_iter()
        .zip(layout)
        .map(|(part, kind)| match kind {
            SegmentKind::Int => part.parse::<i64>().map(Segment::Int).map_err(|_| {
                CloudError::structural(raw, format!("non-numeric segment {:?}", part))
            }),
            SegmentKind::Str => Ok(Segment::Str(part.to_string())),
        })
        .collect()
}

/// Decode an identity made only of integer segments.
pub fn decode_ints(raw: &str, expected: usize) -> Result<Vec<i64>> {
    let layout = vec![SegmentKind::Int; expected];
    Ok(decode(raw, &layout)?
        .into_iter()
        .filter_map(|s| s.as_int())
        .collect())
}

/// A decoded, validated identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    segments: Vec<Segment>,
}

impl Identity {
    /// Build an identity, checking the same rules as [`encode`]
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        encode(&segments)?;
        Ok(Self { segments })
    }

    pub fn single(segment: impl Into<Segment>) -> Result<Self> {
        Self::new(vec![segment.into()])
    }

    pub fn parse(raw: &str, layout: &[SegmentKind]) -> Result<Self> {
        Ok(Self {
            segments: decode(raw, layout)?,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Integer segment at `index`, or a structural error
    pub fn int(&self, index: usize) -> Result<i64> {
        self.segments
            .get(index)
            .and_then(Segment::as_int)
            .ok_or_else(|| {
                CloudError::structural(self.to_string(), format!("segment {} is not numeric", index))
            })
    }

    /// String segment at `index`, or a structural error
    pub fn str(&self, index: usize) -> Result<&str> {
        self.segments
            .get(index)
            .and_then(Segment::as_str)
            .ok_or_else(|| {
                CloudError::structural(self.to_string(), format!("segment {} is not a string", index))
            })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                write!(f, "{}", DELIMITER)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
