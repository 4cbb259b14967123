//! Task identifiers.
//!
//! A [`TaskId`] is one or more dot-separated [`IdSegment`]s. Top-level tasks
//! carry a single segment and subtasks are qualified by their parent, so
//! subtask `2` of task `7` is `7.2`.

use crate::IdParseError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// One component of a task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdSegment {
    /// A numeric segment, compared numerically.
    Num(u64),
    /// A named segment, compared lexicographically.
    Name(String),
}

impl Ord for IdSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Num(a), Self::Num(b)) => a.cmp(b),
            (Self::Num(_), Self::Name(_)) => Ordering::Less,
            (Self::Name(_), Self::Num(_)) => Ordering::Greater,
            (Self::Name(a), Self::Name(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for IdSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IdSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for IdSegment {
    fn from(value: u64) -> Self {
        Self::Num(value)
    }
}

impl IdSegment {
    fn parse_within(segment: &str, input: &str) -> Result<Self, IdParseError> {
        if segment.is_empty() {
            return Err(IdParseError::EmptySegment {
                input: input.to_string(),
            });
        }
        if let Some(found) = segment
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(IdParseError::InvalidCharacter {
                input: input.to_string(),
                found,
            });
        }
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            return segment
                .parse::<u64>()
                .map(Self::Num)
                .map_err(|_| IdParseError::OutOfRange {
                    input: input.to_string(),
                });
        }
        Ok(Self::Name(segment.to_string()))
    }
}

impl FromStr for IdSegment {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdParseError::Empty);
        }
        if s.contains('.') {
            return Err(IdParseError::InvalidCharacter {
                input: s.to_string(),
                found: '.',
            });
        }
        Self::parse_within(s, s)
    }
}

/// A fully-qualified task or subtask identifier.
///
/// Ordering is segment-wise: numbers before names, numbers numerically, and a
/// parent before its subtasks (`1 < 1.2 < 2 < 10 < api`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    root: IdSegment,
    path: Vec<IdSegment>,
}

impl TaskId {
    /// Create a top-level identifier.
    #[must_use]
    pub const fn new(root: IdSegment) -> Self {
        Self {
            root,
            path: Vec::new(),
        }
    }

    /// Qualify a subtask segment under this identifier.
    #[must_use]
    pub fn child(&self, segment: IdSegment) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        Self {
            root: self.root.clone(),
            path,
        }
    }

    /// The identifier one level up, or `None` for a top-level id.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.path.split_last()?;
        Some(Self {
            root: self.root.clone(),
            path: rest.to_vec(),
        })
    }

    /// Whether this identifier names a top-level task.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.path.is_empty()
    }

    /// The first segment.
    #[must_use]
    pub const fn root(&self) -> &IdSegment {
        &self.root
    }

    /// The last segment (the root for top-level ids).
    #[must_use]
    pub fn local(&self) -> &IdSegment {
        self.path.last().unwrap_or(&self.root)
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len() + 1
    }

    /// Iterate over all segments.
    pub fn segments(&self) -> impl Iterator<Item = &IdSegment> {
        std::iter::once(&self.root).chain(self.path.iter())
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self::new(IdSegment::Num(value))
    }
}

impl From<IdSegment> for TaskId {
    fn from(segment: IdSegment) -> Self {
        Self::new(segment)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for segment in &self.path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for TaskId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdParseError::Empty);
        }
        let mut parts = trimmed.split('.');
        let root = IdSegment::parse_within(parts.next().unwrap_or_default(), trimmed)?;
        let path = parts
            .map(|part| IdSegment::parse_within(part, trimmed))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { root, path })
    }
}

// Single numeric segments are written as JSON integers, everything else as
// strings, so `tasks.json` files keep their familiar shape.

impl Serialize for IdSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Num(n) => serializer.serialize_u64(*n),
            Self::Name(name) => serializer.serialize_str(name),
        }
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (&self.root, self.path.is_empty()) {
            (IdSegment::Num(n), true) => serializer.serialize_u64(*n),
            _ => serializer.collect_str(self),
        }
    }
}

struct IdVisitor<T>(std::marker::PhantomData<T>);

impl<T> Visitor<'_> for IdVisitor<T>
where
    T: FromStr<Err = IdParseError> + From<u64>,
{
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or an id string")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<T, E> {
        Ok(T::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<T, E> {
        u64::try_from(value)
            .map(T::from)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<T, E> {
        value.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for IdSegment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor(std::marker::PhantomData))
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor(std::marker::PhantomData))
    }
}
