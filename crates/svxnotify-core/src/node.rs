//! Repeater node records from the SVX reflector status feed.
//!
//! The feed is loosely typed, so every record goes through [`Node::from_json`]
//! which checks the fields one at a time and stops at the first violation.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{NodeError, NodeErrorKind};

/// Talk group identifier as reported by the reflector.
///
/// Held as `i64`. Reflector talk groups are small positive numbers; a record
/// carrying an integer above `i64::MAX` is rejected as the wrong type rather
/// than silently wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TalkGroup(pub i64);

impl fmt::Display for TalkGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of one node for a single poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub name: String,
    pub location: String,
    pub monitoring_talkgroups: Vec<TalkGroup>,
    pub is_talking: bool,
    /// `None` when the feed reports talk group 0.
    pub talk_group: Option<TalkGroup>,
    pub talkgroup_tones: BTreeMap<TalkGroup, String>,
}

impl Node {
    /// Validate a raw feed record and build a `Node` from it.
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] naming the node and the first field that is
    /// missing or has the wrong type.
    pub fn from_json(name: &str, raw: &Value) -> Result<Self, NodeError> {
        let fail = |kind| NodeError::new(name, kind);
        let obj = raw.as_object().ok_or_else(|| fail(NodeErrorKind::NotAnObject))?;

        let location = obj
            .get("nodeLocation")
            .or_else(|| obj.get("NodeLocation"))
            .ok_or_else(|| fail(NodeErrorKind::MissingField("nodeLocation")))?
            .as_str()
            .ok_or_else(|| fail(wrong_type("nodeLocation", "a string")))?
            .to_string();

        let monitoring_talkgroups = required(obj, "monitoredTGs")
            .map_err(fail)?
            .as_array()
            .ok_or_else(|| fail(wrong_type("monitoredTGs", "a list of integers")))?
            .iter()
            .map(|tg| tg.as_i64().map(TalkGroup))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| fail(wrong_type("monitoredTGs", "a list of integers")))?;

        let is_talking = required(obj, "isTalker")
            .map_err(fail)?
            .as_bool()
            .ok_or_else(|| fail(wrong_type("isTalker", "a boolean")))?;

        let talk_group = match required(obj, "tg").map_err(fail)?.as_i64() {
            Some(0) => None,
            Some(tg) => Some(TalkGroup(tg)),
            None => return Err(fail(wrong_type("tg", "an integer"))),
        };

        let mut talkgroup_tones = BTreeMap::new();
        if let Some(tones) = obj.get("toneToTalkgroup") {
            let tones = tones
                .as_object()
                .ok_or_else(|| fail(wrong_type("toneToTalkgroup", "a mapping")))?;
            for (freq, tg) in tones {
                let tg = tg
                    .as_i64()
                    .ok_or_else(|| fail(wrong_type("toneToTalkgroup", "a mapping of integers")))?;
                talkgroup_tones.insert(TalkGroup(tg), freq.clone());
            }
        }

        Ok(Self {
            name: name.to_string(),
            location,
            monitoring_talkgroups,
            is_talking,
            talk_group,
            talkgroup_tones,
        })
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.location)?;
        match self.talk_group {
            Some(tg) if self.is_talking => write!(f, " talking on TG {tg}"),
            Some(tg) => write!(f, " on TG {tg}"),
            None if self.is_talking => write!(f, " talking"),
            None => write!(f, " idle"),
        }
    }
}

fn required<'a>(obj: &'a Map<String, Value>, key: &'static str) -> Result<&'a Value, NodeErrorKind> {
    obj.get(key).ok_or(NodeErrorKind::MissingField(key))
}

fn wrong_type(field: &'static str, expected: &'static str) -> NodeErrorKind {
    NodeErrorKind::WrongType { field, expected }
}
