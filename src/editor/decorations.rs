//! Decoration storage and anchor tracking.
//!
//! Decorations are kept as char-offset ranges so they can be moved through
//! edits without consulting the document. The owning document converts them
//! to [`Range`]s on the way out.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::position::Range;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Identifier assigned to a decoration by the document that owns it.
///
/// Ids have the form `"<owner>;<seq>"` and are never reused, so an id handed
/// out by one document never resolves in another one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecorationId(String);

impl DecorationId {
    fn new(owner: u64, seq: u64) -> Self {
        Self(format!("{owner};{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> Option<(u64, u64)> {
        let (owner, seq) = self.0.split_once(';')?;
        Some((owner.parse().ok()?, seq.parse().ok()?))
    }
}

impl From<&str> for DecorationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for DecorationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a decoration's edges react to text typed exactly at them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackedRangeStickiness {
    #[default]
    AlwaysGrowsWhenTypingAtEdges,
    NeverGrowsWhenTypingAtEdges,
    GrowsOnlyWhenTypingBefore,
    GrowsOnlyWhenTypingAfter,
}

impl TrackedRangeStickiness {
    const fn start_grows(self) -> bool {
        matches!(
            self,
            Self::AlwaysGrowsWhenTypingAtEdges | Self::GrowsOnlyWhenTypingBefore
        )
    }

    const fn end_grows(self) -> bool {
        matches!(
            self,
            Self::AlwaysGrowsWhenTypingAtEdges | Self::GrowsOnlyWhenTypingAfter
        )
    }
}

/// Rendering options attached to a decoration.
///
/// The store never interprets these beyond `stickiness`; they are carried
/// for whatever view renders the decoration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecorationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_message: Option<String>,
    pub is_whole_line: bool,
    pub stickiness: TrackedRangeStickiness,
}

impl DecorationOptions {
    /// Options with just a CSS-style class name.
    pub fn with_class(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }
}

/// A decoration to install: a range and its rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorDecoration {
    pub range: Range,
    #[serde(default)]
    pub options: DecorationOptions,
}

impl EditorDecoration {
    pub const fn new(range: Range, options: DecorationOptions) -> Self {
        Self { range, options }
    }
}

/// An installed decoration as reported by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoration {
    pub id: DecorationId,
    pub range: Range,
    pub options: DecorationOptions,
}

/// A single text replacement expressed in char offsets of the pre-edit text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetEdit {
    /// First replaced char.
    pub start: usize,
    /// One past the last replaced char.
    pub old_end: usize,
    /// Number of chars inserted at `start`.
    pub inserted: usize,
}

impl OffsetEdit {
    /// Map the start edge of a tracked range through this edit.
    pub const fn map_start(&self, offset: usize, grows: bool) -> usize {
        self.map(offset, grows)
    }

    /// Map the end edge of a tracked range through this edit.
    pub const fn map_end(&self, offset: usize, grows: bool) -> usize {
        self.map(offset, !grows)
    }

    /// An offset strictly inside the replaced text collapses onto the
    /// insertion point and then behaves like an edge typed at.
    const fn map(&self, offset: usize, insert_stays: bool) -> usize {
        if offset < self.start {
            offset
        } else if self.start == self.old_end {
            if offset > self.start || !insert_stays {
                offset + self.inserted
            } else {
                offset
            }
        } else if offset >= self.old_end {
            offset - self.old_end + self.start + self.inserted
        } else if offset == self.start || insert_stays {
            self.start
        } else {
            self.start + self.inserted
        }
    }
}

#[derive(Debug, Clone)]
struct Tracked {
    start: usize,
    end: usize,
    options: DecorationOptions,
}

/// Decorations belonging to one document, keyed by creation sequence.
#[derive(Debug)]
pub struct DecorationStore {
    owner: u64,
    next_seq: u64,
    entries: BTreeMap<u64, Tracked>,
}

impl DecorationStore {
    pub fn new() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            next_seq: 1,
            entries: BTreeMap::new(),
        }
    }

    /// Number of installed decorations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every decoration named in `old`, then install `new`.
    ///
    /// Unknown ids are ignored. Returned ids follow the order of `new`.
    pub fn delta(
        &mut self,
        old: &[DecorationId],
        new: Vec<(usize, usize, DecorationOptions)>,
    ) -> Vec<DecorationId> {
        let removed = old.iter().filter(|id| self.remove(id)).count();
        let ids: Vec<DecorationId> = new
            .into_iter()
            .map(|(start, end, options)| {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries.insert(seq, Tracked { start, end, options });
                DecorationId::new(self.owner, seq)
            })
            .collect();
        tracing::debug!(
            owner = self.owner,
            removed,
            added = ids.len(),
            total = self.entries.len(),
            "delta decorations"
        );
        ids
    }

    /// Remove a single decoration, returning whether it existed.
    pub fn remove(&mut self, id: &DecorationId) -> bool {
        self.seq_of(id)
            .is_some_and(|seq| self.entries.remove(&seq).is_some())
    }

    /// Current char offsets of a decoration.
    pub fn offsets_of(&self, id: &DecorationId) -> Option<(usize, usize)> {
        let entry = self.entries.get(&self.seq_of(id)?)?;
        Some((entry.start, entry.end))
    }

    /// All decorations ordered by start, then end, then creation.
    pub fn iter(&self) -> impl Iterator<Item = (DecorationId, usize, usize, &DecorationOptions)> {
        let mut sorted: Vec<(&u64, &Tracked)> = self.entries.iter().collect();
        sorted.sort_by_key(|(seq, t)| (t.start, t.end, **seq));
        sorted
            .into_iter()
            .map(|(seq, t)| (DecorationId::new(self.owner, *seq), t.start, t.end, &t.options))
    }

    /// Drop every decoration. Ids already handed out stay invalid.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Move every decoration through an edit.
    pub fn apply_edit(&mut self, edit: OffsetEdit) {
        for tracked in self.entries.values_mut() {
            let stickiness = tracked.options.stickiness;
            let start = edit.map_start(tracked.start, stickiness.start_grows());
            let end = edit.map_end(tracked.end, stickiness.end_grows());
            tracked.start = start.min(end);
            tracked.end = end;
        }
    }

    /// Pass both edges of every decoration through `align`.
    ///
    /// `align` must be monotonic so ranges keep their order.
    pub fn realign(&mut self, align: impl Fn(usize) -> usize) {
        for tracked in self.entries.values_mut() {
            tracked.start = align(tracked.start);
            tracked.end = align(tracked.end).max(tracked.start);
        }
    }

    fn seq_of(&self, id: &DecorationId) -> Option<u64> {
        let (owner, seq) = id.parts()?;
        (owner == self.owner).then_some(seq)
    }
}

impl Default for DecorationStore {
    fn default() -> Self {
        Self::new()
    }
}
