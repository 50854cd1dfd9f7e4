//! Fragment store and reorder engine.
//!
//! A turn's fragments form an ordered sequence; the order is the artifact the
//! player submits. Anchored fragments keep their index for the whole turn: a
//! move is only accepted when the moved fragment is free and no anchored
//! fragment sits between the source and destination (inclusive), so nothing
//! anchored is ever shifted as a side effect.

use fragments_core::oracle::ProposedFragment;
use serde::{Deserialize, Serialize};

fn default_mutable() -> bool {
    true
}

/// One reorderable unit of narrative text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// The text shown to the player.
    pub text: String,
    /// `false` for anchored fragments.
    #[serde(default = "default_mutable")]
    pub mutable: bool,
}

impl Fragment {
    /// A fragment the player may move.
    #[must_use]
    pub fn free(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mutable: true,
        }
    }

    /// A fragment pinned to its position for the current turn.
    #[must_use]
    pub fn anchored(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mutable: false,
        }
    }

    /// Returns `true` if the fragment cannot be moved.
    #[must_use]
    pub fn is_anchored(&self) -> bool {
        !self.mutable
    }
}

/// Converts oracle-proposed fragments into the next turn's sequence.
///
/// When the oracle omits every anchor designation, the fragment at index 0
/// becomes the single anchor. Otherwise an omitted designation means free.
#[must_use]
pub fn fragments_from_proposed(proposed: &[ProposedFragment]) -> Vec<Fragment> {
    let designated = proposed.iter().any(|p| p.anchored.is_some());
    proposed
        .iter()
        .enumerate()
        .map(|(index, p)| {
            let anchored = if designated {
                p.anchored.unwrap_or(false)
            } else {
                index == 0
            };
            Fragment {
                text: p.text.clone(),
                mutable: !anchored,
            }
        })
        .collect()
}

/// The current turn's fragments, the snapshot taken when the turn began, and
/// the in-progress drag, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentStore {
    current: Vec<Fragment>,
    round_start: Vec<Fragment>,
    dragging: Option<usize>,
}

impl FragmentStore {
    /// Creates a store whose round-start snapshot equals `fragments`.
    #[must_use]
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self {
            round_start: fragments.clone(),
            current: fragments,
            dragging: None,
        }
    }

    /// The fragments in their current order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.current
    }

    /// The order captured when the turn began.
    #[must_use]
    pub fn round_start(&self) -> &[Fragment] {
        &self.round_start
    }

    /// Fragment texts in their current order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.current.iter().map(|f| f.text.clone()).collect()
    }

    /// Index of the fragment being dragged.
    #[must_use]
    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Returns `true` if the current order differs from the round-start
    /// snapshot. Reset-to-round-start is only meaningful when this holds.
    #[must_use]
    pub fn is_order_changed(&self) -> bool {
        self.current != self.round_start
    }

    /// Returns `true` if moving `from` to `to` would be accepted.
    #[must_use]
    pub fn can_move(&self, from: usize, to: usize) -> bool {
        let len = self.current.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        let (lo, hi) = if from < to { (from, to) } else { (to, from) };
        self.current[lo..=hi].iter().all(|f| f.mutable)
    }

    /// Moves the fragment at `from` to `to`, shifting the fragments between
    /// them. Rejected moves leave the sequence untouched.
    ///
    /// Returns `true` if the sequence changed.
    pub fn move_fragment(&mut self, from: usize, to: usize) -> bool {
        if !self.can_move(from, to) {
            return false;
        }
        let fragment = self.current.remove(from);
        self.current.insert(to, fragment);
        true
    }

    /// Restores the round-start order and drops any drag in progress.
    pub fn reset_to_round_start(&mut self) {
        self.current.clone_from(&self.round_start);
        self.dragging = None;
    }

    /// Starts dragging the fragment at `index`. Anchored or out-of-range
    /// fragments cannot be picked up.
    ///
    /// Returns `true` if the drag started.
    pub fn begin_move(&mut self, index: usize) -> bool {
        match self.current.get(index) {
            Some(fragment) if fragment.mutable => {
                self.dragging = Some(index);
                true
            }
            _ => false,
        }
    }

    /// Moves the dragged fragment over `target`. The drag follows the
    /// fragment to its new index.
    ///
    /// Returns `true` if the sequence changed.
    pub fn propose_move(&mut self, target: usize) -> bool {
        let Some(from) = self.dragging else {
            return false;
        };
        if !self.move_fragment(from, target) {
            return false;
        }
        self.dragging = Some(target);
        true
    }

    /// Ends the current drag, keeping whatever order it produced.
    pub fn commit_move(&mut self) {
        self.dragging = None;
    }
}
