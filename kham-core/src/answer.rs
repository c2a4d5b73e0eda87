//! The player's in-progress spelling of the current word.

use serde::{Deserialize, Serialize};

/// What a tile tap did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapAction {
    /// The symbol was appended.
    Selected,
    /// The most recent occurrence of the symbol was removed.
    Deselected,
}

/// Ordered symbol selection for one word.
///
/// Duplicates are allowed so words with repeated letters can be spelled.
/// A tile counts as consumed while at least one occurrence of its symbol
/// remains in the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSession {
    target: String,
    selection: Vec<char>,
}

impl AnswerSession {
    /// Start an empty session for a target word.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            selection: Vec::new(),
        }
    }

    /// The word being spelled.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Selected symbols in order.
    #[must_use]
    pub fn selection(&self) -> &[char] {
        &self.selection
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    /// Append a symbol.
    pub fn select(&mut self, symbol: char) {
        self.selection.push(symbol);
    }

    /// Remove the most recent occurrence of a symbol. Returns whether one was found.
    pub fn toggle_off_last_occurrence(&mut self, symbol: char) -> bool {
        match self.selection.iter().rposition(|&c| c == symbol) {
            Some(pos) => {
                self.selection.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Pop the most recent symbol.
    pub fn delete_last(&mut self) -> Option<char> {
        self.selection.pop()
    }

    /// Tile-tap dispatch.
    ///
    /// A tap on a consumed tile deselects it, removing the most recent
    /// occurrence of its symbol. Repeated letters are entered with
    /// [`select`](Self::select).
    pub fn tap(&mut self, symbol: char) -> TapAction {
        if self.toggle_off_last_occurrence(symbol) {
            TapAction::Deselected
        } else {
            self.selection.push(symbol);
            TapAction::Selected
        }
    }

    /// Whether a tile is currently consumed.
    #[must_use]
    pub fn is_consumed(&self, symbol: char) -> bool {
        self.selection.contains(&symbol)
    }

    /// The selection joined into a string.
    #[must_use]
    pub fn current_text(&self) -> String {
        self.selection.iter().collect()
    }

    /// Exact, order-sensitive comparison with the target.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.selection.iter().copied().eq(self.target.chars())
    }

    /// Clear the selection.
    pub fn reset(&mut self) {
        self.selection.clear();
    }
}
