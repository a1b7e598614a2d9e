/// Paginator state definitions
///
/// This module defines the states a site's pagination loop moves through and
/// the transitions allowed between them.
use std::fmt;

/// Represents the current state of one site's pagination loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginatorState {
    // ===== Active States =====
    /// Loop created, nothing fetched yet
    Idle,

    /// A page fetch is outstanding
    Fetching,

    /// A loaded page is being turned into records and merged
    Extracting,

    /// Stop conditions are being evaluated
    Deciding,

    // ===== Terminal States =====
    /// Loop stopped normally (possibly with partial data)
    Done,

    /// No page could be fetched; nothing usable came from this site
    Failed,
}

impl PaginatorState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the loop is still running
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// # Transition Table
    ///
    /// | From       | To                              |
    /// |------------|---------------------------------|
    /// | Idle       | Fetching                        |
    /// | Fetching   | Extracting, Deciding, Failed    |
    /// | Extracting | Deciding                        |
    /// | Deciding   | Fetching, Done                  |
    ///
    /// `Fetching -> Deciding` is taken when a fetch fails after earlier pages
    /// already produced data; `Fetching -> Failed` when nothing was fetched.
    pub fn can_transition_to(&self, next: PaginatorState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Fetching)
                | (Self::Fetching, Self::Extracting)
                | (Self::Fetching, Self::Deciding)
                | (Self::Fetching, Self::Failed)
                | (Self::Extracting, Self::Deciding)
                | (Self::Deciding, Self::Fetching)
                | (Self::Deciding, Self::Done)
        )
    }

    /// Lowercase name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Deciding => "deciding",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Fetching,
            Self::Extracting,
            Self::Deciding,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PaginatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
