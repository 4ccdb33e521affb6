/// Pagination walk state definitions
///
/// The walker moves through these states for every listing page it visits.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a pagination walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalkState {
    // ===== Active States =====
    /// Walk created, entry page not yet requested
    Init,

    /// A listing page is being fetched
    FetchingPage,

    /// Detail links are being classified from the fetched page
    ExtractingLinks,

    /// Looking for the next page control
    Advancing,

    // ===== Terminal States =====
    /// No further pages, a cycle, or the page bound was reached
    Done,

    /// A fetch failed or the page lacked its required structure
    Aborted,
}

impl WalkState {
    /// Returns true if the walk has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Returns true if the walk ended early
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::FetchingPage => "fetching-page",
            Self::ExtractingLinks => "extracting-links",
            Self::Advancing => "advancing",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }

    /// Checks whether the walk may move from this state to `next`
    ///
    /// Any non-terminal state may abort.
    pub fn can_transition_to(&self, next: WalkState) -> bool {
        use WalkState::*;
        match (self, next) {
            (Done | Aborted, _) => false,
            (_, Aborted) => true,
            (Init, FetchingPage) => true,
            (FetchingPage, ExtractingLinks) => true,
            // The page bound is checked before a fetch is issued
            (FetchingPage, Done) => true,
            (ExtractingLinks, Advancing) => true,
            (Advancing, FetchingPage) => true,
            (Advancing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WalkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
