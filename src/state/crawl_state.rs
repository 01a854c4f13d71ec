/// Crawl engine state definitions
///
/// An engine starts `Idle`, moves to `Running` when a crawl begins, ends in
/// one of three terminal states, and returns to `Idle` once the run has been
/// reported.
use std::fmt;

/// Represents the lifecycle state of a crawl engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// No active frontier
    Idle,

    /// Frontier non-empty and page budget remaining
    Running,

    // ===== Terminal States =====
    /// Frontier emptied with budget left
    Exhausted,

    /// Cumulative page ceiling reached; remaining frontier discarded
    BudgetReached,

    /// Cancellation flag observed between two URLs
    Cancelled,
}

impl CrawlState {
    /// Returns true if this state ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::BudgetReached | Self::Cancelled)
    }

    /// Returns true if the run ended on its own (not cancelled)
    pub fn is_normal_completion(&self) -> bool {
        matches!(self, Self::Exhausted | Self::BudgetReached)
    }

    /// Checks whether moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        match self {
            Self::Idle => next == Self::Running,
            Self::Running => next.is_terminal(),
            Self::Exhausted | Self::BudgetReached | Self::Cancelled => next == Self::Idle,
        }
    }

    /// Converts the state to the string stored with each run in the ledger
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Exhausted => "exhausted",
            Self::BudgetReached => "budget_reached",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a state from its database string
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "running" => Some(Self::Running),
            "exhausted" => Some(Self::Exhausted),
            "budget_reached" => Some(Self::BudgetReached),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns all possible crawl states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Running,
            Self::Exhausted,
            Self::BudgetReached,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
