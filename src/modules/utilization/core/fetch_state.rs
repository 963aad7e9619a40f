// Per-key fetch lifecycle, exposed instead of polling.
//
// Idle -> Fetching -> Succeeded | Failed. Succeeded and Failed are idle states that
// remember the last outcome; a new fetch moves the key back to Fetching.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchState {
    #[default]
    Idle,
    Fetching {
        since: i64,
    },
    Succeeded {
        at: i64,
    },
    Failed {
        at: i64,
        error: String,
    },
}

impl FetchState {
    pub fn is_fetching(&self) -> bool {
        matches!(self, FetchState::Fetching { .. })
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            FetchState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}
