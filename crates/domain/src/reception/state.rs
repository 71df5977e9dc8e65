//! Reception state machine of a single pickup point.

use common::Reception;
use serde::Serialize;

/// Whether a pickup point is currently accepting parcels.
///
/// State transitions:
/// ```text
///                    open
/// NoOpenReception ─────────► Open(reception) ──┐ add / remove parcel
///        ▲                        │  ◄─────────┘
///        └────────────────────────┘
///                    close
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "reception", rename_all = "snake_case")]
pub enum ReceptionState {
    /// No reception is in progress; one may be opened.
    #[default]
    NoOpenReception,

    /// A reception is in progress and accepts parcels.
    Open(Reception),
}

impl ReceptionState {
    pub fn from_open(reception: Option<Reception>) -> Self {
        match reception {
            Some(reception) => ReceptionState::Open(reception),
            None => ReceptionState::NoOpenReception,
        }
    }

    /// The reception in progress, if any.
    pub fn open_reception(&self) -> Option<&Reception> {
        match self {
            ReceptionState::Open(reception) => Some(reception),
            ReceptionState::NoOpenReception => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptionState::NoOpenReception => "no_open_reception",
            ReceptionState::Open(_) => "open",
        }
    }
}

impl std::fmt::Display for ReceptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
