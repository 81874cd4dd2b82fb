//! King-of-the-beach session detection.
//!
//! Doubles games flow through the [`segmenter`], which groups games played close
//! together into candidates and hands each one to the [`validator`]. Accepted
//! candidates become numbered [`ValidatedSession`]s.

/// Games and pairings.
pub mod game;
/// Per-pairing tallies of a candidate.
pub mod ledger;
pub mod segmenter;
/// Player records for a session.
pub mod standings;
pub mod validator;

pub use game::{DoublesGame, Pairing};
pub use ledger::{PairingLedger, PairingTally};
pub use segmenter::{
    DEFAULT_MAX_GAP, Evaluation, Outcome, ValidatedSession, discover_sessions, evaluate,
    sessions_from,
};
pub use standings::{PlayerStanding, standings};
pub use validator::{
    InvalidInputError, ROSTER_SIZE, Rejection, RoundRobin, RoundRobinPattern, Verdict, validate,
};
