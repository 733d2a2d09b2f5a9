//! Answer normalization
//!
//! The model is asked to reply with exactly one of two canonical tokens, but
//! it answers in free-form text. Two readings of that text exist:
//!
//! - [`Verdict::from_model_reply`]: the relay's collapse to a canonical token
//!   before anything leaves the server.
//! - [`detect_hamburger`]: the client's boolean heuristic, which also accepts
//!   bare `BURGER` and treats any `NOT` as a negative.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical token for a positive answer
pub const HAMBURGER_TOKEN: &str = "HAMBURGER";

/// Canonical token for a negative answer
pub const NOT_HAMBURGER_TOKEN: &str = "NOT_HAMBURGER";

/// Classification outcome, serialized as its canonical token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "HAMBURGER")]
    Hamburger,
    #[serde(rename = "NOT_HAMBURGER")]
    NotHamburger,
}

impl Verdict {
    /// Collapse a free-form model reply to a canonical verdict
    ///
    /// Positive only when the uppercased reply mentions `HAMBURGER` and has no
    /// `NOT` anywhere, which also rules out the negative token itself.
    pub fn from_model_reply(reply: &str) -> Self {
        let text = reply.trim().to_uppercase();
        if text.contains(HAMBURGER_TOKEN) && !text.contains("NOT") {
            Verdict::Hamburger
        } else {
            Verdict::NotHamburger
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Verdict::Hamburger => HAMBURGER_TOKEN,
            Verdict::NotHamburger => NOT_HAMBURGER_TOKEN,
        }
    }

    pub fn is_hamburger(self) -> bool {
        matches!(self, Verdict::Hamburger)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Client-side reading of a model description
///
/// Absent or empty descriptions are negative. Exact `HAMBURGER`/`BURGER` are
/// positive; anything containing `NOT` is negative; otherwise the text must
/// mention `HAMBURGER`.
pub fn detect_hamburger(description: Option<&str>) -> bool {
    let text = match description {
        Some(d) if !d.is_empty() => d.to_uppercase(),
        _ => return false,
    };
    let text = text.trim();

    if text == "HAMBURGER" || text == "BURGER" {
        return true;
    }

    if text == "NOT_HAMBURGER" || text == "NOT HAMBURGER" || text.contains("NOT") {
        return false;
    }

    text.contains("HAMBURGER")
}
