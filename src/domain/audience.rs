//! Addressing tokens and the audiences they describe.
//!
//! A notice's `target` is stored as a plain token. It is classified once into
//! an [`Audience`] and every other part of the crate works on that variant.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    domain::NoticeKind,
    error::{AppError, Result},
};

pub const SECTION_PREFIX: &str = "section_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BroadcastScope {
    All,
    Staff,
    Teacher,
    Student,
}

impl BroadcastScope {
    pub const EVERY: [BroadcastScope; 4] = [
        BroadcastScope::All,
        BroadcastScope::Staff,
        BroadcastScope::Teacher,
        BroadcastScope::Student,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BroadcastScope::All => "All",
            BroadcastScope::Staff => "Staff",
            BroadcastScope::Teacher => "Teacher",
            BroadcastScope::Student => "Student",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "All" => Some(BroadcastScope::All),
            "Staff" => Some(BroadcastScope::Staff),
            "Teacher" => Some(BroadcastScope::Teacher),
            "Student" => Some(BroadcastScope::Student),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Audience {
    Broadcast(BroadcastScope),
    SectionScoped(String),
    /// Any other token, read as the recipient's user id.
    Direct(String),
}

/// Classifies an addressing token.
///
/// Fails only for tokens that cannot name any audience: empty or
/// whitespace-only tokens, and a bare `section_` prefix.
pub fn classify(target: &str) -> Result<Audience> {
    if target.trim().is_empty() {
        return Err(AppError::InvalidTarget("target is empty".to_string()));
    }

    if let Some(section_id) = target.strip_prefix(SECTION_PREFIX) {
        if section_id.is_empty() {
            return Err(AppError::InvalidTarget(format!(
                "'{}' does not name a section",
                target
            )));
        }
        return Ok(Audience::SectionScoped(section_id.to_string()));
    }

    if let Some(scope) = BroadcastScope::from_token(target) {
        return Ok(Audience::Broadcast(scope));
    }

    Ok(Audience::Direct(target.to_string()))
}

impl Audience {
    pub fn section(section_id: impl Into<String>) -> Self {
        Audience::SectionScoped(section_id.into())
    }

    /// True iff this is a section audience naming one of `viewer_section_ids`.
    pub fn is_section_addressed(&self, viewer_section_ids: &BTreeSet<String>) -> bool {
        match self {
            Audience::SectionScoped(section_id) => viewer_section_ids.contains(section_id),
            _ => false,
        }
    }

    /// The only item kind this audience may carry.
    pub fn expected_kind(&self) -> NoticeKind {
        match self {
            Audience::Direct(_) => NoticeKind::PrivateMessage,
            Audience::Broadcast(_) | Audience::SectionScoped(_) => NoticeKind::Notice,
        }
    }

    pub fn check_kind(&self, kind: NoticeKind) -> Result<()> {
        if self.expected_kind() == kind {
            return Ok(());
        }
        Err(AppError::InvalidTarget(format!(
            "target '{}' cannot carry a {}",
            self,
            kind.as_str()
        )))
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Audience::Broadcast(scope) => f.write_str(scope.as_str()),
            Audience::SectionScoped(section_id) => write!(f, "{}{}", SECTION_PREFIX, section_id),
            Audience::Direct(user_id) => f.write_str(user_id),
        }
    }
}

impl FromStr for Audience {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        classify(s)
    }
}
