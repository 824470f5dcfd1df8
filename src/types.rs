//! Core types used throughout the project.

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// Identifier of an entity within its entity type.
pub type EntityId = u64;

/// Identifier of a stored revision within its entity type.
pub type RevisionId = u64;

/// Reserved revision id meaning "no revision / hidden". Never a real stored revision.
pub const HIDDEN_REVISION: RevisionId = 0;

/// Identifies one entity instance (all of its revisions).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityKey {
    pub entity_type: String,
    pub entity_id: EntityId,
}

impl EntityKey {
    #[must_use]
    pub fn new(entity_type: impl Into<String>, entity_id: EntityId) -> Self {
        Self { entity_type: entity_type.into(), entity_id }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.entity_id)
    }
}

/// Points at one physical revision of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionRef {
    pub entity_type: String,
    pub entity_id: EntityId,
    pub revision_id: RevisionId,
}

impl RevisionRef {
    #[must_use]
    pub fn new(key: &EntityKey, revision_id: RevisionId) -> Self {
        Self { entity_type: key.entity_type.clone(), entity_id: key.entity_id, revision_id }
    }

    /// The sentinel reference used to hide a translation without deleting it.
    #[must_use]
    pub fn hidden(key: &EntityKey) -> Self {
        Self::new(key, HIDDEN_REVISION)
    }

    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.revision_id == HIDDEN_REVISION
    }

    #[must_use]
    pub fn entity_key(&self) -> EntityKey {
        EntityKey::new(self.entity_type.clone(), self.entity_id)
    }
}

/// Lifecycle stage of a moderated entity revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationState {
    Draft,
    Validated,
    Published,
    Archived,
}

impl ModerationState {
    /// Published and Validated are the only states that can be alive side by side.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Published | Self::Validated)
    }
}

impl fmt::Display for ModerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Validated => write!(f, "validated"),
            Self::Published => write!(f, "published"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for ModerationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "validated" => Ok(Self::Validated),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Invalid moderation state: {s}")),
        }
    }
}

/// Which of the two live states an active mapping applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Published,
    Validated,
    Both,
}

impl Scope {
    /// Scope covering exactly one live state. `None` for states that are never live.
    #[must_use]
    pub const fn of(state: ModerationState) -> Option<Self> {
        match state {
            ModerationState::Published => Some(Self::Published),
            ModerationState::Validated => Some(Self::Validated),
            ModerationState::Draft | ModerationState::Archived => None,
        }
    }

    #[must_use]
    pub const fn covers(self, state: ModerationState) -> bool {
        match self {
            Self::Published => matches!(state, ModerationState::Published),
            Self::Validated => matches!(state, ModerationState::Validated),
            Self::Both => state.is_live(),
        }
    }

    /// The scope left after removing `state`; `None` when nothing remains.
    #[must_use]
    pub const fn without(self, state: ModerationState) -> Option<Self> {
        match (self, state) {
            (Self::Both, ModerationState::Published) => Some(Self::Validated),
            (Self::Both, ModerationState::Validated) => Some(Self::Published),
            (Self::Published, ModerationState::Published)
            | (Self::Validated, ModerationState::Validated) => None,
            (scope, _) => Some(scope),
        }
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        match (self, other) {
            (Self::Published, Self::Published) => Self::Published,
            (Self::Validated, Self::Validated) => Self::Validated,
            _ => Self::Both,
        }
    }

    /// Live states this scope covers, Published first.
    #[must_use]
    pub fn states(self) -> Vec<ModerationState> {
        match self {
            Self::Published => vec![ModerationState::Published],
            Self::Validated => vec![ModerationState::Validated],
            Self::Both => vec![ModerationState::Published, ModerationState::Validated],
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published => write!(f, "published"),
            Self::Validated => write!(f, "validated"),
            Self::Both => write!(f, "both"),
        }
    }
}
