// Domain-level refusals for player actions. None of these are fatal; each one leaves
// state untouched and is surfaced to the player as-is.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ActionError {
    // Authority.
    HostOnly,

    // Session/encounter state.
    NoPosition,
    PlayerDead,
    BaseAlreadyEstablished,
    NoBase,
    EncounterInProgress,
    PhaseChangePending,
    NoEncounter,
    EncounterLocked,
    AlreadyUnlocked,
    NotYourTurn,
    WrongAction,
    NotInteractable,

    // Unknown targets.
    UnknownEntity,
    UnknownPlayer,

    // Resource insufficiency and range.
    InsufficientEnergy { required: f64, available: f64 },
    NoLaserCharge,
    NoMedkit,
    NotEnoughWood { required: u32, available: u32 },
    NothingToUse,
    TooFar { distance_m: f64, max_m: f64 },
    TargetNotDead,
    EmptyMessage,
    MessageTooLong,
}

impl ActionError {
    pub fn is_authority(&self) -> bool {
        matches!(self, ActionError::HostOnly)
    }

    pub fn is_unknown_target(&self) -> bool {
        matches!(self, ActionError::UnknownEntity | ActionError::UnknownPlayer)
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(
            self,
            ActionError::InsufficientEnergy { .. }
                | ActionError::NoLaserCharge
                | ActionError::NoMedkit
                | ActionError::NotEnoughWood { .. }
                | ActionError::NothingToUse
                | ActionError::TooFar { .. }
                | ActionError::TargetNotDead
                | ActionError::EmptyMessage
                | ActionError::MessageTooLong
        )
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostOnly => write!(f, "only the host can do that"),
            Self::NoPosition => write!(f, "waiting for a position fix"),
            Self::PlayerDead => write!(f, "vital signs terminated; wait for a revive"),
            Self::BaseAlreadyEstablished => write!(f, "base already established"),
            Self::NoBase => write!(f, "no base established yet"),
            Self::EncounterInProgress => write!(f, "already engaged with a target"),
            Self::PhaseChangePending => write!(f, "nightfall already in progress"),
            Self::NoEncounter => write!(f, "no active encounter"),
            Self::EncounterLocked => {
                write!(f, "physical interaction impossible; move closer or deploy drone")
            }
            Self::AlreadyUnlocked => write!(f, "target is already within reach"),
            Self::NotYourTurn => write!(f, "wait for your turn"),
            Self::WrongAction => write!(f, "that action does not apply to this target"),
            Self::NotInteractable => write!(f, "target cannot be interacted with"),
            Self::UnknownEntity => write!(f, "target not found"),
            Self::UnknownPlayer => write!(f, "player not found"),
            Self::InsufficientEnergy {
                required,
                available,
            } => write!(
                f,
                "insufficient energy for drone link ({available:.0}/{required:.0})"
            ),
            Self::NoLaserCharge => write!(f, "no alien blaster charge"),
            Self::NoMedkit => write!(f, "need a medkit to revive"),
            Self::NotEnoughWood {
                required,
                available,
            } => write!(f, "not enough wood ({available}/{required})"),
            Self::NothingToUse => write!(f, "none left"),
            Self::TooFar { distance_m, max_m } => {
                write!(f, "too far ({distance_m:.1}m, need under {max_m:.0}m)")
            }
            Self::TargetNotDead => write!(f, "player does not need reviving"),
            Self::EmptyMessage => write!(f, "message is empty"),
            Self::MessageTooLong => write!(f, "message is too long"),
        }
    }
}

impl std::error::Error for ActionError {}
