use crate::domain::errors::ActionError;
use crate::domain::geo::distance_m;
use crate::domain::state::{Coordinates, Player};
use crate::domain::tuning::combat::ReviveTuning;

/// Check every precondition for reviving `target`. Nothing is mutated here.
pub fn check_revive(
    reviver: &Player,
    reviver_position: Option<Coordinates>,
    target: Option<&Player>,
    cfg: &ReviveTuning,
) -> Result<(), ActionError> {
    if reviver.is_dead {
        return Err(ActionError::PlayerDead);
    }
    let target = target.ok_or(ActionError::UnknownPlayer)?;
    if !target.is_dead {
        return Err(ActionError::TargetNotDead);
    }
    let target_position = target.position.ok_or(ActionError::UnknownPlayer)?;
    let reviver_position = reviver_position.ok_or(ActionError::NoPosition)?;

    let distance = distance_m(reviver_position, target_position);
    if distance >= cfg.range_m {
        return Err(ActionError::TooFar {
            distance_m: distance,
            max_m: cfg.range_m,
        });
    }
    if reviver.inventory.medkit == 0 {
        return Err(ActionError::NoMedkit);
    }
    Ok(())
}

/// Bring a ghost back. Returns false when the player was not dead.
pub fn revive(player: &mut Player, cfg: &ReviveTuning) -> bool {
    if !player.is_dead {
        return false;
    }
    player.is_dead = false;
    player.hp = cfg.revive_hp.min(player.max_hp);
    true
}
