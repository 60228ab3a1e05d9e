use super::session::Session;
use super::types::{ActionReport, ActionResult};
use crate::domain::PacketBody;
use crate::domain::systems::lifecycle;
use tracing::info;

impl Session {
    /// Spend a medkit to bring a dead ally back. The target applies the revive itself
    /// when the request reaches it.
    pub fn revive(&mut self, target_id: &str) -> ActionResult {
        lifecycle::check_revive(
            &self.player,
            self.player.position,
            self.other_players.get(target_id),
            &self.settings.revive,
        )?;

        self.player.inventory.medkit -= 1;
        self.broadcast(PacketBody::ReviveRequest {
            target_id: target_id.to_string(),
        });

        let name = self
            .other_players
            .get(target_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        info!(target_id, "revive sent");
        Ok(ActionReport::new(format!("Revive sent to {name}.")))
    }
}
