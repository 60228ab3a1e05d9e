use super::types::NightRequest;
use crate::domain::ports::Narrator;
use tracing::warn;

/// Used whenever the narrator is down or says nothing useful.
pub const FALLBACK_LINES: [&str; 5] = [
    "The wind howls outside. Something scratched the door, but the barricade held.",
    "Quiet. Too quiet. You survived another night, but supplies are running low.",
    "A pack of wolves circled the camp for hours. The fire kept them at bay.",
    "You heard whispering in the dark. It sounded like your own voice.",
    "Acid rain fell throughout the night. The shelter is damaging, but you are alive.",
];

/// Ask the narrator for tonight's report, falling back to a canned line.
pub async fn narrate_or_fallback(narrator: &dyn Narrator, request: &NightRequest) -> String {
    let fallback = || FALLBACK_LINES[request.fallback_pick % FALLBACK_LINES.len()].to_string();

    match narrator
        .narrate(request.day, request.base_health, request.player_status)
        .await
    {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!(day = request.day, "narrator returned empty text; using fallback");
            fallback()
        }
        Err(err) => {
            warn!(day = request.day, error = ?err, "narrator failed; using fallback");
            fallback()
        }
    }
}
