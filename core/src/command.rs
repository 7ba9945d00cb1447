use crate::action::ActionKind;
use serde::{Deserialize, Serialize};

/// All player-issued commands: one per control on the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Fire ──────────────────────────────────────
    AddLog,

    // ── Mini-game ─────────────────────────────────
    BuyWood,
    BuyFood,
    Work,
    Eat,
    Chop,

    // ── Controls ──────────────────────────────────
    ToggleAudio,
    SetTimeScale { value: f64 },
}

impl PlayerCommand {
    /// The cooldown-gated action behind this command, if any.
    pub fn action(&self) -> Option<ActionKind> {
        match self {
            Self::AddLog  => Some(ActionKind::AddLog),
            Self::BuyWood => Some(ActionKind::BuyWood),
            Self::BuyFood => Some(ActionKind::BuyFood),
            Self::Work    => Some(ActionKind::Work),
            Self::Eat     => Some(ActionKind::Eat),
            Self::Chop    => Some(ActionKind::Chop),
            Self::ToggleAudio | Self::SetTimeScale { .. } => None,
        }
    }
}
