//! Plot styling applied when an experiment is entered
//!
//! Plotting itself belongs to the caller. This module only records which
//! cosmetic theme figures should pick up; figure implementations read
//! [`current_style`] when they are created.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Cosmetic plot theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotStyle {
    /// White background with grid lines (applied on experiment entry).
    #[default]
    WhiteGrid,
    /// Dark background with grid lines.
    DarkGrid,
    /// Plain white background.
    White,
    /// Plain dark background.
    Dark,
    /// White background with axis ticks.
    Ticks,
}

impl PlotStyle {
    /// Theme name as used by common plotting toolkits.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::WhiteGrid => "whitegrid",
            Self::DarkGrid => "darkgrid",
            Self::White => "white",
            Self::Dark => "dark",
            Self::Ticks => "ticks",
        }
    }

    /// Whether the theme draws grid lines.
    #[must_use]
    pub const fn has_grid(self) -> bool {
        matches!(self, Self::WhiteGrid | Self::DarkGrid)
    }
}

impl fmt::Display for PlotStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Process-wide; unset until the first experiment is entered.
static CURRENT_STYLE: RwLock<Option<PlotStyle>> = RwLock::new(None);

/// Make `style` the theme for subsequently created figures.
pub fn set_style(style: PlotStyle) {
    let mut guard = CURRENT_STYLE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = Some(style);
    tracing::debug!(style = %style, "plot style applied");
}

/// Theme for newly created figures (the default until one is set).
#[must_use]
pub fn current_style() -> PlotStyle {
    let guard = CURRENT_STYLE
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    (*guard).unwrap_or_default()
}
