// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fiber color codes.
//!
//! Fibers, loose tubes and DIO trays are colored by position modulo 12
//! following the cable's color standard.

use serde::{Deserialize, Serialize};

/// Number of colors in a standard sequence
pub const COLORS_PER_SEQUENCE: usize = 12;

/// Fiber color code standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ColorStandard {
    /// TIA/EIA-598 (blue, orange, green, ...)
    #[default]
    #[serde(rename = "EIA598")]
    Eia598,
    /// ABNT NBR 14106 (green, yellow, white, ...)
    #[serde(rename = "ABNT")]
    Abnt,
}

impl ColorStandard {
    /// Get display name for this standard
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Eia598 => "EIA-598",
            Self::Abnt => "ABNT",
        }
    }
}

/// Source of display colors for fibers, tubes and trays
pub trait FiberPalette {
    /// Hex color of position `index` (taken modulo 12) in `standard`
    fn fiber_color(&self, index: usize, standard: ColorStandard) -> String;
}

const EIA598: [&str; COLORS_PER_SEQUENCE] = [
    "#0000FF", // blue
    "#FFA500", // orange
    "#008000", // green
    "#8B4513", // brown
    "#708090", // slate
    "#FFFFFF", // white
    "#FF0000", // red
    "#000000", // black
    "#FFFF00", // yellow
    "#EE82EE", // violet
    "#FF69B4", // rose
    "#00FFFF", // aqua
];

const ABNT: [&str; COLORS_PER_SEQUENCE] = [
    "#008000", // verde
    "#FFFF00", // amarelo
    "#FFFFFF", // branco
    "#0000FF", // azul
    "#FF0000", // vermelho
    "#EE82EE", // violeta
    "#8B4513", // marrom
    "#FF69B4", // rosa
    "#000000", // preto
    "#808080", // cinza
    "#FFA500", // laranja
    "#00FFFF", // água-marinha
];

/// Built-in color tables
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPalette;

impl FiberPalette for StandardPalette {
    fn fiber_color(&self, index: usize, standard: ColorStandard) -> String {
        let table = match standard {
            ColorStandard::Eia598 => &EIA598,
            ColorStandard::Abnt => &ABNT,
        };
        table[index % COLORS_PER_SEQUENCE].to_string()
    }
}
