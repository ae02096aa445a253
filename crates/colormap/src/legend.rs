//! Land-cover legend
//!
//! The class table is static: class values, names and display colours are
//! fixed for every map the pipeline produces.

use std::fmt;

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `rrggbb`, with or without a leading `#`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

/// One row of the legend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendEntry {
    pub value: u8,
    pub name: &'static str,
    pub color: Rgb,
}

/// Exported class values and their display colours. Value 0 is no data.
pub const LAND_COVER_LEGEND: [LegendEntry; 6] = [
    LegendEntry { value: 0, name: "No data", color: Rgb::new(0xff, 0xff, 0xff) },
    LegendEntry { value: 1, name: "Forestland", color: Rgb::new(0x24, 0x6a, 0x24) },
    LegendEntry { value: 2, name: "Settlement", color: Rgb::new(0xff, 0x00, 0x00) },
    LegendEntry { value: 3, name: "Cropland", color: Rgb::new(0xa6, 0x54, 0x00) },
    LegendEntry { value: 4, name: "Wetland", color: Rgb::new(0x66, 0xcc, 0xff) },
    LegendEntry { value: 5, name: "Grassland", color: Rgb::new(0xff, 0xff, 0x66) },
];

/// Legend row of a class value
pub fn legend_entry(value: u8) -> Option<&'static LegendEntry> {
    LAND_COVER_LEGEND.iter().find(|e| e.value == value)
}

/// Plain-text legend, one class per line
pub fn legend_table() -> String {
    LAND_COVER_LEGEND
        .iter()
        .map(|e| format!("{:>2}  {}  {}\n", e.value, e.color, e.name))
        .collect()
}
