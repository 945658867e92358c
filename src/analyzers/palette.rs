/// Fixed series color per region.
///
/// | Region      | Color     |
/// |-------------|-----------|
/// | North       | `#D55E00` |
/// | Reach       | `#0072B2` |
/// | Dorne       | `#CC79A7` |
/// | Westerlands | `#E69F00` |
/// | Riverlands  | `#009E73` |
/// | Vale        | `#19D3F3` |
/// | Crownlands  | `#F0E442` |
static PALETTE: &[(&str, &str)] = &[
    ("North", "#D55E00"),
    ("Reach", "#0072B2"),
    ("Dorne", "#CC79A7"),
    ("Westerlands", "#E69F00"),
    ("Riverlands", "#009E73"),
    ("Vale", "#19D3F3"),
    ("Crownlands", "#F0E442"),
];

/// Returns the palette color for `region`, or `None` for a region outside the palette.
pub fn region_color(region: &str) -> Option<&'static str> {
    PALETTE
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, color)| *color)
}

/// Splits a `#RRGGBB` color into its channels.
pub fn hex_to_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
