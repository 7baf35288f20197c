//! Novation Launchpad default color palette
//!
//! Launchpads light a pad with a palette index sent as note velocity. The
//! editor previews covers with the same colors the hardware shows.

/// RGB color
pub type Rgb = [u8; 3];

/// Default palette, index 0 is velocity 1
pub const NOVATION_PALETTE: [Rgb; 127] = [
    [179, 179, 179], [221, 221, 221], [255, 255, 255], [255, 179, 180],
    [255, 98, 97], [222, 96, 97], [179, 97, 97], [255, 243, 213],
    [255, 179, 97], [222, 141, 98], [178, 119, 97], [255, 239, 161],
    [253, 255, 97], [221, 221, 98], [179, 179, 97], [222, 255, 160],
    [195, 255, 97], [162, 220, 98], [130, 179, 96], [194, 255, 179],
    [97, 255, 98], [97, 220, 97], [96, 179, 97], [195, 255, 194],
    [96, 255, 140], [97, 220, 119], [96, 179, 107], [195, 255, 204],
    [96, 255, 203], [97, 220, 162], [97, 179, 129], [195, 255, 243],
    [96, 255, 233], [97, 220, 194], [96, 179, 150], [194, 243, 254],
    [98, 238, 255], [98, 199, 221], [98, 160, 180], [194, 221, 255],
    [97, 199, 255], [97, 160, 221], [97, 129, 179], [162, 140, 255],
    [97, 97, 255], [97, 97, 222], [97, 97, 179], [204, 179, 255],
    [161, 97, 254], [129, 97, 221], [118, 97, 179], [255, 179, 255],
    [255, 97, 255], [221, 96, 221], [179, 97, 180], [255, 179, 214],
    [255, 97, 194], [221, 96, 161], [179, 97, 140], [255, 118, 96],
    [234, 179, 97], [222, 194, 96], [161, 161, 97], [96, 179, 97],
    [97, 179, 141], [97, 140, 213], [97, 97, 255], [97, 179, 179],
    [140, 97, 243], [204, 179, 193], [140, 118, 128], [255, 98, 97],
    [242, 255, 161], [238, 252, 97], [203, 255, 96], [118, 221, 97],
    [96, 255, 203], [97, 233, 255], [97, 160, 255], [140, 97, 254],
    [204, 97, 252], [238, 141, 221], [161, 118, 97], [255, 161, 98],
    [220, 249, 98], [213, 255, 140], [97, 255, 98], [178, 255, 161],
    [205, 252, 213], [179, 255, 246], [205, 228, 255], [162, 194, 247],
    [213, 194, 249], [249, 139, 255], [255, 97, 204], [255, 194, 97],
    [243, 238, 96], [228, 255, 97], [220, 205, 98], [179, 161, 96],
    [97, 186, 117], [119, 194, 139], [129, 129, 161], [129, 140, 204],
    [205, 170, 128], [222, 96, 97], [250, 179, 160], [248, 187, 118],
    [254, 243, 139], [233, 249, 161], [214, 238, 118], [129, 129, 161],
    [248, 249, 214], [222, 252, 228], [233, 233, 255], [227, 214, 255],
    [179, 179, 179], [213, 213, 213], [249, 255, 255], [234, 96, 96],
    [170, 98, 97], [130, 245, 96], [96, 179, 97], [243, 238, 96],
    [179, 161, 96], [238, 195, 97], [194, 119, 97],
];

/// Color shown for a note velocity; velocity 0 (and out of range) is off
pub fn velocity_to_rgb(velocity: u8) -> Option<Rgb> {
    match velocity {
        1..=127 => Some(NOVATION_PALETTE[(velocity - 1) as usize]),
        _ => None,
    }
}

/// Closest palette velocity for an arbitrary color (squared RGB distance)
pub fn nearest_velocity(color: Rgb) -> u8 {
    let distance = |candidate: &Rgb| -> u32 {
        candidate
            .iter()
            .zip(color.iter())
            .map(|(&a, &b)| {
                let d = a as i32 - b as i32;
                (d * d) as u32
            })
            .sum()
    };

    let mut best_index = 0;
    let mut best_distance = u32::MAX;
    for (index, candidate) in NOVATION_PALETTE.iter().enumerate() {
        let d = distance(candidate);
        if d < best_distance {
            best_distance = d;
            best_index = index;
        }
    }

    (best_index + 1) as u8
}

/// Hex string (`#rrggbb`) for display
pub fn to_hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_bounds() {
        assert_eq!(velocity_to_rgb(0), None);
        assert_eq!(velocity_to_rgb(128), None);
        assert_eq!(velocity_to_rgb(1), Some([179, 179, 179]));
        assert_eq!(velocity_to_rgb(127), Some([194, 119, 97]));
    }

    #[test]
    fn test_nearest_velocity_round_trips_exact_colors() {
        let color = NOVATION_PALETTE[4];
        let velocity = nearest_velocity(color);
        assert_eq!(velocity_to_rgb(velocity), Some(color));
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex([255, 98, 97]), "#ff6261");
    }
}
