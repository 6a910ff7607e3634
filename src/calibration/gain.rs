//! Gain-mode tag handling for the 16-bit detector word.
//!
//! Each raw pixel word packs a 2-bit gain-mode tag in the top bits and a
//! 14-bit ADU payload below it. The read-out hardware uses tag value 3 for
//! the third gain stage, so the wire tags are {0, 1, 3} while the logical
//! modes are {0, 1, 2}; tag 2 never occurs on a healthy detector.

/// Number of payload bits below the gain tag.
pub const PAYLOAD_BITS: u32 = 14;

/// Mask selecting the 14-bit ADU payload of a raw pixel word.
pub const PAYLOAD_MASK: u16 = (1 << PAYLOAD_BITS) - 1;

/// One of the three amplification regimes a pixel's read-out circuit can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GainMode {
    G0,
    G1,
    G2,
}

/// Wire tag (raw word >> 14) to logical gain mode. Tag 3 carries mode 2;
/// tag 2 is unused by the hardware and decodes to `None`.
const TAG_TO_MODE: [Option<GainMode>; 4] = [
    Some(GainMode::G0),
    Some(GainMode::G1),
    None,
    Some(GainMode::G2),
];

impl GainMode {
    /// All modes, in calibration-array order.
    pub const ALL: [GainMode; 3] = [GainMode::G0, GainMode::G1, GainMode::G2];

    /// Index into per-mode calibration arrays (g0/g1/g2, p0/p1/p2).
    pub fn index(self) -> usize {
        match self {
            GainMode::G0 => 0,
            GainMode::G1 => 1,
            GainMode::G2 => 2,
        }
    }

    /// The 2-bit tag this mode is encoded with on the wire.
    pub fn tag(self) -> u16 {
        match self {
            GainMode::G0 => 0,
            GainMode::G1 => 1,
            GainMode::G2 => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<GainMode> {
        GainMode::ALL.get(index).copied()
    }
}

impl std::fmt::Display for GainMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "G{}", self.index())
    }
}

/// Splits a raw pixel word into its wire tag and ADU payload.
pub fn split(raw: u16) -> (u16, u16) {
    (raw >> PAYLOAD_BITS, raw & PAYLOAD_MASK)
}

/// Decodes a raw pixel word into its logical gain mode and ADU payload.
///
/// Returns `None` for the unused wire tag 2, which indicates corrupt data
/// rather than a mode; callers report that as a data-integrity failure with
/// the pixel position attached.
pub fn decode(raw: u16) -> Option<(GainMode, u16)> {
    let (tag, payload) = split(raw);
    TAG_TO_MODE[tag as usize].map(|mode| (mode, payload))
}

/// Packs a gain mode and 14-bit payload into a raw pixel word.
///
/// Payload bits above bit 13 are discarded. Inverse of [`decode`]; used by
/// tests and synthetic-acquisition tooling.
pub fn encode(mode: GainMode, payload: u16) -> u16 {
    (mode.tag() << PAYLOAD_BITS) | (payload & PAYLOAD_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_covers_every_word() {
        for raw in 0..=u16::MAX {
            match decode(raw) {
                Some((mode, payload)) => {
                    assert!(matches!(mode, GainMode::G0 | GainMode::G1 | GainMode::G2));
                    assert!(payload <= PAYLOAD_MASK);
                }
                None => assert_eq!(raw >> PAYLOAD_BITS, 2),
            }
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        for mode in GainMode::ALL {
            for payload in [0u16, 1, 0x1234, PAYLOAD_MASK - 1, PAYLOAD_MASK] {
                let raw = encode(mode, payload);
                assert_eq!(decode(raw), Some((mode, payload)));
            }
        }
    }

    #[test]
    fn test_tag_three_is_mode_two() {
        let raw = (3u16 << PAYLOAD_BITS) | 42;
        assert_eq!(decode(raw), Some((GainMode::G2, 42)));
    }

    #[test]
    fn test_tag_two_rejected() {
        let raw = (2u16 << PAYLOAD_BITS) | 42;
        assert_eq!(decode(raw), None);
    }

    #[test]
    fn test_mode_index_order_matches_tag_order_for_low_modes() {
        assert_eq!(GainMode::G0.tag(), 0);
        assert_eq!(GainMode::G1.tag(), 1);
        assert_eq!(GainMode::G2.tag(), 3);
        assert_eq!(GainMode::from_index(2), Some(GainMode::G2));
        assert_eq!(GainMode::from_index(3), None);
    }
}
