//! Declared parameter domains
//!
//! Every Configuration a controller returns must lie inside these bounds.

/// Lowest encodable bitrate (bps)
pub const MIN_BITRATE_BPS: u32 = 6_000;

/// Highest encodable bitrate (bps)
pub const MAX_BITRATE_BPS: u32 = 64_000;

/// Allowed frame durations (ms), ascending
pub const FRAME_SIZES_MS: [u16; 4] = [10, 20, 40, 60];

/// Highest encoder complexity; the lowest is 0
pub const MAX_COMPLEXITY: u8 = 10;

/// Check a bitrate against the declared range
pub fn bitrate_in_domain(bitrate: u32) -> bool {
    (MIN_BITRATE_BPS..=MAX_BITRATE_BPS).contains(&bitrate)
}

/// Check a frame size against the enumerated set
pub fn frame_size_in_domain(frame_size_ms: u16) -> bool {
    FRAME_SIZES_MS.contains(&frame_size_ms)
}

/// Check an encoder complexity against the declared range
pub fn complexity_in_domain(complexity: u8) -> bool {
    complexity <= MAX_COMPLEXITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitrate_bounds_inclusive() {
        assert!(bitrate_in_domain(MIN_BITRATE_BPS));
        assert!(bitrate_in_domain(MAX_BITRATE_BPS));
        assert!(!bitrate_in_domain(MIN_BITRATE_BPS - 1));
        assert!(!bitrate_in_domain(MAX_BITRATE_BPS + 1));
    }

    #[test]
    fn test_frame_sizes_enumerated() {
        for size in FRAME_SIZES_MS {
            assert!(frame_size_in_domain(size));
        }
        assert!(!frame_size_in_domain(30));
        assert!(!frame_size_in_domain(0));
    }

    #[test]
    fn test_complexity_bounds() {
        assert!(complexity_in_domain(0));
        assert!(complexity_in_domain(10));
        assert!(!complexity_in_domain(11));
    }
}
