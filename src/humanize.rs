//! Compact, human-readable byte counts for directory listings.

/// Units above bytes, in order. Nothing is scaled past terabytes.
const UNITS: [&str; 4] = ["K", "M", "G", "T"];

/// Format a byte count compactly.
///
/// Below 1024 the count is printed as is. From there the value is divided by
/// 1024 until it drops below 1024 or the unit reaches `T`, and printed with
/// one decimal place.
///
/// ```
/// use zipserve::humanize::file_size;
///
/// assert_eq!(file_size(512), "512");
/// assert_eq!(file_size(1536), "1.5K");
/// assert_eq!(file_size(1048576), "1.0M");
/// ```
pub fn file_size(size: u64) -> String {
    if size < 1024 {
        return size.to_string();
    }

    let mut value = size as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1}{}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TB: u64 = 1 << 40;

    #[test]
    fn small_sizes_are_plain() {
        assert_eq!(file_size(0), "0");
        assert_eq!(file_size(1), "1");
        assert_eq!(file_size(1023), "1023");
    }

    #[test]
    fn scaled_sizes_have_one_decimal() {
        assert_eq!(file_size(1024), "1.0K");
        assert_eq!(file_size(1536), "1.5K");
        assert_eq!(file_size(1048576), "1.0M");
        assert_eq!(file_size(5 * (1 << 30) + (1 << 29)), "5.5G");
    }

    #[test]
    fn terabytes_are_the_ceiling() {
        assert_eq!(file_size(TB), "1.0T");
        assert_eq!(file_size(2048 * TB), "2048.0T");
        assert!(file_size(u64::MAX).ends_with('T'));
    }
}
