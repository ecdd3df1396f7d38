//! Clock-style formatting for playlist lengths.

/// Format a millisecond length as `mm:ss`, or `h:mm:ss` above one hour.
/// Negative lengths clamp to zero.
pub fn format_clock_ms(ms: i64) -> String {
    let total = ms.max(0) / 1000;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lengths() {
        assert_eq!(format_clock_ms(0), "00:00");
        assert_eq!(format_clock_ms(999), "00:00");
        assert_eq!(format_clock_ms(61_000), "01:01");
        assert_eq!(format_clock_ms(215_000), "03:35");
    }

    #[test]
    fn hour_lengths() {
        assert_eq!(format_clock_ms(3_600_000), "1:00:00");
        assert_eq!(format_clock_ms(3_721_000), "1:02:01");
        assert_eq!(format_clock_ms(36_000_000), "10:00:00");
    }

    #[test]
    fn negative_clamps() {
        assert_eq!(format_clock_ms(-5_000), "00:00");
    }
}
