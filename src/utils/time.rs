//! Countdown formatting

/// Render seconds as `HH:MM:SS`; hours are not wrapped at 24
pub fn format_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(3599), "00:59:59");
        assert_eq!(format_hms(7200), "02:00:00");
        assert_eq!(format_hms(72 * 3600 + 61), "72:01:01");
    }
}
