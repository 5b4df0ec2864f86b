use chrono::NaiveDate;

/// Parse a release date in strict `YYYY-MM-DD` form.
///
/// Only the exact ten-character layout is accepted: four-digit year, two-digit
/// month and day, `-` separators. Anything else (`2024/01/01`, `2024-1-5`,
/// surrounding whitespace, trailing time components) is rejected rather than
/// partially parsed.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_iso_calendar_dates() {
        assert_eq!(
            parse_release_date("2024-01-31"),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert_eq!(
            parse_release_date("2020-02-29"),
            NaiveDate::from_ymd_opt(2020, 2, 29)
        );
    }

    #[test]
    fn rejects_other_separators_and_shapes() {
        for raw in [
            "2024/01/01",
            "2024-1-5",
            " 2024-01-01",
            "2024-01-01T00:00:00",
            "24-01-01",
            "",
            "abcd-ef-gh",
        ] {
            assert!(parse_release_date(raw).is_none(), "accepted {raw:?}");
        }
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        assert!(parse_release_date("2023-02-29").is_none());
        assert!(parse_release_date("2024-13-01").is_none());
    }
}
