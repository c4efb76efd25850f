//! Text normalization for scraped fields: locations, register dates and the
//! deadline sentinels.

use chrono::NaiveDate;

/// Placeholder the crawler emits for fields missing from a job card.
pub const MISSING: &str = "정보 없음";

/// "Rolling recruitment": no fixed deadline, kept open continuously.
pub const DEADLINE_ROLLING: &str = "상시채용";
/// "Until filled": closes whenever the position is filled.
pub const DEADLINE_UNTIL_FILLED: &str = "채용시";

/// Far-future dates standing in for the two open-ended deadline kinds, kept
/// distinct so the original label survives a round-trip and both sort after
/// every literal deadline.
pub const ROLLING_SENTINEL: (i32, u32, u32) = (9999, 12, 30);
pub const UNTIL_FILLED_SENTINEL: (i32, u32, u32) = (9999, 12, 31);

/// Maps a raw deadline string to a storable date.
///
/// Sentinel labels map to their far-future dates, blanks and the missing-field
/// placeholder to `None`, and literal dates (`YYYY/MM/DD` or `YYYY-MM-DD`)
/// pass through unchanged. Anything else is unparseable (`None`).
pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    match raw {
        "" | MISSING => None,
        DEADLINE_ROLLING => {
            let (y, m, d) = ROLLING_SENTINEL;
            NaiveDate::from_ymd_opt(y, m, d)
        }
        DEADLINE_UNTIL_FILLED => {
            let (y, m, d) = UNTIL_FILLED_SENTINEL;
            NaiveDate::from_ymd_opt(y, m, d)
        }
        _ => NaiveDate::parse_from_str(raw, "%Y/%m/%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .ok(),
    }
}

/// Splits a raw location like `"서울 강남구"` into `(region, district)`.
///
/// The source site occasionally glues region and district together
/// (`"서울전체"`); those get re-split. A bare region maps to the region-wide
/// `"전체"` district.
pub fn split_location(raw: &str) -> (String, String) {
    let unglued = raw
        .trim()
        .replace("서울전체", "서울 전체")
        .replace("경기전체", "경기 전체");
    match unglued.split_once(' ') {
        Some((region, district)) => (region.to_string(), district.trim().to_string()),
        None => (unglued, "전체".to_string()),
    }
}

/// Normalizes a register-date label like `"등록일 24/12/01"` to
/// `"2024/12/01"`. Returns `None` for anything without the expected prefix.
pub fn normalize_register_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = raw
        .strip_prefix("등록일 ")
        .or_else(|| raw.strip_prefix("수정일 "))?;
    Some(format!("20{date}"))
}

/// Parses a normalized register date (`YYYY/MM/DD`) into a date.
pub fn parse_register_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y/%m/%d").ok()
}

/// Crawler-side deadline normalization, relative to the crawl date.
///
/// `오늘마감`/`내일마감` become literal dates; the two open-ended labels are
/// kept verbatim (the loader maps them to sentinel dates); `~ MM/DD(요일)`
/// forms resolve against the current year; anything else is `정보 없음`.
pub fn normalize_listing_deadline(raw: &str, today: NaiveDate) -> String {
    let raw = raw.trim();
    if raw.contains("오늘마감") {
        return today.format("%Y/%m/%d").to_string();
    }
    if raw.contains("내일마감") {
        return (today + chrono::Duration::days(1))
            .format("%Y/%m/%d")
            .to_string();
    }
    if raw.contains(DEADLINE_ROLLING) {
        return DEADLINE_ROLLING.to_string();
    }
    if raw.contains(DEADLINE_UNTIL_FILLED) {
        return DEADLINE_UNTIL_FILLED.to_string();
    }

    // "~ 12/31(화)" style: strip the leading tilde and weekday suffix.
    let candidate = raw
        .trim_start_matches('~')
        .trim()
        .split('(')
        .next()
        .unwrap_or("")
        .trim();
    match NaiveDate::parse_from_str(&format!("{}/{candidate}", today.format("%Y")), "%Y/%m/%d") {
        Ok(date) => date.format("%Y/%m/%d").to_string(),
        Err(_) => MISSING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_rolling_deadline_maps_to_sentinel() {
        assert_eq!(parse_deadline("상시채용"), Some(d(9999, 12, 30)));
    }

    #[test]
    fn test_until_filled_maps_to_distinct_sentinel() {
        assert_eq!(parse_deadline("채용시"), Some(d(9999, 12, 31)));
        assert_ne!(parse_deadline("채용시"), parse_deadline("상시채용"));
    }

    #[test]
    fn test_blank_deadline_is_none() {
        assert_eq!(parse_deadline(""), None);
        assert_eq!(parse_deadline("   "), None);
        assert_eq!(parse_deadline("정보 없음"), None);
    }

    #[test]
    fn test_literal_deadline_passes_through() {
        assert_eq!(parse_deadline("2025/01/31"), Some(d(2025, 1, 31)));
        assert_eq!(parse_deadline("2025-01-31"), Some(d(2025, 1, 31)));
    }

    #[test]
    fn test_unparseable_deadline_is_none() {
        assert_eq!(parse_deadline("~ 01/31(금)"), None);
    }

    #[test]
    fn test_split_location_region_and_district() {
        assert_eq!(
            split_location("서울 강남구"),
            ("서울".to_string(), "강남구".to_string())
        );
    }

    #[test]
    fn test_split_location_glued_region() {
        assert_eq!(
            split_location("서울전체"),
            ("서울".to_string(), "전체".to_string())
        );
        assert_eq!(
            split_location("경기전체"),
            ("경기".to_string(), "전체".to_string())
        );
    }

    #[test]
    fn test_split_location_bare_region_defaults_to_whole() {
        assert_eq!(
            split_location("부산"),
            ("부산".to_string(), "전체".to_string())
        );
    }

    #[test]
    fn test_register_date_prefix_stripped_and_century_added() {
        assert_eq!(
            normalize_register_date("등록일 24/12/01"),
            Some("2024/12/01".to_string())
        );
        assert_eq!(
            normalize_register_date("수정일 25/01/15"),
            Some("2025/01/15".to_string())
        );
        assert_eq!(normalize_register_date("어제"), None);
    }

    #[test]
    fn test_parse_register_date() {
        assert_eq!(parse_register_date("2024/12/01"), Some(d(2024, 12, 1)));
        assert_eq!(parse_register_date("정보 없음"), None);
    }

    #[test]
    fn test_listing_deadline_today_and_tomorrow() {
        let today = d(2024, 12, 31);
        assert_eq!(normalize_listing_deadline("오늘마감", today), "2024/12/31");
        assert_eq!(normalize_listing_deadline("내일마감", today), "2025/01/01");
    }

    #[test]
    fn test_listing_deadline_keeps_open_ended_labels() {
        let today = d(2024, 12, 1);
        assert_eq!(normalize_listing_deadline("상시채용", today), "상시채용");
        assert_eq!(normalize_listing_deadline("채용시", today), "채용시");
    }

    #[test]
    fn test_listing_deadline_tilde_form() {
        let today = d(2024, 6, 1);
        assert_eq!(
            normalize_listing_deadline("~ 12/31(화)", today),
            "2024/12/31"
        );
    }

    #[test]
    fn test_listing_deadline_unparseable() {
        let today = d(2024, 6, 1);
        assert_eq!(normalize_listing_deadline("D-?", today), "정보 없음");
    }
}
