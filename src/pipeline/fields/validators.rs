//! Validators and normalizers shared by the extraction rules and the
//! resolver. All are pure; each returns `None` for values that must not be
//! stored or used as match keys.

use chrono::NaiveDate;

/// Words that mark a captured "name" as form boilerplate.
const BOILERPLATE: &[&str] = &["TOTAL", "REPAIR", "ORDER", "SERVICE", "VEHICLE"];

/// Label words that can trail a captured name on the same line.
const TRAILING_LABELS: &[&str] = &[
    "PHONE", "TEL", "CELL", "MOBILE", "EMAIL", "E-MAIL", "VIN", "DATE", "ADDRESS", "PLATE",
    "LICENSE", "WRITER", "ADVISOR", "TECH", "TECHNICIAN", "RO", "R.O.",
];

/// Upper bound (exclusive) for a plausible repair-order total.
pub const MAX_TOTAL_AMOUNT: f64 = 100_000.0;

/// Oldest model year accepted for vehicle extraction.
pub const MIN_VEHICLE_YEAR: i32 = 1990;

/// Keep ASCII digits only. Idempotent.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalized phone when it has exactly 10 digits.
pub fn valid_phone(raw: &str) -> Option<String> {
    let digits = normalize_phone(raw);
    (digits.len() == 10).then_some(digits)
}

/// 17 characters over A-Z/0-9 without I, O or Q. Case-sensitive: callers
/// upper-case first.
pub fn is_valid_vin(vin: &str) -> bool {
    vin.len() == 17
        && vin
            .chars()
            .all(|c| c.is_ascii_digit() || (c.is_ascii_uppercase() && !matches!(c, 'I' | 'O' | 'Q')))
}

/// Trimmed, upper-cased VIN if it is valid.
pub fn normalize_vin(raw: &str) -> Option<String> {
    let vin = raw.trim().to_ascii_uppercase();
    is_valid_vin(&vin).then_some(vin)
}

/// Plate with all whitespace removed, upper-cased, 2 to 8 characters.
pub fn normalize_plate(raw: &str) -> Option<String> {
    let plate: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    (2..=8).contains(&plate.chars().count()).then_some(plate)
}

pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    (email.contains('@') && !email.starts_with('@') && !email.ends_with('@')).then_some(email)
}

/// Collapse internal whitespace runs to single spaces and trim.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if any whitespace-separated token is a boilerplate word.
pub fn contains_boilerplate(value: &str) -> bool {
    value
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| BOILERPLATE.iter().any(|b| token.eq_ignore_ascii_case(b)))
}

/// Drop label words (and anything after them) that a greedy name capture
/// picked up from the rest of the line, e.g. "Dana Whitfield Phone".
pub fn strip_trailing_labels(raw: &str) -> String {
    let mut kept = Vec::new();
    for token in raw.split_whitespace() {
        let bare = token.trim_end_matches([':', ',', '#']);
        if TRAILING_LABELS.iter().any(|l| bare.eq_ignore_ascii_case(l)) {
            break;
        }
        kept.push(token);
    }
    kept.join(" ")
}

/// Customer name: 5 to 50 characters, no boilerplate.
pub fn valid_customer_name(raw: &str) -> Option<String> {
    let name = collapse_whitespace(&strip_trailing_labels(raw));
    let name = name.trim_end_matches(['.', ',']).to_string();
    let len = name.chars().count();
    ((5..=50).contains(&len) && !contains_boilerplate(&name)).then_some(name)
}

/// Service writer: at least 4 and fewer than 50 characters, no boilerplate.
pub fn valid_service_writer(raw: &str) -> Option<String> {
    let name = collapse_whitespace(&strip_trailing_labels(raw));
    let name = name.trim_end_matches(['.', ',']).to_string();
    let len = name.chars().count();
    ((4..50).contains(&len) && !contains_boilerplate(&name)).then_some(name)
}

/// "SMITH" → "Smith".
pub fn title_case(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse "1,042.50" / "$ 87" into a value rounded to cents.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    value.is_finite().then(|| (value * 100.0).round() / 100.0)
}

/// Strictly positive amount.
pub fn positive_amount(raw: &str) -> Option<f64> {
    parse_amount(raw).filter(|v| *v > 0.0)
}

/// Total within (0, 100 000).
pub fn plausible_total(raw: &str) -> Option<f64> {
    positive_amount(raw).filter(|v| *v < MAX_TOTAL_AMOUNT)
}

/// Model year within [1990, current_year + 1].
pub fn valid_vehicle_year(year: i32, current_year: i32) -> bool {
    (MIN_VEHICLE_YEAR..=current_year + 1).contains(&year)
}

/// Expand a 2-digit year into the current century, or the previous one
/// when that would land after next year. 4-digit years pass through.
pub fn expand_year(raw: &str, current_year: i32) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    match raw.len() {
        2 => {
            let expanded = current_year / 100 * 100 + year;
            Some(if expanded > current_year + 1 { expanded - 100 } else { expanded })
        }
        4 => Some(year),
        _ => None,
    }
}

/// Calendar-checked date from string parts.
pub fn build_date(year: i32, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_normalization_examples() {
        assert_eq!(normalize_phone("(555) 123-4567"), "5551234567");
        assert_eq!(valid_phone("555.123.4567").as_deref(), Some("5551234567"));
        assert!(valid_phone("123-4567").is_none());
        assert!(valid_phone("+1 (555) 123-4567").is_none());
    }

    #[test]
    fn phone_normalization_is_idempotent() {
        for raw in ["(555) 123-4567", "555 123 4567", "abc", "", "1-800-FLOWERS", "٣٤٥"] {
            let once = normalize_phone(raw);
            assert_eq!(normalize_phone(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn vin_validation() {
        assert!(is_valid_vin("1HGCM82633A004352"));
        assert!(!is_valid_vin("1HGCM82633A00435"));
        assert!(!is_valid_vin("1HGCM82633AO04352"));
        assert!(!is_valid_vin("1HGCM82633AI04352"));
        assert!(!is_valid_vin("1HGCM82633AQ04352"));
        assert!(!is_valid_vin("1hgcm82633a004352"));
        assert_eq!(normalize_vin(" 1hgcm82633a004352 ").as_deref(), Some("1HGCM82633A004352"));
    }

    #[test]
    fn plate_normalization() {
        assert_eq!(normalize_plate("7abc 123").as_deref(), Some("7ABC123"));
        assert_eq!(normalize_plate("AB").as_deref(), Some("AB"));
        assert!(normalize_plate("A").is_none());
        assert!(normalize_plate("ABCDE12345").is_none());
    }

    #[test]
    fn customer_name_rules() {
        assert_eq!(valid_customer_name("Dana  Whitfield").as_deref(), Some("Dana Whitfield"));
        assert_eq!(
            valid_customer_name("Dana Whitfield Phone").as_deref(),
            Some("Dana Whitfield")
        );
        assert!(valid_customer_name("Al B").is_none());
        assert!(valid_customer_name("Repair Shop").is_none());
        assert!(valid_customer_name("Grand TOTAL").is_none());
        assert!(valid_customer_name(&"A".repeat(51)).is_none());
    }

    #[test]
    fn service_writer_rules() {
        assert_eq!(valid_service_writer("Mike Ross").as_deref(), Some("Mike Ross"));
        assert_eq!(valid_service_writer("Bobb").as_deref(), Some("Bobb"));
        assert!(valid_service_writer("Bob").is_none());
        assert!(valid_service_writer("Service Dept").is_none());
        assert!(valid_service_writer(&"B".repeat(50)).is_none());
    }

    #[test]
    fn amounts() {
        assert_eq!(parse_amount("1,042.50"), Some(1042.5));
        assert_eq!(parse_amount("$ 87"), Some(87.0));
        assert_eq!(positive_amount("0.00"), None);
        assert_eq!(plausible_total("99999.99"), Some(99999.99));
        assert_eq!(plausible_total("100000"), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn years() {
        assert!(valid_vehicle_year(1990, 2026));
        assert!(valid_vehicle_year(2027, 2026));
        assert!(!valid_vehicle_year(2028, 2026));
        assert!(!valid_vehicle_year(1989, 2026));
        assert_eq!(expand_year("24", 2026), Some(2024));
        assert_eq!(expand_year("27", 2026), Some(2027));
        assert_eq!(expand_year("99", 2026), Some(1999));
        assert_eq!(expand_year("2019", 2026), Some(2019));
        assert_eq!(expand_year("201", 2026), None);
    }

    #[test]
    fn dates_are_calendar_checked() {
        assert_eq!(build_date(2024, "03", "10"), NaiveDate::from_ymd_opt(2024, 3, 10));
        assert!(build_date(2024, "02", "30").is_none());
        assert!(build_date(2024, "13", "01").is_none());
    }

    #[test]
    fn title_case_word() {
        assert_eq!(title_case("SMITH"), "Smith");
        assert_eq!(title_case("o'NEIL"), "O'neil");
        assert_eq!(title_case(""), "");
    }
}
