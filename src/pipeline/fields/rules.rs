use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::{Captures, Regex};

use super::validators::*;

// ═══════════════════════════════════════════
// Table types
// ═══════════════════════════════════════════

/// Every field the extractor can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    CustomerName,
    CustomerPhone,
    CustomerEmail,
    Vin,
    Vehicle,
    LicensePlate,
    ServiceDate,
    TotalAmount,
    PartsCost,
    LaborCost,
    ServiceWriter,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerName => "customer_name",
            Self::CustomerPhone => "customer_phone",
            Self::CustomerEmail => "customer_email",
            Self::Vin => "vin",
            Self::Vehicle => "vehicle",
            Self::LicensePlate => "license_plate",
            Self::ServiceDate => "service_date",
            Self::TotalAmount => "total_amount",
            Self::PartsCost => "parts_cost",
            Self::LaborCost => "labor_cost",
            Self::ServiceWriter => "service_writer",
        }
    }
}

/// How competing candidates for one field are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Rules in priority order; first validated match wins.
    FirstValid,
    /// Earliest valid date across all rules and matches.
    Earliest,
    /// Largest valid amount across all rules and matches.
    Maximum,
}

/// A normalized, validated candidate value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Amount(f64),
    Vehicle {
        year: i32,
        make: String,
        model: String,
    },
}

/// Ambient inputs a normalizer may need. Pinned in tests.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext {
    pub today: NaiveDate,
}

impl ExtractContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn current_year(&self) -> i32 {
        self.today.year()
    }
}

pub type Normalizer = fn(&Captures<'_>, &ExtractContext) -> Option<FieldValue>;

/// One (pattern, normalizer) pair. The normalizer both converts and
/// validates; `None` discards the match.
pub struct Rule {
    pub name: &'static str,
    pub pattern: Regex,
    pub normalize: Normalizer,
}

pub struct FieldRules {
    pub kind: FieldKind,
    pub selection: Selection,
    pub rules: Vec<Rule>,
}

fn rule(name: &'static str, pattern: &str, normalize: Normalizer) -> Rule {
    Rule {
        name,
        // Patterns are compile-time literals exercised by the test suite.
        pattern: Regex::new(pattern).unwrap(),
        normalize,
    }
}

/// First capture group, or the whole match for patterns without one.
fn captured<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str())
        .unwrap_or_default()
}

// ═══════════════════════════════════════════
// Patterns
// ═══════════════════════════════════════════

const PHONE_BODY: &str = r"\(?\d{3}\)?[ \t.\-]*\d{3}[ \t.\-]*\d{4}";
const AMOUNT_BODY: &str = r"[ \t]*[:#]?[ \t]*\$?[ \t]*(\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)";

/// Two capitalized words directly before a phone number or email address.
const BARE_NAME: &str = r"\b([A-Z][a-z]+[ \t]+[A-Z][a-z]+)[ \t]*(?:[,|\-][ \t]*)?(?:\r?\n[ \t]*)?";

// ═══════════════════════════════════════════
// Normalizers
// ═══════════════════════════════════════════

fn text_name(caps: &Captures<'_>, _: &ExtractContext) -> Option<FieldValue> {
    valid_customer_name(captured(caps)).map(FieldValue::Text)
}

/// "WHITFIELD, Dana" → "Dana Whitfield".
fn text_last_first(caps: &Captures<'_>, _: &ExtractContext) -> Option<FieldValue> {
    let last = caps.get(1)?.as_str();
    let first = caps.get(2)?.as_str();
    valid_customer_name(&format!("{first} {}", title_case(last))).map(FieldValue::Text)
}

fn text_phone(caps: &Captures<'_>, _: &ExtractContext) -> Option<FieldValue> {
    valid_phone(captured(caps)).map(FieldValue::Text)
}

fn text_email(caps: &Captures<'_>, _: &ExtractContext) -> Option<FieldValue> {
    normalize_email(captured(caps)).map(FieldValue::Text)
}

fn text_vin(caps: &Captures<'_>, _: &ExtractContext) -> Option<FieldValue> {
    normalize_vin(captured(caps)).map(FieldValue::Text)
}

fn text_plate(caps: &Captures<'_>, _: &ExtractContext) -> Option<FieldValue> {
    normalize_plate(captured(caps)).map(FieldValue::Text)
}

fn text_writer(caps: &Captures<'_>, _: &ExtractContext) -> Option<FieldValue> {
    valid_service_writer(captured(caps)).map(FieldValue::Text)
}

fn vehicle(caps: &Captures<'_>, ctx: &ExtractContext) -> Option<FieldValue> {
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let make = caps.get(2)?.as_str().trim_matches('-');
    let model = model_tokens(caps.get(3)?.as_str());

    if !valid_vehicle_year(year, ctx.current_year())
        || make.len() < 2
        || model.is_empty()
        || contains_boilerplate(make)
        || contains_boilerplate(&model)
    {
        return None;
    }

    Some(FieldValue::Vehicle {
        year,
        make: make.to_string(),
        model,
    })
}

/// Model words up to the first label, boilerplate word or VIN-length token.
fn model_tokens(raw: &str) -> String {
    strip_trailing_labels(raw)
        .split_whitespace()
        .take_while(|token| token.len() < 11 && !contains_boilerplate(token))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['-', ',', '.'])
        .to_string()
}

/// Month/day/year with a 2- or 4-digit year.
fn date_mdy(caps: &Captures<'_>, ctx: &ExtractContext) -> Option<FieldValue> {
    let year = expand_year(caps.get(3)?.as_str(), ctx.current_year())?;
    build_date(year, caps.get(1)?.as_str(), caps.get(2)?.as_str()).map(FieldValue::Date)
}

fn date_iso(caps: &Captures<'_>, _: &ExtractContext) -> Option<FieldValue> {
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    build_date(year, caps.get(2)?.as_str(), caps.get(3)?.as_str()).map(FieldValue::Date)
}

fn amount_total(caps: &Captures<'_>, _: &ExtractContext) -> Option<FieldValue> {
    plausible_total(captured(caps)).map(FieldValue::Amount)
}

fn amount_positive(caps: &Captures<'_>, _: &ExtractContext) -> Option<FieldValue> {
    positive_amount(captured(caps)).map(FieldValue::Amount)
}

// ═══════════════════════════════════════════
// The table
// ═══════════════════════════════════════════

/// Field rules in evaluation order. Each field is evaluated independently
/// against the full segment text.
pub static FIELD_TABLE: LazyLock<Vec<FieldRules>> = LazyLock::new(|| {
    vec![
        FieldRules {
            kind: FieldKind::CustomerName,
            selection: Selection::FirstValid,
            rules: vec![
                rule(
                    "labeled",
                    r"(?m)\b(?i:customer[ \t]+name|customer|owner|name)[ \t]*:[ \t]*([A-Z][A-Za-z'\-]+(?:[ \t]+[A-Z][A-Za-z'\-\.]*){1,2})",
                    text_name,
                ),
                rule(
                    "last_first",
                    r"\b([A-Z][A-Z'\-]+),[ \t]*([A-Z][a-z][A-Za-z'\-]*)\b",
                    text_last_first,
                ),
                rule(
                    "near_phone",
                    &format!(r"{BARE_NAME}(?:\(\d{{3}}\)[ \t]?|\d{{3}}[.\-])\d{{3}}[.\-]\d{{4}}"),
                    text_name,
                ),
                rule(
                    "near_email",
                    &format!(r"{BARE_NAME}[A-Za-z0-9._%+\-]+@"),
                    text_name,
                ),
            ],
        },
        FieldRules {
            kind: FieldKind::CustomerPhone,
            selection: Selection::FirstValid,
            rules: vec![
                rule(
                    "labeled",
                    &format!(
                        r"(?i:\b(?:phone|telephone|tel|cell|mobile|ph))\.?(?:[ \t]*(?:#|no\.?))?[ \t]*:?[ \t]*({PHONE_BODY})"
                    ),
                    text_phone,
                ),
                rule(
                    "bare",
                    r"(?:\(\d{3}\)[ \t]?|\b\d{3}[.\-])\d{3}[.\-]\d{4}\b",
                    text_phone,
                ),
            ],
        },
        FieldRules {
            kind: FieldKind::CustomerEmail,
            selection: Selection::FirstValid,
            rules: vec![rule(
                "address",
                r"(?i)\b[A-Z0-9._%+\-]+@[A-Z0-9.\-]+\.[A-Z]{2,}\b",
                text_email,
            )],
        },
        FieldRules {
            kind: FieldKind::Vin,
            selection: Selection::FirstValid,
            rules: vec![
                rule(
                    "labeled",
                    r"(?i:\bVIN)(?:[ \t]*(?:#|no\.?|number))?[ \t]*[:#]?[ \t]*([A-Za-z0-9]{17})\b",
                    text_vin,
                ),
                rule("bare", r"\b([A-HJ-NPR-Z0-9]{17})\b", text_vin),
            ],
        },
        FieldRules {
            kind: FieldKind::Vehicle,
            selection: Selection::FirstValid,
            rules: vec![rule(
                "year_make_model",
                r"(?m)(?:^|[ \t(])((?:19|20)\d{2})[ \t]+([A-Z][A-Za-z\-]+)[ \t]+([A-Z0-9][A-Za-z0-9\-]*(?:[ \t]+[A-Z0-9][A-Za-z0-9\-]*){0,2})",
                vehicle,
            )],
        },
        FieldRules {
            kind: FieldKind::LicensePlate,
            selection: Selection::FirstValid,
            rules: vec![rule(
                "labeled",
                r"(?i:\b(?:license[ \t]+plate|license|lic|plate|tag))\b(?:[ \t]*(?:#|no\.?|number))?[ \t]*[:#]?[ \t]*([A-Z0-9][A-Z0-9\-]*(?:[ ][A-Z]*\d[A-Z0-9\-]*)?)",
                text_plate,
            )],
        },
        FieldRules {
            kind: FieldKind::ServiceDate,
            selection: Selection::Earliest,
            rules: vec![
                rule(
                    "month_day_year",
                    r"\b(\d{1,2})[/\-](\d{1,2})[/\-](\d{4}|\d{2})\b",
                    date_mdy,
                ),
                rule("iso", r"\b(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})\b", date_iso),
            ],
        },
        FieldRules {
            kind: FieldKind::TotalAmount,
            selection: Selection::Maximum,
            rules: vec![rule(
                "labeled",
                &format!(
                    r"(?i:\b(?:grand[ \t]+total|total[ \t]+due|total[ \t]+amount|amount[ \t]+due|balance(?:[ \t]+due)?|total))\b{AMOUNT_BODY}"
                ),
                amount_total,
            )],
        },
        FieldRules {
            kind: FieldKind::PartsCost,
            selection: Selection::FirstValid,
            rules: vec![rule(
                "labeled",
                &format!(
                    r"(?i:\b(?:total[ \t]+parts|parts[ \t]+total|parts(?:[ \t]+(?:cost|subtotal|amount))?))\b{AMOUNT_BODY}"
                ),
                amount_positive,
            )],
        },
        FieldRules {
            kind: FieldKind::LaborCost,
            selection: Selection::FirstValid,
            rules: vec![rule(
                "labeled",
                &format!(
                    r"(?i:\b(?:total[ \t]+labou?r|labou?r[ \t]+total|labou?r(?:[ \t]+(?:cost|subtotal|amount|charges?))?))\b{AMOUNT_BODY}"
                ),
                amount_positive,
            )],
        },
        FieldRules {
            kind: FieldKind::ServiceWriter,
            selection: Selection::FirstValid,
            rules: vec![rule(
                "labeled",
                r"(?i:\b(?:service[ \t]+writer|service[ \t]+advisor|writer|advisor|technician|tech|serviced[ \t]+by))\b[ \t]*[:#]?[ \t]*([A-Z][A-Za-z'\.\-]*(?:[ \t]+[A-Z][A-Za-z'\.\-]*){0,2})",
                text_writer,
            )],
        },
    ]
});

/// Rules for one field.
pub fn rules_for(kind: FieldKind) -> Option<&'static FieldRules> {
    FIELD_TABLE.iter().find(|f| f.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_field_once() {
        let kinds = [
            FieldKind::CustomerName,
            FieldKind::CustomerPhone,
            FieldKind::CustomerEmail,
            FieldKind::Vin,
            FieldKind::Vehicle,
            FieldKind::LicensePlate,
            FieldKind::ServiceDate,
            FieldKind::TotalAmount,
            FieldKind::PartsCost,
            FieldKind::LaborCost,
            FieldKind::ServiceWriter,
        ];
        assert_eq!(FIELD_TABLE.len(), kinds.len());
        for kind in kinds {
            let count = FIELD_TABLE.iter().filter(|f| f.kind == kind).count();
            assert_eq!(count, 1, "{}", kind.as_str());
        }
    }

    #[test]
    fn selection_policies() {
        assert_eq!(rules_for(FieldKind::ServiceDate).unwrap().selection, Selection::Earliest);
        assert_eq!(rules_for(FieldKind::TotalAmount).unwrap().selection, Selection::Maximum);
        assert_eq!(rules_for(FieldKind::PartsCost).unwrap().selection, Selection::FirstValid);
    }

    #[test]
    fn labeled_rules_come_first() {
        for kind in [FieldKind::CustomerName, FieldKind::CustomerPhone, FieldKind::Vin] {
            assert_eq!(rules_for(kind).unwrap().rules[0].name, "labeled");
        }
    }

    #[test]
    fn context_year() {
        let ctx = ExtractContext::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(ctx.current_year(), 2026);
    }
}
