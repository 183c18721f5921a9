use super::rules::{rules_for, ExtractContext, FieldKind, FieldRules, FieldValue, Selection, FIELD_TABLE};
use crate::models::ExtractedFields;

/// Extract all recognizable fields from one repair order's text.
///
/// Never fails: fields that are absent or fail validation stay `None`.
pub fn extract_fields(text: &str) -> ExtractedFields {
    extract_fields_with(text, &ExtractContext::today())
}

/// Same as [`extract_fields`] with an explicit context (pinned "today").
pub fn extract_fields_with(text: &str, ctx: &ExtractContext) -> ExtractedFields {
    let mut fields = ExtractedFields::default();
    if text.trim().is_empty() {
        return fields;
    }

    for field in FIELD_TABLE.iter() {
        if let Some(value) = evaluate(field, text, ctx) {
            apply(&mut fields, field.kind, value);
        }
    }

    tracing::debug!(
        populated = fields.populated_count(),
        chars = text.len(),
        "Extracted repair order fields"
    );
    fields
}

/// Evaluate a single field in isolation.
pub fn extract_field(kind: FieldKind, text: &str, ctx: &ExtractContext) -> Option<FieldValue> {
    rules_for(kind).and_then(|field| evaluate(field, text, ctx))
}

/// Apply one field's rules under its selection policy.
pub fn evaluate(field: &FieldRules, text: &str, ctx: &ExtractContext) -> Option<FieldValue> {
    match field.selection {
        Selection::FirstValid => field.rules.iter().find_map(|rule| {
            rule.pattern
                .captures_iter(text)
                .find_map(|caps| (rule.normalize)(&caps, ctx))
        }),
        Selection::Earliest => candidates(field, text, ctx)
            .into_iter()
            .filter_map(|value| match value {
                FieldValue::Date(date) => Some(date),
                _ => None,
            })
            .min()
            .map(FieldValue::Date),
        Selection::Maximum => candidates(field, text, ctx)
            .into_iter()
            .filter_map(|value| match value {
                FieldValue::Amount(amount) => Some(amount),
                _ => None,
            })
            .max_by(f64::total_cmp)
            .map(FieldValue::Amount),
    }
}

/// Every validated candidate across all rules, in rule then text order.
fn candidates(field: &FieldRules, text: &str, ctx: &ExtractContext) -> Vec<FieldValue> {
    field
        .rules
        .iter()
        .flat_map(|rule| {
            rule.pattern
                .captures_iter(text)
                .filter_map(|caps| (rule.normalize)(&caps, ctx))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn apply(fields: &mut ExtractedFields, kind: FieldKind, value: FieldValue) {
    match (kind, value) {
        (FieldKind::CustomerName, FieldValue::Text(v)) => fields.customer_name = Some(v),
        (FieldKind::CustomerPhone, FieldValue::Text(v)) => fields.customer_phone = Some(v),
        (FieldKind::CustomerEmail, FieldValue::Text(v)) => fields.customer_email = Some(v),
        (FieldKind::Vin, FieldValue::Text(v)) => fields.vin = Some(v),
        (FieldKind::Vehicle, FieldValue::Vehicle { year, make, model }) => {
            fields.vehicle_year = Some(year);
            fields.vehicle_make = Some(make);
            fields.vehicle_model = Some(model);
        }
        (FieldKind::LicensePlate, FieldValue::Text(v)) => fields.license_plate = Some(v),
        (FieldKind::ServiceDate, FieldValue::Date(d)) => fields.service_date = Some(d),
        (FieldKind::TotalAmount, FieldValue::Amount(a)) => fields.total_amount = Some(a),
        (FieldKind::PartsCost, FieldValue::Amount(a)) => fields.parts_cost = Some(a),
        (FieldKind::LaborCost, FieldValue::Amount(a)) => fields.labor_cost = Some(a),
        (FieldKind::ServiceWriter, FieldValue::Text(v)) => fields.service_writer = Some(v),
        (kind, value) => {
            tracing::warn!(field = kind.as_str(), ?value, "Rule produced a value of the wrong shape");
        }
    }
}
