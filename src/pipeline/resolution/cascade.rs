use super::types::{CustomerMatch, Resolution, VehicleMatch};
use crate::models::{CustomerDirectoryEntry, DirectorySnapshot, ExtractedFields, VehicleDirectoryEntry};
use crate::pipeline::fields::normalize_phone;

/// Resolve one segment's fields against the shop directory.
///
/// The vehicle cascade only runs once a customer is found and only looks
/// at that customer's vehicles.
pub fn resolve(fields: &ExtractedFields, snapshot: &DirectorySnapshot) -> Resolution {
    let Some((customer, customer_match)) = resolve_customer(fields, snapshot) else {
        tracing::debug!(shop_id = %snapshot.shop_id, "No customer match, needs manual review");
        return Resolution::unresolved();
    };

    let vehicle = resolve_vehicle(fields, snapshot, &customer.id);

    tracing::debug!(
        shop_id = %snapshot.shop_id,
        customer_id = %customer.id,
        strategy = customer_match.as_str(),
        vehicle = vehicle.map(|(_, m)| m.as_str()).unwrap_or("none"),
        "Resolved repair order"
    );

    Resolution {
        customer_id: Some(customer.id.clone()),
        vehicle_id: vehicle.map(|(v, _)| v.id.clone()),
        customer_match: Some(customer_match),
        vehicle_match: vehicle.map(|(_, m)| m),
    }
}

/// Customer cascade: VIN, phone, email, name. First success wins.
pub fn resolve_customer<'a>(
    fields: &ExtractedFields,
    snapshot: &'a DirectorySnapshot,
) -> Option<(&'a CustomerDirectoryEntry, CustomerMatch)> {
    by_vin(fields, snapshot)
        .map(|c| (c, CustomerMatch::Vin))
        .or_else(|| by_phone(fields, snapshot).map(|c| (c, CustomerMatch::Phone)))
        .or_else(|| by_email(fields, snapshot).map(|c| (c, CustomerMatch::Email)))
        .or_else(|| by_name(fields, snapshot).map(|c| (c, CustomerMatch::Name)))
}

/// Vehicle cascade within one customer's vehicles: VIN, plate,
/// year + make + model.
pub fn resolve_vehicle<'a>(
    fields: &ExtractedFields,
    snapshot: &'a DirectorySnapshot,
    customer_id: &str,
) -> Option<(&'a VehicleDirectoryEntry, VehicleMatch)> {
    let owned: Vec<&'a VehicleDirectoryEntry> = snapshot.vehicles_of(customer_id).collect();

    if let Some(vin) = fields.vin.as_deref() {
        if let Some(v) = owned.iter().find(|v| vin_eq(v.vin.as_deref(), vin)) {
            return Some((v, VehicleMatch::Vin));
        }
    }

    if let Some(plate) = fields.license_plate.as_deref() {
        let wanted = squash(plate);
        if let Some(v) = owned
            .iter()
            .find(|v| v.license_plate.as_deref().is_some_and(|p| squash(p) == wanted))
        {
            return Some((v, VehicleMatch::LicensePlate));
        }
    }

    if let (Some(year), Some(make), Some(model)) = (
        fields.vehicle_year,
        fields.vehicle_make.as_deref(),
        fields.vehicle_model.as_deref(),
    ) {
        if let Some(v) = owned.iter().find(|v| {
            v.year == Some(year)
                && v.make.as_deref().is_some_and(|m| m.trim().eq_ignore_ascii_case(make))
                && v.model.as_deref().is_some_and(|m| contains_either_way(m, model))
        }) {
            return Some((v, VehicleMatch::YearMakeModel));
        }
    }

    None
}

fn by_vin<'a>(fields: &ExtractedFields, snapshot: &'a DirectorySnapshot) -> Option<&'a CustomerDirectoryEntry> {
    let vin = fields.vin.as_deref()?;
    snapshot
        .vehicles
        .iter()
        .filter(|v| vin_eq(v.vin.as_deref(), vin))
        .find_map(|v| snapshot.customer(&v.customer_id))
}

fn by_phone<'a>(fields: &ExtractedFields, snapshot: &'a DirectorySnapshot) -> Option<&'a CustomerDirectoryEntry> {
    let phone = normalize_phone(fields.customer_phone.as_deref()?);
    if phone.is_empty() {
        return None;
    }
    snapshot
        .customers
        .iter()
        .find(|c| c.phone.as_deref().is_some_and(|p| normalize_phone(p) == phone))
}

fn by_email<'a>(fields: &ExtractedFields, snapshot: &'a DirectorySnapshot) -> Option<&'a CustomerDirectoryEntry> {
    let email = fields.customer_email.as_deref()?.trim();
    if email.is_empty() {
        return None;
    }
    snapshot
        .customers
        .iter()
        .find(|c| c.email.as_deref().is_some_and(|e| e.trim().eq_ignore_ascii_case(email)))
}

/// Either name contains the other, case-insensitively. Directory entries
/// with a blank full name never match.
fn by_name<'a>(fields: &ExtractedFields, snapshot: &'a DirectorySnapshot) -> Option<&'a CustomerDirectoryEntry> {
    let name = fields.customer_name.as_deref()?.trim();
    if name.is_empty() {
        return None;
    }
    snapshot.customers.iter().find(|c| {
        let full = c.full_name();
        !full.is_empty() && contains_either_way(&full, name)
    })
}

fn vin_eq(directory_vin: Option<&str>, vin: &str) -> bool {
    directory_vin.is_some_and(|d| d.trim().eq_ignore_ascii_case(vin))
}

fn squash(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn contains_either_way(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
}
