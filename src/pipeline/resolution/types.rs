use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════
// Strategy enums
// ═══════════════════════════════════════════

/// Which customer-cascade step produced the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerMatch {
    Vin,
    Phone,
    Email,
    Name,
    /// Chosen by an operator, not by the cascade.
    Manual,
}

impl CustomerMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vin => "vin",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Name => "name",
            Self::Manual => "manual",
        }
    }
}

/// Which vehicle-cascade step produced the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleMatch {
    Vin,
    LicensePlate,
    YearMakeModel,
    Manual,
}

impl VehicleMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vin => "vin",
            Self::LicensePlate => "license_plate",
            Self::YearMakeModel => "year_make_model",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    AutoMatched,
    NeedsManualReview,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoMatched => "auto_matched",
            Self::NeedsManualReview => "needs_manual_review",
        }
    }
}

// ═══════════════════════════════════════════
// Resolution
// ═══════════════════════════════════════════

/// Outcome of running both cascades for one segment.
///
/// `vehicle_id` is only ever set together with `customer_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub customer_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub customer_match: Option<CustomerMatch>,
    pub vehicle_match: Option<VehicleMatch>,
}

impl Resolution {
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn is_matched(&self) -> bool {
        self.customer_id.is_some()
    }

    pub fn classification(&self) -> Classification {
        if self.is_matched() {
            Classification::AutoMatched
        } else {
            Classification::NeedsManualReview
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_needs_review() {
        let r = Resolution::unresolved();
        assert!(!r.is_matched());
        assert_eq!(r.classification(), Classification::NeedsManualReview);
    }

    #[test]
    fn customer_makes_it_auto_matched() {
        let r = Resolution {
            customer_id: Some("c1".into()),
            customer_match: Some(CustomerMatch::Phone),
            ..Default::default()
        };
        assert_eq!(r.classification(), Classification::AutoMatched);
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&VehicleMatch::YearMakeModel).unwrap(),
            "\"year_make_model\""
        );
        assert_eq!(Classification::NeedsManualReview.as_str(), "needs_manual_review");
        assert_eq!(CustomerMatch::Vin.as_str(), "vin");
    }
}
