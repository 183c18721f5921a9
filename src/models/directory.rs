use serde::{Deserialize, Serialize};

/// A customer as seen by the intake pipeline. Owned by the shop directory;
/// the pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDirectoryEntry {
    pub id: String,
    pub shop_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl CustomerDirectoryEntry {
    /// "First Last", trimmed. Empty when both parts are blank.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// A vehicle registered to a directory customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDirectoryEntry {
    pub id: String,
    pub customer_id: String,
    pub vin: Option<String>,
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub license_plate: Option<String>,
}

/// Read-once view of one shop's customers and vehicles.
///
/// Loaded at the start of a batch and shared (behind an `Arc`) by every
/// item of that batch. Never refreshed mid-batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub shop_id: String,
    pub customers: Vec<CustomerDirectoryEntry>,
    pub vehicles: Vec<VehicleDirectoryEntry>,
}

impl DirectorySnapshot {
    pub fn new(
        shop_id: impl Into<String>,
        customers: Vec<CustomerDirectoryEntry>,
        vehicles: Vec<VehicleDirectoryEntry>,
    ) -> Self {
        Self {
            shop_id: shop_id.into(),
            customers,
            vehicles,
        }
    }

    pub fn customer(&self, id: &str) -> Option<&CustomerDirectoryEntry> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn vehicle(&self, id: &str) -> Option<&VehicleDirectoryEntry> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    /// Vehicles owned by `customer_id`, in directory order.
    pub fn vehicles_of<'a, 'b>(
        &'a self,
        customer_id: &'b str,
    ) -> impl Iterator<Item = &'a VehicleDirectoryEntry> + 'b
    where
        'a: 'b,
    {
        self.vehicles
            .iter()
            .filter(move |v| v.customer_id == customer_id)
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}
