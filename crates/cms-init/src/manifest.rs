//! Declarative manifest of everything the seeder ensures exists: one admin
//! account, default role access policies, and the baseline lookup records.
//! Built once at startup, never mutated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use validator::Validate;

/// Baseline privileged account. The plaintext password is hashed before it
/// reaches the store and an existing account is never modified.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminDescriptor {
    #[validate(length(min = 1, message = "Username must not be empty"))]
    pub username: String,
    #[validate(email(message = "Invalid admin email address"))]
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub is_active: bool,
}

/// One record to ensure exists in a collection, keyed by `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRecord {
    pub name: String,
    /// Collection-specific attributes (capacity/description, icon/description).
    pub attrs: Value,
}

impl LookupRecord {
    pub fn new(name: &str, attrs: Value) -> Self {
        Self {
            name: name.to_string(),
            attrs,
        }
    }

    /// Flattens the record into the object handed to the store.
    pub fn to_value(&self) -> Value {
        let mut object = match &self.attrs {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        object.insert("name".to_string(), Value::String(self.name.clone()));
        Value::Object(object)
    }
}

/// An ordered batch of lookup records targeting one collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSet {
    pub collection: String,
    pub records: Vec<LookupRecord>,
}

/// Content-type actions to allow for a built-in role. A role that is not
/// present in the store is skipped, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub role_type: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub admin: AdminDescriptor,
    pub access: Vec<AccessPolicy>,
    pub record_sets: Vec<RecordSet>,
}

impl Manifest {
    /// The baseline manifest for a fresh hostel CMS installation.
    pub fn baseline(admin: AdminDescriptor) -> Self {
        Self {
            admin,
            access: vec![
                AccessPolicy {
                    role_type: "public".to_string(),
                    actions: vec![
                        "api::room.room.find".to_string(),
                        "api::room.room.findOne".to_string(),
                        "api::booking.booking.find".to_string(),
                        "api::booking.booking.findOne".to_string(),
                    ],
                },
                AccessPolicy {
                    role_type: "authenticated".to_string(),
                    actions: vec![
                        "api::room.room.find".to_string(),
                        "api::room.room.findOne".to_string(),
                        "api::booking.booking.find".to_string(),
                        "api::booking.booking.findOne".to_string(),
                        "api::booking.booking.create".to_string(),
                    ],
                },
            ],
            record_sets: vec![
                RecordSet {
                    collection: "room_types".to_string(),
                    records: vec![
                        LookupRecord::new(
                            "Single Room",
                            json!({"capacity": 1, "description": "Private single bed room"}),
                        ),
                        LookupRecord::new(
                            "Double Room",
                            json!({"capacity": 2, "description": "Private double bed room"}),
                        ),
                        LookupRecord::new(
                            "Dormitory 4",
                            json!({"capacity": 4, "description": "4-bed shared dormitory"}),
                        ),
                        LookupRecord::new(
                            "Dormitory 6",
                            json!({"capacity": 6, "description": "6-bed shared dormitory"}),
                        ),
                        LookupRecord::new(
                            "Dormitory 8",
                            json!({"capacity": 8, "description": "8-bed shared dormitory"}),
                        ),
                    ],
                },
                RecordSet {
                    collection: "facilities".to_string(),
                    records: vec![
                        LookupRecord::new(
                            "WiFi",
                            json!({"icon": "wifi", "description": "Free wireless internet"}),
                        ),
                        LookupRecord::new(
                            "Air Conditioning",
                            json!({"icon": "snowflake", "description": "Climate control"}),
                        ),
                        LookupRecord::new(
                            "Private Bathroom",
                            json!({"icon": "bath", "description": "En-suite bathroom"}),
                        ),
                        LookupRecord::new(
                            "Shared Kitchen",
                            json!({"icon": "utensils", "description": "Common kitchen area"}),
                        ),
                        LookupRecord::new(
                            "Laundry",
                            json!({"icon": "tshirt", "description": "Washing facilities"}),
                        ),
                        LookupRecord::new(
                            "Parking",
                            json!({"icon": "car", "description": "Vehicle parking"}),
                        ),
                        LookupRecord::new(
                            "Breakfast",
                            json!({"icon": "coffee", "description": "Continental breakfast"}),
                        ),
                        LookupRecord::new(
                            "24h Reception",
                            json!({"icon": "clock", "description": "24-hour front desk"}),
                        ),
                    ],
                },
            ],
        }
    }
}
