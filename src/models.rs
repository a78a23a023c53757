use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Listing service list response: {result, listings: [...]}
#[derive(Deserialize, Serialize, Debug)]
pub struct ListingsEnvelope {
    pub result: bool,
    pub listings: Vec<Listing>,
}

// A listing as relayed by the gateway. Only `user_id` is read, every other
// field is kept as it came.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Listing {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    // Owner record, only set after a successful lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

impl Listing {
    pub fn owner_id(&self) -> Option<&Value> {
        self.fields.get("user_id")
    }
}

// User service get-by-id response: {result, user}
#[derive(Deserialize, Debug)]
pub struct UserEnvelope {
    pub result: bool,
    #[serde(default)]
    pub user: Value,
}

// Gateway reply for get-listings
#[derive(Serialize, Debug)]
pub struct EnrichedListings {
    pub result: bool,
    pub listings: Vec<Listing>,
}

impl EnrichedListings {
    pub fn ok(listings: Vec<Listing>) -> Self {
        Self {
            result: true,
            listings,
        }
    }
}
