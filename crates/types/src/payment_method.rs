use serde::{Deserialize, Serialize};

/// Payment method created from the customer's details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub payment_type: String,
}

impl PaymentMethod {
    pub fn new(id: impl Into<String>, payment_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payment_type: payment_type.into(),
        }
    }
}
