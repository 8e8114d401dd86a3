//! Customer models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer of the store
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub customer_id: Uuid,
    pub fname: String,
    pub lname: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Display name used in order responses
    pub fn full_name(&self) -> String {
        format!("{} {}", self.fname, self.lname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_full_name() {
        let customer = Customer {
            customer_id: Uuid::new_v4(),
            fname: "สมศรี".to_string(),
            lname: "ใจดี".to_string(),
            phone: "0812345678".to_string(),
            email: None,
            address: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(customer.full_name(), "สมศรี ใจดี");
    }
}
