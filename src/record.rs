//! Employee records and the decoder that produces them.
//!
//! Input is a JSON array of objects:
//!
//! ```text
//! [
//!   {
//!     "firstName": "John",
//!     "lastName": "Doe",
//!     "active": true,
//!     "socialSecurity": "165-02-2588",
//!     "payments": [8333.33, 8333.33, 8021.45]
//!   }
//! ]
//! ```
//!
//! Records are immutable once decoded. Every later stage builds new records
//! or new collections instead of changing these.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ReportError, Result};

/// One employee's name, activity flag, identifier and payment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(alias = "first")]
    pub first_name: String,
    #[serde(alias = "last")]
    pub last_name: String,
    #[serde(alias = "isActive")]
    pub active: bool,
    pub social_security: String,
    /// One payment per pay period, in period order.
    pub payments: Vec<f64>,
}

impl Employee {
    pub fn new(
        first_name: &str,
        last_name: &str,
        active: bool,
        social_security: &str,
        payments: Vec<f64>,
    ) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            active,
            social_security: social_security.to_string(),
            payments,
        }
    }

    /// Sum of all payments, added left to right from zero with no rounding.
    pub fn total_salary(&self) -> f64 {
        self.payments.iter().fold(0.0, |acc, p| acc + p)
    }

    /// Build a new record with `f` applied to every text field.
    pub fn with_text_fields(&self, f: impl Fn(&str) -> String) -> Self {
        Self {
            first_name: f(&self.first_name),
            last_name: f(&self.last_name),
            active: self.active,
            social_security: f(&self.social_security),
            payments: self.payments.clone(),
        }
    }
}

/// Decode a JSON array of employee objects.
///
/// Text that is not a JSON array fails with `MalformedInput`. An element
/// missing an attribute, or holding one of the wrong type, fails with
/// `ShapeMismatch` naming its index. Nothing is defaulted.
pub fn decode(text: &str) -> Result<Vec<Employee>> {
    let values: Vec<Value> = serde_json::from_str(text).map_err(ReportError::MalformedInput)?;

    let records = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<Employee>(value).map_err(|e| ReportError::ShapeMismatch {
                index,
                detail: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(records = records.len(), "decoded employee records");
    Ok(records)
}
