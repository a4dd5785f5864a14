use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::attachment::Attachment;

/// Stable identity of an expense. Legacy records persisted without an id load
/// as the nil id and are re-keyed by the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(Uuid);

impl ExpenseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default)]
    pub id: ExpenseId,
    pub date: String, // YYYY-MM-DD
    #[serde(default)]
    pub category: String,
    /// Older data may hold `null` here (a NaN serialised to JSON); it loads as NaN.
    #[serde(default = "missing_amount", deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

fn missing_amount() -> f64 {
    f64::NAN
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let amount = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(amount.unwrap_or_else(|| {
        warn!(value = %value, "expense amount is not a number, loading as NaN");
        f64::NAN
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub logo: Option<Attachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetails {
    #[serde(default)]
    pub emp_code: String,
    #[serde(default)]
    pub emp_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub reporting_head: String,
}
