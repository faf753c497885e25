//! Row types returned by the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A signed-in user, with loyalty columns when the user is a customer.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub phone: Option<String>,
    pub points: Option<i64>,
    pub total_spent: Option<String>,
    pub visit_count: Option<i64>,
    pub tier: Option<String>,
    pub member_status: Option<String>,
    pub enrollment_date: Option<String>,
}

impl AuthenticatedUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// What a login attempt is checked against.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LoginCredentials {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub role: Option<String>,
}

/// Loyalty tier row, serialized with its column names.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct LoyaltyTier {
    pub id: i64,
    pub tier_name: String,
    pub tier_level: i64,
    pub min_spending: Option<String>,
    pub min_visits: Option<i64>,
    pub min_points: Option<i64>,
    pub points_multiplier: Option<String>,
    pub benefits: Option<Value>,
    pub tier_color: Option<String>,
    pub tier_icon: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SystemSetting {
    pub key: String,
    pub value: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub setting_type: Option<String>,
}

/// Type a setting value is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    String,
    Number,
    Boolean,
    Json,
}

impl SettingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingType::String => "string",
            SettingType::Number => "number",
            SettingType::Boolean => "boolean",
            SettingType::Json => "json",
        }
    }

    /// Value used when nothing better is available.
    pub fn zero(&self) -> Value {
        match self {
            SettingType::String => Value::from(""),
            SettingType::Number => Value::from(0),
            SettingType::Boolean => Value::Bool(false),
            SettingType::Json => Value::Object(Default::default()),
        }
    }

    /// Interpret a caller-supplied default, falling back to [`Self::zero`].
    pub fn parse_default(&self, raw: Option<&str>) -> Value {
        match raw {
            Some(raw) => self.parse(raw).unwrap_or_else(|| self.zero()),
            None => self.zero(),
        }
    }

    /// Convert a stored value; `default` when absent or unparsable.
    pub fn convert(&self, stored: Option<&str>, default: Value) -> Value {
        stored.and_then(|v| self.parse(v)).unwrap_or(default)
    }

    fn parse(&self, raw: &str) -> Option<Value> {
        match self {
            SettingType::String => Some(Value::from(raw)),
            SettingType::Number => leading_number(raw).and_then(number_value),
            SettingType::Boolean => Some(Value::Bool(raw.eq_ignore_ascii_case("true"))),
            SettingType::Json => serde_json::from_str(raw).ok(),
        }
    }
}

/// Longest numeric prefix after leading whitespace, so `"12px"` reads as 12.
fn leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 || has_digits {
            has_digits |= frac_end > end + 1;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Whole numbers serialize without a fraction.
fn number_value(n: f64) -> Option<Value> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < MAX_EXACT {
        return Some(Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(Value::Number)
}
