//! Donor Model

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::history::HistoryEntry;

/// Donor role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum DonorRole {
    #[default]
    Donor,
    Admin,
}

/// Registered user who may donate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub blood_group: String,
    pub division: String,
    pub district: String,
    pub upazila: String,
    pub area: String,
    pub want_to_donate: bool,
    /// While set and in the future, `want_to_donate` is false
    pub disabled_until: Option<i64>,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub role: DonorRole,
    pub created_at: i64,
    pub updated_at: i64,
    /// Embedded acceptance history, oldest first
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub donation_history: Vec<HistoryEntry>,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorCreate {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub blood_group: String,
    pub division: String,
    pub district: String,
    #[serde(default)]
    pub upazila: String,
    #[serde(default)]
    pub area: String,
    pub want_to_donate: Option<bool>,
}

/// Reference to a donor inside a request's candidate or selected list.
///
/// Accepts a JSON number or a (possibly padded) numeric string and always
/// serializes as the canonical decimal string, so membership checks never
/// miss on representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DonorRef(pub i64);

impl DonorRef {
    pub fn id(&self) -> i64 {
        self.0
    }

    /// Canonical string form used for comparisons and on the wire
    pub fn canonical(&self) -> String {
        self.0.to_string()
    }
}

impl From<i64> for DonorRef {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DonorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DonorRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(DonorRef)
            .map_err(|_| format!("invalid donor id: {s:?}"))
    }
}

impl Serialize for DonorRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DonorRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DonorRefVisitor;

        impl Visitor<'_> for DonorRefVisitor {
            type Value = DonorRef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a donor id as integer or numeric string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<DonorRef, E> {
                Ok(DonorRef(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<DonorRef, E> {
                i64::try_from(v)
                    .map(DonorRef)
                    .map_err(|_| E::custom(format!("donor id out of range: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<DonorRef, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DonorRefVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn donor_ref_accepts_number_and_string() {
        let a: DonorRef = serde_json::from_str("42").unwrap();
        let b: DonorRef = serde_json::from_str("\" 42 \"").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.canonical(), "42");
    }

    #[test]
    fn donor_ref_serializes_as_string() {
        let json = serde_json::to_string(&vec![DonorRef(7), DonorRef(8)]).unwrap();
        assert_eq!(json, r#"["7","8"]"#);
    }

    #[test]
    fn donor_ref_rejects_garbage() {
        assert!(serde_json::from_str::<DonorRef>("\"abc\"").is_err());
        assert!(serde_json::from_str::<DonorRef>("1.5").is_err());
    }
}
