//! Sensitive-data categories.
//!
//! A category is either one of the closed set of built-in tags or an
//! organization-defined label introduced by a custom pattern. Both travel as
//! plain snake_case strings on the wire.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The label used for custom findings that declared no meaningful category.
pub const GENERIC_CUSTOM_LABEL: &str = "custom";

/// Built-in categories, listed in the order their matchers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltInCategory {
    PrivateKeyBlock,
    CloudAccessKey,
    GenericApiKey,
    PaymentCard,
    Iban,
    Email,
    NationalId,
    Phone,
    IpAddress,
    DateOfBirth,
    CardExpiry,
    Passport,
    MedicalRecord,
    AccountNumber,
}

impl BuiltInCategory {
    pub const ALL: [BuiltInCategory; 14] = [
        BuiltInCategory::PrivateKeyBlock,
        BuiltInCategory::CloudAccessKey,
        BuiltInCategory::GenericApiKey,
        BuiltInCategory::PaymentCard,
        BuiltInCategory::Iban,
        BuiltInCategory::Email,
        BuiltInCategory::NationalId,
        BuiltInCategory::Phone,
        BuiltInCategory::IpAddress,
        BuiltInCategory::DateOfBirth,
        BuiltInCategory::CardExpiry,
        BuiltInCategory::Passport,
        BuiltInCategory::MedicalRecord,
        BuiltInCategory::AccountNumber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltInCategory::PrivateKeyBlock => "private_key_block",
            BuiltInCategory::CloudAccessKey => "cloud_access_key",
            BuiltInCategory::GenericApiKey => "generic_api_key",
            BuiltInCategory::PaymentCard => "payment_card",
            BuiltInCategory::Iban => "iban",
            BuiltInCategory::Email => "email",
            BuiltInCategory::NationalId => "national_id",
            BuiltInCategory::Phone => "phone",
            BuiltInCategory::IpAddress => "ip_address",
            BuiltInCategory::DateOfBirth => "date_of_birth",
            BuiltInCategory::CardExpiry => "card_expiry",
            BuiltInCategory::Passport => "passport",
            BuiltInCategory::MedicalRecord => "medical_record",
            BuiltInCategory::AccountNumber => "account_number",
        }
    }

    /// Resolves canonical tags plus the synonyms remote classifiers and
    /// organization pattern files commonly use.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let category = match normalized.as_str() {
            "private_key_block" | "private_key" | "pem" => BuiltInCategory::PrivateKeyBlock,
            "cloud_access_key" | "aws_key" | "aws_access_key" | "gcp_key" => {
                BuiltInCategory::CloudAccessKey
            }
            "generic_api_key" | "api_key" | "secret" | "token" | "password" | "credential"
            | "credentials" => BuiltInCategory::GenericApiKey,
            "payment_card" | "credit_card" | "card" | "card_number" => BuiltInCategory::PaymentCard,
            "iban" => BuiltInCategory::Iban,
            "email" | "email_address" => BuiltInCategory::Email,
            "national_id" | "ssn" | "social_security_number" => BuiltInCategory::NationalId,
            "phone" | "phone_number" | "telephone" => BuiltInCategory::Phone,
            "ip_address" | "ip" | "ipv4" => BuiltInCategory::IpAddress,
            "date_of_birth" | "dob" | "birth_date" => BuiltInCategory::DateOfBirth,
            "card_expiry" | "expiry" | "expiration_date" => BuiltInCategory::CardExpiry,
            "passport" | "passport_number" => BuiltInCategory::Passport,
            "medical_record" | "mrn" => BuiltInCategory::MedicalRecord,
            "account_number" | "bank_account" => BuiltInCategory::AccountNumber,
            _ => return None,
        };
        Some(category)
    }
}

impl fmt::Display for BuiltInCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected span's category: closed built-in set or open custom label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    BuiltIn(BuiltInCategory),
    Custom(String),
}

impl Category {
    /// The single tag all generic custom findings collapse onto.
    pub fn generic_custom() -> Self {
        Category::Custom(GENERIC_CUSTOM_LABEL.to_string())
    }

    /// Maps a classifier's free-form label onto a category. Known tags and
    /// synonyms become built-ins; anything else is kept verbatim as a custom
    /// label. Host-declared pattern labels never go through here.
    pub fn from_label(label: &str) -> Self {
        match BuiltInCategory::from_label(label) {
            Some(builtin) => Category::BuiltIn(builtin),
            None => Category::Custom(label.trim().to_string()),
        }
    }

    /// Parses a wire tag: only the exact canonical built-in tags become
    /// built-ins.
    pub fn from_tag(tag: &str) -> Self {
        BuiltInCategory::ALL
            .into_iter()
            .find(|builtin| builtin.as_str() == tag)
            .map(Category::BuiltIn)
            .unwrap_or_else(|| Category::Custom(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::BuiltIn(builtin) => builtin.as_str(),
            Category::Custom(label) => label.as_str(),
        }
    }

    pub fn builtin(&self) -> Option<BuiltInCategory> {
        match self {
            Category::BuiltIn(builtin) => Some(*builtin),
            Category::Custom(_) => None,
        }
    }
}

impl From<BuiltInCategory> for Category {
    fn from(value: BuiltInCategory) -> Self {
        Category::BuiltIn(value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::from_tag(s))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Category::from_tag(&tag))
    }
}
