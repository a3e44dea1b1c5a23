use serde::{Deserialize, Serialize};
use std::fmt;

/// Website placeholder used when a provider record carries no usable URL.
pub const WEBSITE_SENTINEL: &str = "#";
/// Domain placeholder used when no hostname can be derived.
pub const DOMAIN_SENTINEL: &str = "google.com";

/// Coarse confidence label attached to a lead's contact email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailVerificationStatus {
    Valid,
    Risky,
    Invalid,
    #[default]
    Unknown,
}

/// Category of business behind a lead. Sources that have no category (search
/// terms, hashtags) keep their label verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BusinessType {
    Retailer,
    Wholesaler,
    Brand,
    Broker,
    Other(String),
}

impl BusinessType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Retailer => "Retailer",
            Self::Wholesaler => "Wholesaler",
            Self::Brand => "Brand",
            Self::Broker => "Broker",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for BusinessType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Retailer" => Self::Retailer,
            "Wholesaler" => Self::Wholesaler,
            "Brand" => Self::Brand,
            "Broker" => Self::Broker,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for BusinessType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<BusinessType> for String {
    fn from(value: BusinessType) -> Self {
        match value {
            BusinessType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized candidate business contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub company_name: String,
    pub website: String,
    pub country: String,
    pub region: String,
    pub business_type: BusinessType,
    pub contact_name: String,
    pub contact_role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_email: Option<String>,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_email: Option<String>,
    #[serde(default)]
    pub email_verification_status: EmailVerificationStatus,
    #[serde(default)]
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Lead {
    /// Address shown to the operator. An extracted address always wins.
    pub fn contact_email(&self) -> Option<&str> {
        self.raw_email
            .as_deref()
            .filter(|email| !email.is_empty())
            .or(self.predicted_email.as_deref())
    }
}

/// Operator-side filter over a lead list. Empty criteria match everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilter {
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub business_types: Vec<String>,
    #[serde(default)]
    pub keywords: String,
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        let region_ok = self.regions.is_empty() || self.regions.iter().any(|r| r == &lead.region);
        let type_ok = self.business_types.is_empty()
            || self
                .business_types
                .iter()
                .any(|t| t == lead.business_type.as_str());
        let keyword = self.keywords.trim().to_lowercase();
        let keyword_ok =
            keyword.is_empty() || lead.company_name.to_lowercase().contains(&keyword);

        region_ok && type_ok && keyword_ok
    }

    pub fn apply<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        leads.iter().filter(|lead| self.matches(lead)).collect()
    }
}
