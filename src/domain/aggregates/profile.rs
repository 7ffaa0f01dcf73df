//! Role profiles
//!
//! One typed record per role. Registration is split in two validated steps:
//! contact details (kept as scratch until the profile is completed) and the
//! role specific details that finish the profile.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::domain::aggregates::order::ShippingAddress;
use crate::domain::value_objects::{is_phone_number, ContactType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role { Farmer, Artisan, Industry, User }

impl Role {
    pub fn as_str(self) -> &'static str {
        match self { Self::Farmer => "farmer", Self::Artisan => "artisan", Self::Industry => "industry", Self::User => "user" }
    }
    /// Prefix of the sequential user id, `AMF_1`, `AMA_2`, ...
    pub fn id_prefix(self) -> &'static str {
        match self { Self::Farmer => "AMF", Self::Artisan => "AMA", Self::Industry => "AMI", Self::User => "AU" }
    }
    pub fn user_id(self, sequence: u64) -> String { format!("{}_{}", self.id_prefix(), sequence) }
    /// Where a caller without a profile is sent.
    pub fn registration_route(self) -> &'static str {
        match self {
            Self::Farmer => "/register/farmer", Self::Artisan => "/register/artisan",
            Self::Industry => "/register/industry", Self::User => "/register/user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "farmer" => Ok(Self::Farmer), "artisan" => Ok(Self::Artisan),
            "industry" => Ok(Self::Industry), "user" => Ok(Self::User),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

pub trait RoleProfile: Serialize + DeserializeOwned + Validate + Clone + Send + Sync + 'static {
    const ROLE: Role;
    fn user_id(&self) -> &str;
}

pub fn validate_otp(otp: &str) -> Result<(), ValidationError> {
    if otp.len() == 6 && otp.chars().all(|c| c.is_ascii_digit()) { Ok(()) } else { Err(ValidationError::new("otp_must_be_six_digits")) }
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if is_phone_number(phone.trim()) { Ok(()) } else { Err(ValidationError::new("phone_must_be_ten_digits")) }
}

pub fn validate_contact(contact: &str) -> Result<(), ValidationError> {
    ContactType::detect(contact).map(|_| ()).ok_or_else(|| ValidationError::new("contact_must_be_email_or_phone"))
}

// =============================================================================
// User
// =============================================================================

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistration {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(custom = "validate_contact")]
    pub contact: String,
    #[validate(custom = "validate_otp")]
    pub otp: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UserDetails {
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub contact: String,
    pub contact_type: ContactType,
    pub registered_at: DateTime<Utc>,
    #[serde(flatten)]
    #[validate]
    pub details: UserDetails,
}

impl UserProfile {
    pub fn register(registration: UserRegistration, user_id: String) -> Option<Self> {
        let contact_type = ContactType::detect(&registration.contact)?;
        let contact = registration.contact.trim().to_string();
        let mut details = UserDetails::default();
        match contact_type {
            ContactType::Email => details.email = Some(contact.clone()),
            ContactType::Phone => details.phone = Some(contact.clone()),
        }
        Some(Self { user_id, name: registration.name.trim().to_string(), contact, contact_type, registered_at: Utc::now(), details })
    }

    /// Address used when checkout picks the saved profile address.
    pub fn shipping_address(&self) -> ShippingAddress {
        let phone = match (&self.details.phone, self.contact_type) {
            (Some(phone), _) => phone.clone(),
            (None, ContactType::Phone) => self.contact.clone(),
            (None, ContactType::Email) => String::new(),
        };
        ShippingAddress {
            name: self.name.clone(), phone, address: self.details.address.clone(), city: self.details.city.clone(),
            state: self.details.state.clone(), pincode: self.details.pincode.clone(),
        }
    }
}

impl RoleProfile for UserProfile {
    const ROLE: Role = Role::User;
    fn user_id(&self) -> &str { &self.user_id }
}

// =============================================================================
// Farmer
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FarmerContact {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub date_of_birth: Option<chrono::NaiveDate>,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    pub alternate_phone: Option<String>,
    #[validate(length(min = 1, message = "pin code is required"))]
    pub pin_code: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FarmerRegistration {
    #[serde(flatten)]
    #[validate]
    pub contact: FarmerContact,
    #[validate(custom = "validate_otp")]
    pub otp: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct FarmerDetails {
    #[validate(length(min = 1, message = "account number is required"))]
    pub account_number: String,
    #[validate(length(min = 1, message = "IFSC code is required"))]
    pub ifsc_code: String,
    pub farm_size: String,
    pub number_of_trees: String,
    pub average_production: String,
    pub harvest_month: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FarmerProfile {
    pub user_id: String,
    #[serde(flatten)]
    #[validate]
    pub contact: FarmerContact,
    #[serde(flatten)]
    #[validate]
    pub details: FarmerDetails,
    pub registered_at: DateTime<Utc>,
}

impl RoleProfile for FarmerProfile {
    const ROLE: Role = Role::Farmer;
    fn user_id(&self) -> &str { &self.user_id }
}

// =============================================================================
// Artisan
// =============================================================================

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ArtisanRegistration {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match = "password")]
    pub confirm_password: String,
    pub contact_method: ContactType,
    #[validate(length(min = 1, message = "email or phone is required"))]
    pub contact_value: String,
    #[validate(custom = "validate_otp")]
    pub otp: String,
}

/// What survives of the artisan registration step. The password is dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ArtisanContact {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub contact_method: ContactType,
    #[validate(length(min = 1, message = "email or phone is required"))]
    pub contact_value: String,
}

impl From<ArtisanRegistration> for ArtisanContact {
    fn from(r: ArtisanRegistration) -> Self {
        Self { name: r.name.trim().to_string(), contact_method: r.contact_method, contact_value: r.contact_value.trim().to_string() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ArtisanDetails {
    #[validate(length(min = 1, message = "brand name is required"))]
    pub brand_name: String,
    pub brand_description: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    pub state: String,
    pub pin: String,
    pub city: String,
    #[validate(length(min = 1, message = "account number is required"))]
    pub account_number: String,
    #[validate(length(min = 1, message = "IFSC code is required"))]
    pub ifsc_code: String,
    pub husk_quantity: String,
    pub husk_type: String,
    pub frequency: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ArtisanProfile {
    pub user_id: String,
    #[serde(flatten)]
    #[validate]
    pub contact: ArtisanContact,
    #[serde(flatten)]
    #[validate]
    pub details: ArtisanDetails,
    pub registered_at: DateTime<Utc>,
}

impl ArtisanProfile {
    /// Pickup address prefilled on new product listings.
    pub fn pickup_address(&self) -> String {
        let d = &self.details;
        let mut address = [d.address.trim(), d.city.trim(), d.state.trim()]
            .into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(", ");
        if !d.pin.trim().is_empty() {
            address.push_str(" - ");
            address.push_str(d.pin.trim());
        }
        address
    }
}

impl RoleProfile for ArtisanProfile {
    const ROLE: Role = Role::Artisan;
    fn user_id(&self) -> &str { &self.user_id }
}

// =============================================================================
// Industry
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IndustryContact {
    #[validate(length(min = 1, message = "registrant name is required"))]
    pub registrant_name: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(length(min = 1, message = "company name is required"))]
    pub company_name: String,
    #[validate(length(min = 1, message = "company address is required"))]
    pub company_address: String,
    pub city: String,
    pub state: String,
    pub pin_code: String,
    pub company_phone: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IndustryRegistration {
    #[serde(flatten)]
    #[validate]
    pub contact: IndustryContact,
    #[validate(custom = "validate_otp")]
    pub otp: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct IndustryDetails {
    #[validate(length(min = 1, message = "GST number is required"))]
    pub gst_number: String,
    pub role_of_contact: String,
    #[validate(length(min = 1, message = "account number is required"))]
    pub account_number: String,
    #[validate(length(min = 1, message = "IFSC code is required"))]
    pub ifsc_code: String,
    pub husk_quantity: String,
    pub husk_type: String,
    pub frequency: String,
    pub delivery_mode: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IndustryProfile {
    pub user_id: String,
    #[serde(flatten)]
    #[validate]
    pub contact: IndustryContact,
    #[serde(flatten)]
    #[validate]
    pub details: IndustryDetails,
    pub registered_at: DateTime<Utc>,
}

impl RoleProfile for IndustryProfile {
    const ROLE: Role = Role::Industry;
    fn user_id(&self) -> &str { &self.user_id }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artisan_registration(password: &str, confirm: &str) -> ArtisanRegistration {
        ArtisanRegistration {
            name: "Meera".into(), password: password.into(), confirm_password: confirm.into(),
            contact_method: ContactType::Email, contact_value: "meera@example.com".into(), otp: "123456".into(),
        }
    }

    #[test]
    fn test_role_ids() {
        assert_eq!(Role::Farmer.user_id(3), "AMF_3");
        assert_eq!(Role::Industry.user_id(1), "AMI_1");
        assert_eq!("Artisan".parse::<Role>().unwrap(), Role::Artisan);
    }

    #[test]
    fn test_otp_rules() {
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("12345a").is_err());
    }

    #[test]
    fn test_artisan_password_rules() {
        assert!(artisan_registration("secret1", "secret1").validate().is_ok());
        let errors = artisan_registration("secret1", "secret2").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));
        let errors = artisan_registration("abc", "abc").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_user_registration_detects_contact() {
        let reg = UserRegistration { name: " Asha ".into(), contact: "9876543210".into(), otp: "654321".into() };
        assert!(reg.validate().is_ok());
        let profile = UserProfile::register(reg, Role::User.user_id(1)).unwrap();
        assert_eq!(profile.contact_type, ContactType::Phone);
        assert_eq!(profile.name, "Asha");
        assert_eq!(profile.shipping_address().phone, "9876543210");
    }

    #[test]
    fn test_user_registration_rejects_bad_contact() {
        let reg = UserRegistration { name: "Asha".into(), contact: "not-a-contact".into(), otp: "654321".into() };
        assert!(reg.validate().unwrap_err().field_errors().contains_key("contact"));
    }
}
