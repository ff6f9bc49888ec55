//! Location step rules: new-address validation and primary-address
//! resolution.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::EntityId;
use crate::validation::{non_blank, FieldErrors};

/// Contact channels a requester may opt into.
pub const VALID_CONTACT_METHODS: &[&str] = &["email", "phone", "text"];

/// How much of an address is shown publicly on a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyDisplay {
    Exact,
    #[default]
    CityState,
    ZipOnly,
}

impl PrivacyDisplay {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::CityState => "city_state",
            Self::ZipOnly => "zip_only",
        }
    }

    pub fn from_str_db(s: &str) -> Option<Self> {
        match s {
            "exact" => Some(Self::Exact),
            "city_state" => Some(Self::CityState),
            "zip_only" => Some(Self::ZipOnly),
            _ => None,
        }
    }
}

impl TryFrom<String> for PrivacyDisplay {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_db(&value)
            .ok_or_else(|| CoreError::Validation(format!("Invalid privacy display '{value}'")))
    }
}

/// Raw new-address fields as submitted by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAddressInput {
    pub address: Option<String>,
    pub address_ext: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub privacy_display: Option<PrivacyDisplay>,
    #[serde(default)]
    pub contact_methods: Vec<String>,
    pub preferred_contact_time: Option<String>,
}

/// A validated, trimmed address ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewAddress {
    #[validate(length(max = 200, message = "Street address must be at most 200 characters"))]
    pub address: String,
    #[validate(length(max = 100, message = "Address line 2 must be at most 100 characters"))]
    pub address_ext: Option<String>,
    #[validate(length(max = 100, message = "City must be at most 100 characters"))]
    pub city: String,
    #[validate(length(max = 64, message = "State must be at most 64 characters"))]
    pub state: String,
    pub zip_code: String,
    pub privacy_display: PrivacyDisplay,
    pub contact_methods: Vec<String>,
    #[validate(length(max = 100, message = "Preferred contact time must be at most 100 characters"))]
    pub preferred_contact_time: Option<String>,
}

/// The caller's choice on the location step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LocationSelection {
    /// Reuse one of the caller's saved addresses.
    Existing {
        address_id: EntityId,
        #[serde(default)]
        make_primary: bool,
    },
    /// Save a new address.
    New {
        address: NewAddressInput,
        #[serde(default)]
        make_primary: bool,
    },
}

/// Validate new-address fields. Street, city, state and ZIP are required.
pub fn validate_new_address(input: &NewAddressInput) -> Result<NewAddress, FieldErrors> {
    let mut errors = FieldErrors::new();

    let address = non_blank(input.address.as_deref());
    let city = non_blank(input.city.as_deref());
    let state = non_blank(input.state.as_deref());
    let zip_code = non_blank(input.zip_code.as_deref());

    if address.is_none() {
        errors.add("address", "Street address is required");
    }
    if city.is_none() {
        errors.add("city", "City is required");
    }
    if state.is_none() {
        errors.add("state", "State is required");
    }
    match zip_code.as_deref() {
        None => errors.add("zip_code", "ZIP code is required"),
        Some(zip) if !is_valid_zip(zip) => {
            errors.add("zip_code", "ZIP code must be 5 digits or ZIP+4 (12345-6789)")
        }
        Some(_) => {}
    }

    let mut contact_methods: Vec<String> = Vec::new();
    for method in &input.contact_methods {
        let method = method.trim().to_lowercase();
        if method.is_empty() {
            continue;
        }
        if !VALID_CONTACT_METHODS.contains(&method.as_str()) {
            errors.add(
                "contact_methods",
                format!("Unknown contact method '{method}'. Must be one of: {VALID_CONTACT_METHODS:?}"),
            );
        } else if !contact_methods.contains(&method) {
            contact_methods.push(method);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let validated = NewAddress {
        address: address.unwrap_or_default(),
        address_ext: non_blank(input.address_ext.as_deref()),
        city: city.unwrap_or_default(),
        state: state.unwrap_or_default(),
        zip_code: zip_code.unwrap_or_default(),
        privacy_display: input.privacy_display.unwrap_or_default(),
        contact_methods,
        preferred_contact_time: non_blank(input.preferred_contact_time.as_deref()),
    };
    validated.validate()?;
    Ok(validated)
}

fn is_valid_zip(zip: &str) -> bool {
    let digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());
    match zip.split_once('-') {
        None => digits(zip, 5),
        Some((base, ext)) => digits(base, 5) && digits(ext, 4),
    }
}

/// A new address becomes primary when it is the caller's first address, or
/// when the caller asked for it.
pub fn new_address_becomes_primary(existing_address_count: usize, requested: bool) -> bool {
    existing_address_count == 0 || requested
}

/// True whenever the address resolved for a need is not the user's primary.
pub fn uses_non_primary_address(resolved: EntityId, primary: Option<EntityId>) -> bool {
    primary != Some(resolved)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn full_input() -> NewAddressInput {
        NewAddressInput {
            address: Some(" 12 Elm St ".into()),
            address_ext: Some("  ".into()),
            city: Some("Springfield".into()),
            state: Some("IL".into()),
            zip_code: Some("62704".into()),
            privacy_display: None,
            contact_methods: vec!["Email".into(), "email".into(), "phone".into()],
            preferred_contact_time: None,
        }
    }

    #[test]
    fn valid_address_is_trimmed_and_defaulted() {
        let address = validate_new_address(&full_input()).unwrap();
        assert_eq!(address.address, "12 Elm St");
        assert_eq!(address.address_ext, None);
        assert_eq!(address.privacy_display, PrivacyDisplay::CityState);
        assert_eq!(address.contact_methods, vec!["email", "phone"]);
    }

    #[test]
    fn all_required_fields_are_reported() {
        let errors = validate_new_address(&NewAddressInput::default()).unwrap_err();
        for field in ["address", "city", "state", "zip_code"] {
            assert!(errors.contains(field), "missing error for {field}");
        }
    }

    #[test]
    fn blank_city_is_missing() {
        let input = NewAddressInput {
            city: Some("   ".into()),
            ..full_input()
        };
        let errors = validate_new_address(&input).unwrap_err();
        assert_eq!(errors.get("city"), ["City is required"]);
    }

    #[test]
    fn zip_formats() {
        assert!(is_valid_zip("62704"));
        assert!(is_valid_zip("62704-1234"));
        assert!(!is_valid_zip("6270"));
        assert!(!is_valid_zip("62704-12"));
        assert!(!is_valid_zip("abcde"));
    }

    #[test]
    fn unknown_contact_method_rejected() {
        let input = NewAddressInput {
            contact_methods: vec!["pigeon".into()],
            ..full_input()
        };
        assert!(validate_new_address(&input).unwrap_err().contains("contact_methods"));
    }

    #[test]
    fn overlong_street_rejected_by_length_rule() {
        let input = NewAddressInput {
            address: Some("x".repeat(201)),
            ..full_input()
        };
        assert!(validate_new_address(&input).unwrap_err().contains("address"));
    }

    #[test]
    fn first_address_is_always_primary() {
        assert!(new_address_becomes_primary(0, false));
        assert!(!new_address_becomes_primary(2, false));
        assert!(new_address_becomes_primary(2, true));
    }

    #[test]
    fn non_primary_flag() {
        let a = crate::types::new_id();
        let b = crate::types::new_id();
        assert!(!uses_non_primary_address(a, Some(a)));
        assert!(uses_non_primary_address(a, Some(b)));
        assert!(uses_non_primary_address(a, None));
    }

    #[test]
    fn selection_deserializes_by_mode() {
        let json = serde_json::json!({
            "mode": "existing",
            "address_id": "0190a4c2-7d1e-7000-8000-000000000001"
        });
        let selection: LocationSelection = serde_json::from_value(json).unwrap();
        assert!(matches!(
            selection,
            LocationSelection::Existing { make_primary: false, .. }
        ));
    }
}
