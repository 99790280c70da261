//! Shipping address captured by the checkout wizard.

use serde::{Deserialize, Serialize};

/// Validation failures for a [`ShippingAddress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is blank.
    #[error("{0} is required")]
    Missing(&'static str),
    /// Postal code is not six digits.
    #[error("postal code must be 6 digits")]
    InvalidPostalCode,
    /// Phone number is not ten digits.
    #[error("phone number must be 10 digits")]
    InvalidPhone,
}

/// Where an order is delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Trim every field and normalize the phone number to its last ten digits
    /// (dropping a `+91`/`0` prefix, spaces and dashes), then validate.
    ///
    /// # Errors
    ///
    /// Returns the first [`AddressError`] found, checking required fields in
    /// form order.
    pub fn validated(self) -> Result<Self, AddressError> {
        let address = Self {
            full_name: self.full_name.trim().to_owned(),
            phone: normalize_phone(&self.phone),
            line1: self.line1.trim().to_owned(),
            line2: self.line2.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            postal_code: self.postal_code.trim().replace(' ', ""),
            country: match self.country.trim() {
                "" => "India".to_owned(),
                other => other.to_owned(),
            },
        };

        for (label, value) in [
            ("full name", &address.full_name),
            ("phone", &address.phone),
            ("address line 1", &address.line1),
            ("city", &address.city),
            ("state", &address.state),
            ("postal code", &address.postal_code),
        ] {
            if value.is_empty() {
                return Err(AddressError::Missing(label));
            }
        }

        if address.postal_code.len() != 6 || !address.postal_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AddressError::InvalidPostalCode);
        }
        if address.phone.len() != 10 {
            return Err(AddressError::InvalidPhone);
        }

        Ok(address)
    }

    /// One-line rendering for order summaries.
    #[must_use]
    pub fn one_line(&self) -> String {
        [
            self.line1.as_str(),
            self.line2.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.postal_code.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Keep digits only, then strip a country or trunk prefix down to ten digits.
fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let stripped = match digits.len() {
        12 => digits.strip_prefix("91"),
        11 => digits.strip_prefix('0'),
        _ => None,
    };
    stripped.map_or_else(|| digits.clone(), str::to_owned)
}
