//! Checkout form validation
//!
//! Every rule runs client-side before any request is built. The first
//! violation is what the shopper sees; the rest only feed the "N more
//! issues" hint.

use std::sync::LazyLock;

use regex::Regex;

use shared::models::{District, GuestInfo, Province, ShippingAddress, Ward};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L} ]+$").expect("valid name regex"));

// national 0… or international 84… forms, mobile and landline
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:0|\+?84)(?:2\d{9}|[35789]\d{8})$").expect("valid phone regex")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 254;
const STREET_MIN: usize = 10;
const STREET_MAX: usize = 200;

/// Raw checkout form as the order page collects it.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub street: String,
    pub province: Option<Province>,
    pub district: Option<District>,
    pub ward: Option<Ward>,
    pub note: Option<String>,
    pub require_invoice: bool,
}

/// A single violated rule, tied to the form field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Everything wrong with a form, in field order. Never empty.
#[derive(Debug, Clone)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// The violation shown immediately.
    pub fn first(&self) -> &FieldError {
        &self.errors[0]
    }

    /// How many further violations exist beyond the first.
    pub fn remaining(&self) -> usize {
        self.errors.len() - 1
    }

    pub fn all(&self) -> &[FieldError] {
        &self.errors
    }

    /// First error plus a count hint for the rest.
    pub fn summary(&self) -> String {
        if self.remaining() == 0 {
            self.first().message.clone()
        } else {
            format!("{} ({} more issues)", self.first().message, self.remaining())
        }
    }
}

/// A form that passed every rule, shaped for order submission.
#[derive(Debug, Clone)]
pub struct ValidatedCheckout {
    pub shipping_address: ShippingAddress,
    pub contact: GuestInfo,
    pub note: Option<String>,
    pub require_invoice: bool,
}

pub fn validate(form: &CheckoutForm) -> Result<ValidatedCheckout, ValidationErrors> {
    let mut errors = Vec::new();

    let full_name = form.full_name.trim();
    let name_len = full_name.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&name_len) || !NAME_RE.is_match(full_name) {
        errors.push(FieldError {
            field: "fullName",
            message: format!("full name must be {NAME_MIN} to {NAME_MAX} letters and spaces"),
        });
    }

    let phone = form.phone.trim();
    if !PHONE_RE.is_match(phone) {
        errors.push(FieldError {
            field: "phone",
            message: "phone must be a valid Vietnamese number".to_string(),
        });
    }

    let email = form.email.trim();
    if email.chars().count() > EMAIL_MAX || !EMAIL_RE.is_match(email) {
        errors.push(FieldError {
            field: "email",
            message: "email address is not valid".to_string(),
        });
    }

    let street = form.street.trim();
    let street_len = street.chars().count();
    if !(STREET_MIN..=STREET_MAX).contains(&street_len) {
        errors.push(FieldError {
            field: "street",
            message: format!("street address must be {STREET_MIN} to {STREET_MAX} characters"),
        });
    }

    if form.province.is_none() {
        errors.push(FieldError {
            field: "province",
            message: "please select a province".to_string(),
        });
    }
    if form.district.is_none() {
        errors.push(FieldError {
            field: "district",
            message: "please select a district".to_string(),
        });
    }
    if form.ward.is_none() {
        errors.push(FieldError {
            field: "ward",
            message: "please select a ward".to_string(),
        });
    }

    match (&form.province, &form.district, &form.ward) {
        (Some(province), Some(district), Some(ward)) if errors.is_empty() => Ok(ValidatedCheckout {
            shipping_address: ShippingAddress {
                full_name: full_name.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
                street: street.to_string(),
                province: province.name.clone(),
                district: district.name.clone(),
                ward: ward.name.clone(),
            },
            contact: GuestInfo {
                full_name: full_name.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
            },
            note: form
                .note
                .as_ref()
                .map(|note| note.trim().to_string())
                .filter(|note| !note.is_empty()),
            require_invoice: form.require_invoice,
        }),
        _ => Err(ValidationErrors { errors }),
    }
}
