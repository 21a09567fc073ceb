//! Field-level validation rules for the optical domain.
//!
//! The same rules back the request payloads (through `validator` derives) and
//! the entity `before_save` hooks, so every write path enforces them.
//! Failures are reported as [`FieldErrors`], a map from field path
//! (`prescription.far.od.axis`) to human readable messages.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveValue, DbErr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Optional leading `+`, optional country code `1`, then 9 to 15 digits.
pub static PHONE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?1?\d{9,15}$").expect("phone number pattern is valid"));

pub const PHONE_NUMBER_MAX_LEN: usize = 17;

pub const LENS_POWER_MIN: Decimal = dec!(-20.00);
pub const LENS_POWER_MAX: Decimal = dec!(20.00);
pub const LENS_POWER_DECIMAL_PLACES: u32 = 2;

pub const AXIS_MIN: i32 = 0;
pub const AXIS_MAX: i32 = 180;

pub const PUPILLARY_DISTANCE_MIN: Decimal = dec!(50.0);
pub const PUPILLARY_DISTANCE_MAX: Decimal = dec!(70.0);
pub const PUPILLARY_DISTANCE_DECIMAL_PLACES: u32 = 1;

pub const MONEY_DECIMAL_PLACES: u32 = 2;
pub const MONEY_MAX_DIGITS: u32 = 10;

fn rule_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Number of significant decimal places (`1.50` has one).
pub fn decimal_places(value: &Decimal) -> u32 {
    value.normalize().scale()
}

/// Number of digits left of the decimal point (`0.5` has none).
pub fn integer_digits(value: &Decimal) -> u32 {
    let whole = value.abs().trunc().normalize();
    if whole.is_zero() {
        0
    } else {
        whole.to_string().len() as u32
    }
}

fn check_decimal_shape(
    value: &Decimal,
    max_digits: u32,
    places: u32,
) -> Result<(), ValidationError> {
    if decimal_places(value) > places {
        return Err(rule_error(
            "decimal_places",
            format!("Ensure that there are no more than {places} decimal places"),
        ));
    }
    if integer_digits(value) > max_digits - places {
        return Err(rule_error(
            "max_digits",
            format!("Ensure that there are no more than {max_digits} digits in total"),
        ));
    }
    Ok(())
}

fn check_decimal_range(value: &Decimal, min: Decimal, max: Decimal) -> Result<(), ValidationError> {
    if *value < min || *value > max {
        let mut err = rule_error(
            "range",
            format!("Ensure this value is between {min} and {max}"),
        );
        err.add_param("min".into(), &min.to_string());
        err.add_param("max".into(), &max.to_string());
        err.add_param("value".into(), &value.to_string());
        return Err(err);
    }
    Ok(())
}

/// Empty phone numbers are allowed; anything else must match [`PHONE_NUMBER_RE`].
pub fn validate_phone_number(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    if value.chars().count() > PHONE_NUMBER_MAX_LEN || !PHONE_NUMBER_RE.is_match(value) {
        return Err(rule_error(
            "phone_number",
            "Phone number must be entered in the format: '+999999999'. Up to 15 digits allowed."
                .to_string(),
        ));
    }
    Ok(())
}

/// Spheric and cylindric powers, in diopters.
pub fn validate_lens_power(value: &Decimal) -> Result<(), ValidationError> {
    check_decimal_shape(value, 5, LENS_POWER_DECIMAL_PLACES)?;
    check_decimal_range(value, LENS_POWER_MIN, LENS_POWER_MAX)
}

/// Cylinder axis in whole degrees, `0..=180`.
pub fn validate_axis(value: i32) -> Result<(), ValidationError> {
    if !(AXIS_MIN..=AXIS_MAX).contains(&value) {
        let mut err = rule_error(
            "range",
            format!("Ensure this value is between {AXIS_MIN} and {AXIS_MAX}"),
        );
        err.add_param("min".into(), &AXIS_MIN);
        err.add_param("max".into(), &AXIS_MAX);
        err.add_param("value".into(), &value);
        return Err(err);
    }
    Ok(())
}

/// Pupillary distance, in millimetres.
pub fn validate_pupillary_distance(value: &Decimal) -> Result<(), ValidationError> {
    check_decimal_shape(value, 5, PUPILLARY_DISTANCE_DECIMAL_PLACES)?;
    check_decimal_range(value, PUPILLARY_DISTANCE_MIN, PUPILLARY_DISTANCE_MAX)
}

pub fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(rule_error(
            "min_value",
            "Ensure this value is greater than or equal to 0".to_string(),
        ));
    }
    check_decimal_shape(value, MONEY_MAX_DIGITS, MONEY_DECIMAL_PLACES)
}

/// Voucher installments must move money.
pub fn validate_payment_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(rule_error(
            "min_value",
            "Ensure this value is greater than 0".to_string(),
        ));
    }
    check_decimal_shape(value, MONEY_MAX_DIGITS, MONEY_DECIMAL_PLACES)
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("blank", "This field may not be blank".to_string()));
    }
    Ok(())
}

/// Field path → messages, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Moves every error of `other` under `prefix.`
    pub fn merge_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (field, messages) in other.0 {
            let path = if prefix.is_empty() {
                field
            } else {
                format!("{prefix}.{field}")
            };
            self.0.entry(path).or_default().extend(messages);
        }
    }

    /// Runs a rule against an assigned active-model value and records the failure.
    pub fn check_active<V, F>(&mut self, field: &str, value: &ActiveValue<V>, rule: F)
    where
        V: Into<sea_orm::Value>,
        F: FnOnce(&V) -> Result<(), ValidationError>,
    {
        let assigned = match value {
            ActiveValue::Set(v) | ActiveValue::Unchanged(v) => v,
            ActiveValue::NotSet => return,
        };
        if let Err(err) = rule(assigned) {
            self.add(field, message_for(&err));
        }
    }

    /// Same as [`FieldErrors::check_active`] for nullable columns; `None` always passes.
    pub fn check_active_opt<V, F>(&mut self, field: &str, value: &ActiveValue<Option<V>>, rule: F)
    where
        Option<V>: Into<sea_orm::Value>,
        F: FnOnce(&V) -> Result<(), ValidationError>,
    {
        self.check_active(field, value, |inner| match inner {
            Some(v) => rule(v),
            None => Ok(()),
        });
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Entity hooks can only fail with a `DbErr`.
    pub fn into_db_result(self) -> Result<(), DbErr> {
        self.into_result()
            .map_err(|errors| DbErr::Custom(format!("validation failed: {errors}")))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        collect(None, &errors, &mut out);
        out
    }
}

fn collect(prefix: Option<&str>, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    out.add(path.clone(), message_for(err));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(Some(&path), nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(Some(&format!("{path}[{index}]")), nested, out);
                }
            }
        }
    }
}

/// Human readable message for a validator error, falling back on its code.
pub fn message_for(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }
    let param = |name: &str| err.params.get(name).map(|v| v.to_string().replace('"', ""));
    match err.code.as_ref() {
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("Length must be between {min} and {max} characters"),
            (Some(min), None) => format!("Length must be at least {min} characters"),
            (None, Some(max)) => format!("Length must be at most {max} characters"),
            (None, None) => "Invalid length".to_string(),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("Ensure this value is between {min} and {max}"),
            (Some(min), None) => format!("Ensure this value is greater than or equal to {min}"),
            (None, Some(max)) => format!("Ensure this value is less than or equal to {max}"),
            (None, None) => "Value out of range".to_string(),
        },
        "email" => "Enter a valid email address".to_string(),
        "required" => "This field is required".to_string(),
        code => format!("Invalid value ({code})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn phone_number_accepts_empty_and_well_formed_values() {
        assert!(validate_phone_number("").is_ok());
        assert!(validate_phone_number("+40712345678").is_ok());
        assert!(validate_phone_number("0712345678").is_ok());
        assert!(validate_phone_number("+1123456789012345").is_ok());
    }

    #[test]
    fn phone_number_rejects_malformed_values() {
        assert!(validate_phone_number("12345678").is_err());
        assert!(validate_phone_number("+40 712 345 678").is_err());
        assert!(validate_phone_number("phone").is_err());
        assert!(validate_phone_number("+11234567890123456").is_err());
    }

    #[test]
    fn lens_power_bounds_are_inclusive() {
        assert!(validate_lens_power(&dec!(-20.00)).is_ok());
        assert!(validate_lens_power(&dec!(20.00)).is_ok());
        assert!(validate_lens_power(&dec!(0)).is_ok());
        assert!(validate_lens_power(&dec!(-1.25)).is_ok());
        assert!(validate_lens_power(&dec!(20.01)).is_err());
        assert!(validate_lens_power(&dec!(-20.01)).is_err());
    }

    #[test]
    fn lens_power_rejects_extra_precision() {
        let err = validate_lens_power(&dec!(1.255)).unwrap_err();
        assert_eq!(err.code, "decimal_places");
        // trailing zeros do not count
        assert!(validate_lens_power(&dec!(1.2500)).is_ok());
    }

    #[test]
    fn axis_bounds() {
        assert!(validate_axis(0).is_ok());
        assert!(validate_axis(180).is_ok());
        assert!(validate_axis(-1).is_err());
        assert!(validate_axis(200).is_err());
    }

    #[test]
    fn pupillary_distance_bounds_and_precision() {
        assert!(validate_pupillary_distance(&dec!(50.0)).is_ok());
        assert!(validate_pupillary_distance(&dec!(70)).is_ok());
        assert!(validate_pupillary_distance(&dec!(63.5)).is_ok());
        assert!(validate_pupillary_distance(&dec!(49.9)).is_err());
        assert!(validate_pupillary_distance(&dec!(70.1)).is_err());
        assert!(validate_pupillary_distance(&dec!(63.25)).is_err());
    }

    #[test]
    fn price_rules() {
        assert!(validate_price(&dec!(0)).is_ok());
        assert!(validate_price(&dec!(99999999.99)).is_ok());
        assert!(validate_price(&dec!(-0.01)).is_err());
        assert!(validate_price(&dec!(1.999)).is_err());
        assert!(validate_price(&dec!(100000000.00)).is_err());
    }

    #[test]
    fn payment_amount_must_be_positive() {
        assert!(validate_payment_amount(&dec!(0.01)).is_ok());
        assert!(validate_payment_amount(&dec!(0)).is_err());
        assert!(validate_payment_amount(&dec!(-5)).is_err());
    }

    #[test]
    fn digit_helpers() {
        assert_eq!(decimal_places(&dec!(1.50)), 1);
        assert_eq!(decimal_places(&dec!(3)), 0);
        assert_eq!(integer_digits(&dec!(0.5)), 0);
        assert_eq!(integer_digits(&dec!(-123.45)), 3);
    }

    #[derive(Validate)]
    struct Eye {
        #[validate(custom = "validate_axis")]
        axis: Option<i32>,
    }

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, max = 3))]
        name: String,
        #[validate]
        eye: Eye,
    }

    #[test]
    fn nested_errors_flatten_to_dotted_paths() {
        let form = Form {
            name: String::new(),
            eye: Eye { axis: Some(200) },
        };
        let errors = FieldErrors::from(form.validate().unwrap_err());
        assert!(errors.contains("name"));
        assert!(errors.contains("eye.axis"));
        assert_eq!(
            errors.get("name").unwrap()[0],
            "Length must be between 1 and 3 characters"
        );
    }

    #[test]
    fn merge_prefixed_keeps_every_message() {
        let mut inner = FieldErrors::new();
        inner.add("phone_number", "bad");
        let mut outer = FieldErrors::new();
        outer.add("identity.first_name", "blank");
        outer.merge_prefixed("contact", inner);
        assert_eq!(outer.len(), 2);
        assert!(outer.contains("contact.phone_number"));
        assert_eq!(
            outer.to_string(),
            "contact.phone_number: bad; identity.first_name: blank"
        );
    }
}
