//! Field-scoped validation errors and the checks shared by every model.

use std::{collections::BTreeMap, fmt::Display};

use serde::Serialize;

use crate::{DatabaseId, Error};

/// The key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// The longest name allowed for any reference data.
pub const MAX_NAME_LENGTH: usize = 100;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const BLANK_MESSAGE: &str = "This field may not be blank.";

/// Validation messages keyed by the name of the field they concern.
///
/// Serializes as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty set of errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding one error for `field`.
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record an error for `field`.
    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.to_owned());
    }

    /// Whether no errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `field` has at least one error.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// The messages recorded for `field`.
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ok` if there are no errors, otherwise [Error::Validation].
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();

        write!(f, "{}", parts.join("; "))
    }
}

/// Whether a write must supply every required field or only the ones it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create and PUT: required fields must be present.
    Full,
    /// PATCH: absent fields keep their stored value.
    Partial,
}

/// Validate a name field, returning the trimmed name if it is valid.
///
/// `current` is the stored value used by partial updates when `raw` is absent.
pub fn validate_name(
    raw: Option<&str>,
    current: Option<&str>,
    errors: &mut FieldErrors,
) -> Option<String> {
    let Some(raw) = raw else {
        if current.is_none() {
            errors.add("name", REQUIRED_MESSAGE);
        }
        return current.map(str::to_owned);
    };

    let name = raw.trim();

    if name.is_empty() {
        errors.add("name", BLANK_MESSAGE);
        None
    } else if name.chars().count() > MAX_NAME_LENGTH {
        errors.add(
            "name",
            &format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters."),
        );
        None
    } else {
        Some(name.to_owned())
    }
}

/// Resolve a required foreign key: the new value if given, otherwise the stored one.
pub fn require_reference(
    field: &str,
    raw: Option<DatabaseId>,
    current: Option<DatabaseId>,
    errors: &mut FieldErrors,
) -> Option<DatabaseId> {
    let id = raw.or(current);

    if id.is_none() {
        errors.add(field, REQUIRED_MESSAGE);
    }

    id
}

/// The message for a foreign key that does not refer to an active row.
pub fn invalid_reference_message(id: DatabaseId) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}
