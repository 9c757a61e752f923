use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::dto::UserRequest;

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if !is_valid_email(email) {
        errors.add("email", "must be a valid email address");
    }
}

fn check_age(age: i32, errors: &mut FieldErrors) {
    if age < 0 {
        errors.add("age", "must be zero or greater");
    }
}

/// Rules for a new user: all three fields are required.
pub fn validate_create(req: &UserRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    match req.name.as_deref() {
        Some(name) if !is_blank(name) => {}
        _ => errors.add("name", "must not be blank"),
    }

    match req.email.as_deref() {
        Some(email) if !is_blank(email) => check_email(email, &mut errors),
        _ => errors.add("email", "must not be blank"),
    }

    match req.age {
        Some(age) => check_age(age, &mut errors),
        None => errors.add("age", "is required"),
    }

    errors.into_result()
}

/// Rules for a partial update: only supplied, non-blank fields are checked.
pub fn validate_update(req: &UserRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    if let Some(email) = req.email.as_deref().filter(|e| !is_blank(e)) {
        check_email(email, &mut errors);
    }
    if let Some(age) = req.age {
        check_age(age, &mut errors);
    }

    errors.into_result()
}
