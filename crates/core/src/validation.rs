//! Schema-driven request validation.
//!
//! A [`Schema`] is plain data: an ordered list of [`FieldRule`]s. Checking an
//! untyped JSON value against it either yields an object holding only the
//! declared fields, or a [`ValidationFailure`] listing **every** violation in
//! declaration order. Validation is pure: no I/O, same input, same result.
//!
//! Request types opt in through [`Validate`], which pairs a schema with a serde
//! target so handlers receive a typed [`ValidatedPayload`].

use core::ops::Deref;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{FieldError, ValidationFailure};

/// Field path used for errors about the input as a whole.
pub const ROOT: &str = "";

/// Whether a field must be present.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Presence {
    Required,
    /// Absent is fine; present is checked as if required.
    Optional,
}

/// Constraint applied to a present field value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Check {
    /// String whose length (in chars) lies in `min..=max`.
    Text { min: usize, max: Option<usize> },
    Boolean,
    /// String drawn from a fixed set.
    OneOf(&'static [&'static str]),
}

impl Check {
    pub const fn text(min: usize, max: usize) -> Self {
        Check::Text {
            min,
            max: Some(max),
        }
    }

    pub const fn text_max(max: usize) -> Self {
        Check::Text {
            min: 0,
            max: Some(max),
        }
    }

    fn apply(&self, label: &str, value: &Value) -> Result<(), String> {
        match *self {
            Check::Text { min, max } => {
                let Some(s) = value.as_str() else {
                    return Err(format!("{label} must be a string"));
                };
                let len = s.chars().count();
                if len < min {
                    return Err(if min == 1 {
                        format!("{label} cannot be empty")
                    } else {
                        format!("{label} must be at least {min} characters")
                    });
                }
                if let Some(max) = max {
                    if len > max {
                        return Err(format!("{label} cannot exceed {max} characters"));
                    }
                }
                Ok(())
            }
            Check::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("{label} must be a boolean"))
                }
            }
            Check::OneOf(options) => match value.as_str() {
                Some(s) if options.contains(&s) => Ok(()),
                _ => Err(format!("{label} must be one of: {}", options.join(", "))),
            },
        }
    }
}

/// One named field constraint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FieldRule {
    /// Key in the input object (also the reported field path).
    pub field: &'static str,
    /// Human-readable name used in messages.
    pub label: &'static str,
    pub presence: Presence,
    pub check: Check,
}

impl FieldRule {
    pub const fn required(field: &'static str, label: &'static str, check: Check) -> Self {
        Self {
            field,
            label,
            presence: Presence::Required,
            check,
        }
    }

    pub const fn optional(field: &'static str, label: &'static str, check: Check) -> Self {
        Self {
            field,
            label,
            presence: Presence::Optional,
            check,
        }
    }
}

/// Treatment of keys a schema does not declare.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum UnknownFields {
    /// Drop them silently.
    #[default]
    Ignore,
    /// Report each one as a field error.
    Reject,
}

/// Declared shape of one kind of request input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldRule],
    pub unknown: UnknownFields,
}

impl Schema {
    pub const fn new(name: &'static str, fields: &'static [FieldRule]) -> Self {
        Self {
            name,
            fields,
            unknown: UnknownFields::Ignore,
        }
    }

    /// Same schema, rejecting undeclared keys.
    pub const fn strict(self) -> Self {
        Self {
            unknown: UnknownFields::Reject,
            ..self
        }
    }

    fn declares(&self, key: &str) -> bool {
        self.fields.iter().any(|rule| rule.field == key)
    }

    /// Check `input` and return an object with only the declared, present fields.
    pub fn check(&self, input: &Value) -> Result<Map<String, Value>, ValidationFailure> {
        let Some(object) = input.as_object() else {
            return Err(ValidationFailure::single(ROOT, "Expected an object"));
        };

        let mut errors = Vec::new();
        let mut cleaned = Map::new();

        for rule in self.fields {
            match object.get(rule.field) {
                None => {
                    if rule.presence == Presence::Required {
                        errors.push(FieldError::new(
                            rule.field,
                            format!("{} is required", rule.label),
                        ));
                    }
                }
                Some(value) => match rule.check.apply(rule.label, value) {
                    Ok(()) => {
                        cleaned.insert(rule.field.to_string(), value.clone());
                    }
                    Err(message) => errors.push(FieldError::new(rule.field, message)),
                },
            }
        }

        if self.unknown == UnknownFields::Reject {
            let mut unknown: Vec<&String> =
                object.keys().filter(|key| !self.declares(key)).collect();
            unknown.sort();
            errors.extend(
                unknown
                    .into_iter()
                    .map(|key| FieldError::new(key.as_str(), "Unknown field")),
            );
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(ValidationFailure::new(errors))
        }
    }
}

/// Input that has passed its schema.
///
/// Only [`Validate::validate`] constructs one, so holding a value proves the
/// whole input was valid.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayload<T>(T);

impl<T> ValidatedPayload<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedPayload<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// A request type declared by a [`Schema`].
pub trait Validate: DeserializeOwned {
    const SCHEMA: Schema;

    fn validate(input: &Value) -> Result<ValidatedPayload<Self>, ValidationFailure> {
        let cleaned = Self::SCHEMA.check(input)?;
        // The schema already checked every type, so this only fails when the
        // struct and its schema disagree.
        serde_json::from_value(Value::Object(cleaned))
            .map(ValidatedPayload)
            .map_err(|e| ValidationFailure::single(ROOT, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::json;

    const PROFILE: Schema = Schema::new(
        "profile",
        &[
            FieldRule::required("name", "Name", Check::text(1, 20)),
            FieldRule::required("handle", "Handle", Check::text(3, 15)),
            FieldRule::optional("bio", "Bio", Check::text_max(100)),
            FieldRule::optional("public", "Public", Check::Boolean),
            FieldRule::optional("theme", "Theme", Check::OneOf(&["light", "dark"])),
        ],
    );

    #[derive(Debug, Deserialize, PartialEq)]
    struct Profile {
        name: String,
        handle: String,
        bio: Option<String>,
        public: Option<bool>,
    }

    impl Validate for Profile {
        const SCHEMA: Schema = PROFILE;
    }

    fn fields(err: &ValidationFailure) -> Vec<&str> {
        err.errors().iter().map(|e| e.field()).collect()
    }

    #[test]
    fn valid_input_keeps_only_declared_fields() {
        let cleaned = PROFILE
            .check(&json!({ "name": "Ada", "handle": "ada", "admin": true }))
            .unwrap();
        assert_eq!(
            Value::Object(cleaned),
            json!({ "name": "Ada", "handle": "ada" })
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        let at_limits = json!({ "name": "x".repeat(20), "handle": "abc", "bio": "b".repeat(100) });
        assert!(PROFILE.check(&at_limits).is_ok());

        let over = json!({ "name": "x".repeat(21), "handle": "ab" });
        let err = PROFILE.check(&over).unwrap_err();
        assert_eq!(
            err.errors()[0].message(),
            "Name cannot exceed 20 characters"
        );
        assert_eq!(
            err.errors()[1].message(),
            "Handle must be at least 3 characters"
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let input = json!({ "name": "é".repeat(20), "handle": "ünï" });
        assert!(PROFILE.check(&input).is_ok());
    }

    #[test]
    fn violations_follow_declaration_order() {
        let input = json!({ "theme": "neon", "public": "yes", "bio": "b".repeat(101), "name": "" });
        let err = PROFILE.check(&input).unwrap_err();
        assert_eq!(
            fields(&err),
            vec!["name", "handle", "bio", "public", "theme"]
        );
        assert_eq!(err.errors()[0].message(), "Name cannot be empty");
        assert_eq!(err.errors()[1].message(), "Handle is required");
        assert_eq!(err.errors()[3].message(), "Public must be a boolean");
        assert_eq!(
            err.errors()[4].message(),
            "Theme must be one of: light, dark"
        );
    }

    #[test]
    fn present_null_is_checked_like_any_other_value() {
        let err = PROFILE
            .check(&json!({ "name": "Ada", "handle": "ada", "bio": null }))
            .unwrap_err();
        assert_eq!(fields(&err), vec!["bio"]);
        assert_eq!(err.errors()[0].message(), "Bio must be a string");
    }

    #[test]
    fn non_object_input_fails_at_root() {
        for input in [json!(null), json!([1, 2]), json!("text"), json!(7)] {
            let err = PROFILE.check(&input).unwrap_err();
            assert_eq!(fields(&err), vec![ROOT]);
            assert_eq!(err.errors()[0].message(), "Expected an object");
        }
    }

    #[test]
    fn strict_schema_reports_unknown_keys_after_declared_rules() {
        let strict = PROFILE.strict();
        let input = json!({ "zeta": 1, "name": "", "alpha": 2, "handle": "ada" });
        let err = strict.check(&input).unwrap_err();
        assert_eq!(fields(&err), vec!["name", "alpha", "zeta"]);
        assert_eq!(err.errors()[1].message(), "Unknown field");
    }

    #[test]
    fn validate_yields_typed_payload() {
        let input = json!({ "name": "Ada", "handle": "ada", "public": true, "x": 1 });
        let payload = Profile::validate(&input).unwrap();
        assert_eq!(payload.name, "Ada");
        assert_eq!(payload.public, Some(true));
        assert_eq!(payload.bio, None);
        assert_eq!(
            payload.into_inner(),
            Profile {
                name: "Ada".to_string(),
                handle: "ada".to_string(),
                bio: None,
                public: Some(true),
            }
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: undeclared keys never survive validation.
        #[test]
        fn unknown_keys_never_reach_the_payload(
            extra in prop::collection::btree_map("[a-z]{1,8}", any::<i32>(), 0..6)
        ) {
            let mut input = json!({ "name": "Ada", "handle": "ada" });
            let object = input.as_object_mut().unwrap();
            for (k, v) in &extra {
                if !PROFILE.declares(k) {
                    object.insert(k.clone(), json!(v));
                }
            }

            let cleaned = PROFILE.check(&input).unwrap();
            prop_assert!(cleaned.keys().all(|k| PROFILE.declares(k)));
        }

        /// Property: one error per missing required field, on that field.
        #[test]
        fn one_error_per_missing_required_field(
            drop_name in any::<bool>(),
            drop_handle in any::<bool>(),
        ) {
            let mut input = json!({ "name": "Ada", "handle": "ada" });
            let object = input.as_object_mut().unwrap();
            let mut expected = Vec::new();
            if drop_name {
                object.remove("name");
                expected.push("name");
            }
            if drop_handle {
                object.remove("handle");
                expected.push("handle");
            }

            match PROFILE.check(&input) {
                Ok(_) => prop_assert!(expected.is_empty()),
                Err(err) => prop_assert_eq!(fields(&err), expected),
            }
        }

        /// Property: each violated rule yields exactly one error, in
        /// declaration order, whatever subset of rules is broken.
        #[test]
        fn errors_match_violated_rules_in_order(
            violate in prop::array::uniform5(any::<bool>()),
            omit_valid_optionals in any::<bool>(),
        ) {
            let valid = [
                json!("Ada"),
                json!("ada"),
                json!("bio"),
                json!(true),
                json!("dark"),
            ];
            let invalid = [
                json!(""),
                json!("ab"),
                json!("b".repeat(101)),
                json!("yes"),
                json!("neon"),
            ];

            let mut input = Map::new();
            let mut expected = Vec::new();
            for (i, rule) in PROFILE.fields.iter().enumerate() {
                if violate[i] {
                    expected.push(rule.field);
                    input.insert(rule.field.to_string(), invalid[i].clone());
                } else if rule.presence == Presence::Required || !omit_valid_optionals {
                    input.insert(rule.field.to_string(), valid[i].clone());
                }
            }

            match PROFILE.check(&Value::Object(input)) {
                Ok(_) => prop_assert!(expected.is_empty()),
                Err(err) => prop_assert_eq!(fields(&err), expected),
            }
        }
    }
}
