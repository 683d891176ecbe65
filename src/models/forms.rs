// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Website form submissions and their CRM field mapping.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Which website form was submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Contact,
    Support,
    Partner,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Contact => "contact",
            FormKind::Support => "support",
            FormKind::Partner => "partner",
        }
    }

    /// `(crm field, form field)` pairs, in CRM submission order.
    /// Every form field listed here is required and must be a string.
    pub fn field_mapping(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            FormKind::Contact => &[
                ("firstname", "firstName"),
                ("lastname", "lastName"),
                ("email", "email"),
                ("phone", "phone"),
                ("which_industry_are_you_in_", "industry"),
                ("company", "company"),
                ("country", "country"),
                ("city", "city"),
                ("which_tool_are_you_interested_in_", "product"),
                ("state", "state"),
                ("message", "message"),
            ],
            FormKind::Support => &[
                ("firstname", "firstName"),
                ("lastname", "lastName"),
                ("email", "email"),
                ("phone", "phone"),
                ("company", "company"),
                ("country", "country"),
                ("city", "city"),
                ("state", "state"),
                ("tool___part", "product"),
                ("TICKET.subject", "topic"),
                ("TICKET.content", "message"),
            ],
            FormKind::Partner => &[
                ("firstname", "firstName"),
                ("lastname", "lastName"),
                ("email", "email"),
                ("phone", "phone"),
                ("company", "company"),
                ("country", "country"),
                ("city", "city"),
                ("state", "state"),
                ("which_industry_are_you_in_", "industry"),
                ("message", "message"),
            ],
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One failed validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// `body` or `headers`
    pub location: String,
    /// Field or header name
    pub path: String,
    pub msg: String,
}

impl FieldError {
    pub fn invalid_body_field(path: &str) -> Self {
        Self {
            location: "body".to_string(),
            path: path.to_string(),
            msg: "Invalid value".to_string(),
        }
    }

    pub fn invalid_header(path: &str) -> Self {
        Self {
            location: "headers".to_string(),
            path: path.to_string(),
            msg: "Invalid value".to_string(),
        }
    }
}

/// A validated form, keyed by form field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub kind: FormKind,
    pub values: BTreeMap<String, String>,
}

impl FormSubmission {
    /// Check that every mapped field is present as a string.
    /// Extra fields are ignored.
    pub fn validate(kind: FormKind, body: &Value) -> Result<Self, Vec<FieldError>> {
        let mut values = BTreeMap::new();
        let mut errors = Vec::new();

        for (_, field) in kind.field_mapping() {
            match body.get(*field).and_then(Value::as_str) {
                Some(value) => {
                    values.insert((*field).to_string(), value.to_string());
                }
                None => errors.push(FieldError::invalid_body_field(field)),
            }
        }

        if errors.is_empty() {
            Ok(Self { kind, values })
        } else {
            Err(errors)
        }
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }
}

/// `{name, value}` pair of the CRM forms API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmField {
    pub name: String,
    pub value: String,
}

/// Body posted to the CRM forms API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmSubmission {
    pub fields: Vec<CrmField>,
}

impl From<&FormSubmission> for CrmSubmission {
    fn from(submission: &FormSubmission) -> Self {
        let fields = submission
            .kind
            .field_mapping()
            .iter()
            .map(|(name, field)| CrmField {
                name: (*name).to_string(),
                value: submission.value(field).to_string(),
            })
            .collect();
        Self { fields }
    }
}

/// 200 response of the form endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct FormReceivedResponse {
    pub message: String,
}

/// 400 response for failed validation
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationErrorsResponse {
    pub errors: Vec<FieldError>,
}

/// 400 response for a failed operation
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
