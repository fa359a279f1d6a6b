//! Structural verification of a candidate's declared operations.
//!
//! Out-of-process candidates describe themselves with a [`Manifest`]; the
//! grader compares it to [`EXPECTED_SIGNATURES`] once per run and consults
//! the resulting [`SignatureFailures`] before each test case.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contract::{EXPECTED_SIGNATURES, TRACKER_TYPE};

/// Self-description returned by a candidate's `describe` handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Name of the exposed type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Operation name to parameter names, in declaration order.
    #[serde(default)]
    pub operations: BTreeMap<String, Vec<String>>,
}

impl Manifest {
    /// The manifest a conforming candidate declares.
    pub fn expected() -> Self {
        let operations = EXPECTED_SIGNATURES
            .iter()
            .map(|(name, params)| {
                (
                    name.to_string(),
                    params.iter().map(|param| param.to_string()).collect(),
                )
            })
            .collect();
        Self {
            type_name: TRACKER_TYPE.to_string(),
            operations,
        }
    }

    pub fn declares_tracker_type(&self) -> bool {
        self.type_name == TRACKER_TYPE
    }
}

/// Operation name to a human-readable mismatch description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SignatureFailures(BTreeMap<String, String>);

impl SignatureFailures {
    /// No failures; used for compiled-in candidates.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_operation(&self, operation: &str) -> Option<&str> {
        self.0.get(operation).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(operation, reason)| (operation.as_str(), reason.as_str()))
    }
}

/// Compare a manifest's operations against the expected contract.
///
/// Parameter lists are order-sensitive. Extra operations are ignored.
pub fn verify_manifest(manifest: &Manifest) -> SignatureFailures {
    let mut failures = BTreeMap::new();
    for (operation, expected) in EXPECTED_SIGNATURES {
        match manifest.operations.get(operation) {
            None => {
                failures.insert(
                    operation.to_string(),
                    format!("{operation} (method missing)"),
                );
            }
            Some(actual) if !params_match(expected, actual) => {
                failures.insert(
                    operation.to_string(),
                    format!(
                        "{operation} (expected {}, got {})",
                        render_params(expected.iter().copied()),
                        render_params(actual.iter().map(String::as_str)),
                    ),
                );
            }
            Some(_) => {}
        }
    }
    SignatureFailures(failures)
}

fn params_match(expected: &[&str], actual: &[String]) -> bool {
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(expected, actual)| *expected == actual)
}

fn render_params<'a>(params: impl Iterator<Item = &'a str>) -> String {
    let quoted = params.map(|param| format!("'{param}'")).collect::<Vec<_>>();
    format!("[{}]", quoted.join(", "))
}
