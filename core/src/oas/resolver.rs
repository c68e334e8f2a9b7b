#![deny(missing_docs)]

//! # Reference Resolution
//!
//! Inlines local `$ref` pointers (`#/definitions/X`, `#/components/schemas/X`,
//! and any other `#/...` target) throughout a parsed document.
//!
//! Resolution is total: it never fails. A reference whose target is already on
//! the current resolution path resolves to `null`, truncating the cycle one
//! level in. Missing or external targets keep the original `$ref` object and
//! produce a [`RefDiagnostic`].

use crate::oas::ref_utils::{local_pointer, lookup_pointer, ref_name};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Why a reference was left in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefFailure {
    /// The pointer does not address anything in the document.
    Missing,
    /// The reference points into another document.
    External,
}

/// A non-fatal resolution problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefDiagnostic {
    /// The raw `$ref` string.
    pub reference: String,
    /// Failure kind.
    pub reason: RefFailure,
}

impl fmt::Display for RefDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            RefFailure::Missing => write!(f, "Unresolvable reference '{}'", self.reference),
            RefFailure::External => {
                write!(f, "External reference '{}' not supported", self.reference)
            }
        }
    }
}

/// The output of [`resolve_refs`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    /// The document with references inlined.
    pub document: Value,
    /// One entry per distinct reference that could not be inlined.
    pub diagnostics: Vec<RefDiagnostic>,
}

/// Deep-resolves every local `$ref` in `document`.
///
/// Non-object inputs are returned unchanged.
pub fn resolve_refs(document: &Value) -> ResolvedDocument {
    if !document.is_object() {
        return ResolvedDocument {
            document: document.clone(),
            diagnostics: Vec::new(),
        };
    }

    let mut resolver = ReferenceResolver::new(document);
    let mut path = Vec::new();
    let resolved = resolver.resolve_node(document, &mut path);

    ResolvedDocument {
        document: resolved,
        diagnostics: resolver.diagnostics,
    }
}

/// Resolves references against a fixed root document.
struct ReferenceResolver<'a> {
    root: &'a Value,
    diagnostics: Vec<RefDiagnostic>,
    reported: HashSet<String>,
}

impl<'a> ReferenceResolver<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            diagnostics: Vec::new(),
            reported: HashSet::new(),
        }
    }

    /// `path` holds the pointers currently being expanded, outermost first.
    fn resolve_node(&mut self, node: &Value, path: &mut Vec<String>) -> Value {
        match node {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    return self.resolve_reference(node, reference, path);
                }
                let resolved: Map<String, Value> = map
                    .iter()
                    .map(|(key, value)| (key.clone(), self.resolve_node(value, path)))
                    .collect();
                Value::Object(resolved)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_node(item, path))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn resolve_reference(&mut self, node: &Value, reference: &str, path: &mut Vec<String>) -> Value {
        let Some(pointer) = local_pointer(reference) else {
            self.report(reference, RefFailure::External);
            return node.clone();
        };

        if path.iter().any(|seen| seen == pointer) {
            debug!(reference, target = %ref_name(reference), "Cyclic reference truncated");
            return Value::Null;
        }

        let root = self.root;
        let Some(target) = lookup_pointer(root, pointer) else {
            self.report(reference, RefFailure::Missing);
            return node.clone();
        };

        path.push(pointer.to_string());
        let resolved = self.resolve_node(target, path);
        path.pop();
        resolved
    }

    fn report(&mut self, reference: &str, reason: RefFailure) {
        if !self.reported.insert(reference.to_string()) {
            return;
        }
        let diagnostic = RefDiagnostic {
            reference: reference.to_string(),
            reason,
        };
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}
