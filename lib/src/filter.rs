//! The filter-predicate compiler
//!
//! Compiles a display filter expression of `&`-joined equality clauses,
//! e.g. `Protocol=tcp & Source=10.0.0.1`, into a [`Predicate`] over decoded
//! packets. Field lookup is a fixed name-to-accessor mapping over the
//! decoded record; there is no open-ended reflection. Compiling a new
//! expression produces a fresh predicate that fully replaces any previously
//! installed one.

use crate::{
    error::{RWireLibError, Result},
    packet::DecodedPacket,
};

// The filterable fields of a decoded packet, by their declared names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Number,
    Protocol,
    Source,
    Destination,
    Info,
    Layers,
    LinkType,
}

impl Field {
    fn resolve(name: &str) -> Option<Self> {
        match name {
            "Number" => Some(Self::Number),
            "Protocol" => Some(Self::Protocol),
            "Source" => Some(Self::Source),
            "Destination" => Some(Self::Destination),
            "Info" => Some(Self::Info),
            "Layers" => Some(Self::Layers),
            "LinkType" => Some(Self::LinkType),
            _ => None,
        }
    }

    fn text(&self, packet: &DecodedPacket) -> String {
        match self {
            Self::Number => packet.sequence.to_string(),
            Self::Protocol => packet.protocol.clone(),
            Self::Source => packet.source.clone(),
            Self::Destination => packet.destination.clone(),
            Self::Info => packet.info.clone(),
            Self::Layers => packet.layer_count.to_string(),
            Self::LinkType => packet.link_type.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Clause {
    // None for a well-formed but unknown field name; such a clause matches
    // no packet rather than raising at filter time
    field: Option<Field>,
    value: String,
}

impl Clause {
    fn matches(&self, packet: &DecodedPacket) -> bool {
        match &self.field {
            Some(field) => {
                field.text(packet).eq_ignore_ascii_case(&self.value)
            }
            None => false,
        }
    }
}

/// A compiled filter predicate: the conjunction of the equality clauses of
/// one filter expression
///
/// An empty expression compiles to the always-true predicate.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Returns true when the packet satisfies every clause of the compiled
    /// expression
    pub fn matches(&self, packet: &DecodedPacket) -> bool {
        self.clauses.iter().all(|clause| clause.matches(packet))
    }
}

/// Validates the syntax of a single filter clause
///
/// The clause must be exactly `FieldName=Value` with optional whitespace
/// around `=`, where the field name matches `[A-Z][a-zA-Z]+` and the value
/// matches `[a-z0-9%:./\]+`. The match is anchored so that inputs like
/// `=tcp` with nothing in front of the `=` are rejected. An empty clause is
/// valid.
pub fn validate(clause: &str) -> bool {
    if clause.is_empty() {
        return true;
    }

    let Some((name, value)) = clause.split_once('=') else {
        return false;
    };

    // whitespace is permitted only between the field name and the value
    is_field_name(name.trim_end()) && is_value_text(value.trim_start())
}

/// Compiles a filter expression into a [`Predicate`]
///
/// The expression is split on `&`; each clause is trimmed, validated, and
/// parsed. Empty clauses are ignored and an empty expression yields the
/// always-true predicate. A clause that fails validation aborts compilation
/// with [`RWireLibError::InvalidFilter`].
pub fn compile(expression: &str) -> Result<Predicate> {
    let mut clauses: Vec<Clause> = Vec::new();

    for item in expression.split('&') {
        let item = item.trim();

        if item.is_empty() {
            continue;
        }

        if !validate(item) {
            return Err(RWireLibError::InvalidFilter(item.to_string()));
        }

        let Some((name, value)) = item.split_once('=') else {
            return Err(RWireLibError::InvalidFilter(item.to_string()));
        };

        clauses.push(Clause {
            field: Field::resolve(name.trim_end()),
            value: value.trim_start().to_string(),
        });
    }

    Ok(Predicate { clauses })
}

fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();

    let Some(first) = chars.next() else {
        return false;
    };

    if !first.is_ascii_uppercase() {
        return false;
    }

    let mut rest = 0usize;

    for c in chars {
        if !c.is_ascii_alphabetic() {
            return false;
        }
        rest += 1;
    }

    // the field name pattern requires at least two characters
    rest >= 1
}

fn is_value_text(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| {
            matches!(c, 'a'..='z' | '0'..='9' | '%' | ':' | '.' | '/' | '\\')
        })
}

#[cfg(test)]
#[path = "./filter_tests.rs"]
mod tests;
