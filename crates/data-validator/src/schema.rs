//! Route field declarations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive kind a field must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Text,
    File,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Numeric => "a number",
            FieldKind::Text => "a string",
            FieldKind::File => "a file",
        })
    }
}

/// One required field of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn numeric(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Numeric }
    }

    pub const fn text(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Text }
    }

    pub const fn file(name: &'static str) -> Self {
        Self { name, kind: FieldKind::File }
    }
}
