//! Column role classification.
//!
//! Assigns each column of a result set to exactly one [`ColumnRole`] based
//! solely on its name. Data values never influence the outcome.

use std::collections::HashSet;
use std::fmt;

/// The role a column plays in the emitted metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    /// Cell text becomes a tag value.
    Tag,
    /// Cell text is parsed as a 64-bit signed integer field.
    TypedNumeric,
    /// Cell text becomes a string field.
    DefaultText,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag => write!(f, "tag"),
            Self::TypedNumeric => write!(f, "int field"),
            Self::DefaultText => write!(f, "string field"),
        }
    }
}

/// Per-query mapping from column position to role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    roles: Vec<ColumnRole>,
}

impl Classification {
    /// Roles in column order.
    pub fn roles(&self) -> &[ColumnRole] {
        &self.roles
    }

    /// Role of the column at `position`, if it exists.
    pub fn role(&self, position: usize) -> Option<ColumnRole> {
        self.roles.get(position).copied()
    }

    /// Number of classified columns.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns true if the result set had no columns.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Number of columns with the given role.
    pub fn count(&self, role: ColumnRole) -> usize {
        self.roles.iter().filter(|r| **r == role).count()
    }

    /// Positions of the columns with the given role, in column order.
    pub fn positions(&self, role: ColumnRole) -> impl Iterator<Item = usize> + '_ {
        self.roles
            .iter()
            .enumerate()
            .filter(move |(_, r)| **r == role)
            .map(|(i, _)| i)
    }
}

/// Classifies the columns of one result set.
///
/// Tag membership is checked first, so a name present in both sets is a
/// tag. Duplicate column names are classified independently and always
/// end up with the same role.
pub fn classify<S: AsRef<str>>(
    column_names: &[S],
    tag_names: &HashSet<String>,
    numeric_names: &HashSet<String>,
) -> Classification {
    let roles = column_names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            if tag_names.contains(name) {
                ColumnRole::Tag
            } else if numeric_names.contains(name) {
                ColumnRole::TypedNumeric
            } else {
                ColumnRole::DefaultText
            }
        })
        .collect();

    Classification { roles }
}
