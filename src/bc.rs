//! Boundary-condition id mapping.
//!
//! Mesh files carry physical boundary tags (small positive integers); each
//! solver field translates them into its own boundary-condition codes
//! through a dispatch table keyed by `(tag, field label)`. Field labels
//! follow the option-key convention: `"velocity"`, `"pressure"`,
//! `"scalar00"`, `"scalar01"`, ... The table is filled by the embedding
//! application during case setup; unmapped pairs resolve to
//! [`bc_code::NONE`], which downstream kernels treat as "no condition".

use std::collections::BTreeMap;

/// Solver-side boundary-condition codes.
pub mod bc_code {
    /// No condition (interior face or unmapped tag).
    pub const NONE: i32 = 0;
    /// Prescribed value on the boundary.
    pub const DIRICHLET: i32 = 1;
    /// Prescribed flux through the boundary.
    pub const NEUMANN: i32 = 2;
    /// Zero flux (insulated / symmetry).
    pub const ZERO_FLUX: i32 = 3;
}

/// Dispatch table from mesh boundary tags to per-field condition codes.
#[derive(Clone, Debug, Default)]
pub struct BcMap {
    table: BTreeMap<(i32, String), i32>,
}

impl BcMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `tag` to `code` for the given field label.
    pub fn set(&mut self, tag: i32, field: impl Into<String>, code: i32) {
        self.table.insert((tag, field.into().to_lowercase()), code);
    }

    /// Condition code for `(tag, field)`; [`bc_code::NONE`] when the tag is
    /// zero (interior) or unmapped.
    pub fn id(&self, tag: i32, field: &str) -> i32 {
        if tag == 0 {
            return bc_code::NONE;
        }
        self.table
            .get(&(tag, field.to_lowercase()))
            .copied()
            .unwrap_or(bc_code::NONE)
    }

    /// Map `tag` to `code` for every label in `fields`.
    pub fn set_all(&mut self, tag: i32, fields: &[&str], code: i32) {
        for field in fields {
            self.set(tag, *field, code);
        }
    }
}

/// Label used to look up scalar-field boundary conditions, e.g.
/// `scalar_field_label(3)` gives `"scalar03"`.
pub fn scalar_field_label(field: usize) -> String {
    format!("scalar{:02}", field)
}
