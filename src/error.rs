// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors reported by fallible operations.
//!
//! Every operation in this crate is pure: when one fails, its inputs are
//! left exactly as they were.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A lookup that requires the key to be present didn't find it.
    #[error("key not found: {key}")]
    KeyNotFound {
        /// The `Debug` rendering of the missing key.
        key: String,
    },

    /// A relation row doesn't have one value per header attribute.
    #[error("row {row} has {found} values but the header has {expected} attributes")]
    ShapeMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A value can't take part in hashing without breaking `Eq`.
    #[error("cannot hash {type_name}: {reason}")]
    Unhashable {
        type_name: &'static str,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
