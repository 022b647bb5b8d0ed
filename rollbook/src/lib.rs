//! The Rollbook Library.
//!
//! Domain types and client-side aggregation for the student management
//! system. Nothing in here performs I/O; the `rollbook` client drives
//! the backend and feeds fetched records through these types.

#![deny(
    asm_sub_register,
    deprecated,
    missing_abi,
    unsafe_code,
    unused_macros,
    unused_must_use,
    unused_unsafe
)]
#![deny(clippy::from_over_into, clippy::needless_question_mark)]
#![cfg_attr(
    not(debug_assertions),
    deny(unused_imports, unused_mut, unused_variables,)
)]

pub mod api;
pub mod attendance;
pub mod error;
pub mod id;
pub mod marks;
pub mod sheet;
pub mod student;
pub mod subject;

pub use error::{RollbookError, RollbookResult};
