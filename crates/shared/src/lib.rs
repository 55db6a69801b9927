//! Types shared between the formset controller and the tools built on it.

pub mod domain;
pub mod error;
pub mod protocol;
