//! Common utilities for integration tests

pub mod test_helpers;

#[allow(unused_imports)]
pub use test_helpers::{
    reference_physiology, reference_substance, reference_systemic, relative_error,
    scenario_with_deposition,
};
