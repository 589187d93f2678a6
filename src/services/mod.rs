pub mod critical;
pub mod validation;

pub use critical::{Comparison, Component, CriticalRule, CriticalRules};
pub use validation::{prepare_append, prepare_create, prepare_update, validate_patient};
