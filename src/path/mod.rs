//! Path canonicalization under a simulated platform's rules.

mod normalizer;
mod os;

pub use normalizer::{normalize, normalize_drive_name};
pub use os::{PathRules, SimulatedOs};

pub(crate) use normalizer::root_of;
pub(crate) use os::comparison_key;
