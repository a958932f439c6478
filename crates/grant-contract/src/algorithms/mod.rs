//! Pure computations over grant snapshots.
//!
//! - `budget`: two-tier allocation engine and admission check
//! - `projections`: wallet math and query filters
//! - `transitions`: one snapshot function per mutating operation

pub mod budget;
pub mod projections;
pub mod transitions;

pub use budget::{admit, check_reallocation, tier_ceiling, Admission, Commitments};
