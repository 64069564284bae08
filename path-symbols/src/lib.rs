//! On-path symbol placement: given a path in the fixed 31-bit world
//! projection and a run of symbols to repeat along it, computes where each
//! symbol instance should be anchored at every zoom level in a range, such
//! that placements at lower zooms are preserved bit-for-bit at higher ones.
//!
//! See `SPEC_FULL.md` at the workspace root for the module breakdown;
//! `DESIGN.md` records what each piece is grounded on.

pub mod error;
pub mod path;
pub mod placement;
pub mod symbol;

pub use error::Error;
pub use path::PathPoint;
pub use placement::{compute_pin_points, ComputedPinPoint};
pub use symbol::SymbolDesc;
