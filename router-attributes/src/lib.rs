//! Compiled routing-attribute evaluator: a bit-set-encoded tag dictionary, a
//! small rule/expression DSL, and the router facade that turns evaluated
//! attributes into the access/oneway/speed/priority/turn-cost decisions a
//! router needs per road.
//!
//! See `SPEC_FULL.md` at the workspace root for the full module breakdown;
//! `DESIGN.md` records what each piece is grounded on.

pub mod attribute;
pub mod cache;
pub mod dictionary;
pub mod error;
pub mod expression;
pub mod params;
pub mod rule;
pub mod router;
pub mod value;

pub use attribute::{AttributeContext, AttributeKind};
pub use cache::ValueCache;
pub use dictionary::{RegionId, RegionTagDecoder, TagDictionary, TagValueId};
pub use error::Error;
pub use expression::{Comparison, EvalContext, Expression, Operand};
pub use params::ParameterContext;
pub use rule::Rule;
pub use router::{Road, Router};
pub use value::{NumericType, parse_value};
