use thiserror::Error;

/// Errors that can occur while *constructing* rules, expressions, or router
/// metadata from DSL text.
///
/// Evaluation-time problems (missing values, bit-set shape mismatches) are
/// not represented here: per the evaluator's contract they never reach the
/// caller as an `Err`, they're logged and folded into `MISSING` or a
/// documented fallback instead.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("unknown numeric type {0:?} in selector/expression declaration")]
    UnknownNumericType(String),
    #[error("empty operand text in selector or expression")]
    EmptyOperand,
}
