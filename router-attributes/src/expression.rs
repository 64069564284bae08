//! Numeric sub-expressions (`LE`/`GE`) used as extra rule guard conditions.
//!
//! Grounded on `RouteAttributeExpression` in `generalRouter.cpp`: two
//! operands, each either a literal, a `$tag` dereference, or a `:param`
//! substitution, compared with `<=` or `>=`.

use bit_set::BitSet;

use crate::cache::ValueCache;
use crate::dictionary::TagDictionary;
use crate::error::Error;
use crate::params::ParameterContext;
use crate::value::{NumericType, parse_value};

/// Everything an operand/rule needs to resolve against: the dictionary, the
/// shared `ruleToValue` cache, and the caller's parameters.
///
/// Rules and expressions never hold a reference to these; per the "Cyclic
/// ownership" design note, they're passed explicitly into every evaluation
/// call instead.
pub struct EvalContext<'a> {
    pub dictionary: &'a TagDictionary,
    pub cache: &'a ValueCache,
    pub params: &'a ParameterContext,
}

/// A single operand of a selector or an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A literal, parsed once at construction time.
    Literal(Option<f64>),
    /// `$tagname` — dereference whichever present tag matches `tagname`.
    Tag(String),
    /// `:paramname` — substitute a parameter's value.
    Param(String),
}

impl Operand {
    /// Parses the DSL text for an operand: a leading `$` means [`Operand::Tag`],
    /// a leading `:` means [`Operand::Param`], anything else is a literal
    /// parsed immediately under `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyOperand`] if `text` (or the name left after
    /// stripping a `$`/`:` prefix) is empty. A literal that merely fails to
    /// parse as a number (e.g. `"abc"`) is not an error here — it resolves to
    /// [`Operand::Literal(None)`], the `MISSING` sentinel.
    pub fn parse(text: &str, ty: NumericType) -> Result<Self, Error> {
        if let Some(tag) = text.strip_prefix('$') {
            if tag.is_empty() {
                return Err(Error::EmptyOperand);
            }
            Ok(Operand::Tag(tag.to_string()))
        } else if let Some(param) = text.strip_prefix(':') {
            if param.is_empty() {
                return Err(Error::EmptyOperand);
            }
            Ok(Operand::Param(param.to_string()))
        } else if text.is_empty() {
            Err(Error::EmptyOperand)
        } else {
            Ok(Operand::Literal(parse_value(text, ty)))
        }
    }

    /// Resolves the operand's value against the evaluation context. `input_bits`
    /// is the encoded tag set; `ty` is the numeric type used to interpret a
    /// dereferenced tag's value text.
    #[allow(clippy::cast_possible_truncation)]
    pub fn resolve(
        &self,
        ctx: &EvalContext,
        input_bits: &BitSet,
        ty: NumericType,
    ) -> Option<f64> {
        match self {
            Operand::Literal(v) => *v,
            Operand::Tag(tag) => {
                let mut hit = ctx.dictionary.tag_index(tag);
                hit.intersect_with(input_bits);
                let id = hit.iter().next()? as u32;
                ctx.cache.get_or_parse(id, ty, ctx.dictionary)
            }
            Operand::Param(name) => ctx.params.get(name).and_then(|v| parse_value(v, ty)),
        }
    }
}

/// The comparison applied between the two operands of an [`Expression`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// Operand 0 ≤ operand 1.
    LessOrEqual,
    /// Operand 0 ≥ operand 1.
    GreaterOrEqual,
}

/// A numeric sub-expression contributing to a rule's guard.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    operands: [Operand; 2],
    comparison: Comparison,
    value_type: NumericType,
}

impl Expression {
    /// # Errors
    ///
    /// Returns [`Error::EmptyOperand`] if either `lhs` or `rhs` is empty (see
    /// [`Operand::parse`]).
    pub fn new(
        lhs: &str,
        rhs: &str,
        comparison: Comparison,
        value_type: NumericType,
    ) -> Result<Self, Error> {
        Ok(Self {
            operands: [
                Operand::parse(lhs, value_type)?,
                Operand::parse(rhs, value_type)?,
            ],
            comparison,
            value_type,
        })
    }

    /// Evaluates the expression. `false` whenever either operand is `MISSING`.
    pub fn evaluate(&self, ctx: &EvalContext, input_bits: &BitSet) -> bool {
        let lhs = self.operands[0].resolve(ctx, input_bits, self.value_type);
        let rhs = self.operands[1].resolve(ctx, input_bits, self.value_type);
        match (lhs, rhs) {
            (Some(a), Some(b)) => match self.comparison {
                Comparison::LessOrEqual => a <= b,
                Comparison::GreaterOrEqual => a >= b,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(dictionary: &'a TagDictionary, cache: &'a ValueCache, params: &'a ParameterContext) -> EvalContext<'a> {
        EvalContext { dictionary, cache, params }
    }

    #[test]
    fn ge_param_vs_tag_weight_limit() {
        let dict = TagDictionary::new();
        let cache = ValueCache::new();
        let id = dict.register("maxweight", "3.5");
        let mut bits = BitSet::new();
        bits.insert(id as usize);

        let expr = Expression::new(
            ":vehicleWeight",
            "$maxweight",
            Comparison::GreaterOrEqual,
            NumericType::Weight,
        )
        .unwrap();

        let mut params = ParameterContext::new();
        params.set("vehicleWeight", "5");
        assert!(expr.evaluate(&ctx(&dict, &cache, &params), &bits));

        let mut params2 = ParameterContext::new();
        params2.set("vehicleWeight", "2");
        assert!(!expr.evaluate(&ctx(&dict, &cache, &params2), &bits));
    }

    #[test]
    fn missing_operand_is_false() {
        let dict = TagDictionary::new();
        let cache = ValueCache::new();
        let bits = BitSet::new();
        let params = ParameterContext::new();
        let expr = Expression::new(":unset", "1", Comparison::LessOrEqual, NumericType::Plain).unwrap();
        assert!(!expr.evaluate(&ctx(&dict, &cache, &params), &bits));
    }

    #[test]
    fn empty_operand_text_is_rejected() {
        assert_eq!(
            Operand::parse("", NumericType::Plain),
            Err(Error::EmptyOperand)
        );
        assert_eq!(Operand::parse("$", NumericType::Plain), Err(Error::EmptyOperand));
        assert_eq!(Operand::parse(":", NumericType::Plain), Err(Error::EmptyOperand));
        assert_eq!(
            Expression::new("", "1", Comparison::LessOrEqual, NumericType::Plain),
            Err(Error::EmptyOperand)
        );
    }
}
