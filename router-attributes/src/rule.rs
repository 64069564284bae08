//! A single rule: a guard (bit-set/tag tests plus expressions) and a select
//! value contributed when the guard matches.
//!
//! Grounded on `RouteAttributeEvalRule` in `generalRouter.cpp`. The guard's
//! five-step short-circuit order (`matches`) is preserved exactly as the
//! original runs it, since rule order and short-circuiting are part of the
//! documented, testable contract (spec §8's "Short-circuit" property).
//!
//! Note on bit-set alignment: the original manually zero-extends
//! (`align`/`increaseSize`) before every `dynbitset` operation because
//! Boost's `dynamic_bitset` requires equal-length operands. `bit_set::BitSet`
//! treats bits beyond a set's current storage as simply absent and grows on
//! insert, so `is_subset`/`is_disjoint`/intersection here never need (or can
//! even express) truncation — the "never shrink, zero-extend" invariant from
//! spec §4.2 holds structurally rather than by an explicit step.

use std::collections::HashSet;

use bit_set::BitSet;

use crate::error::Error;
use crate::expression::{EvalContext, Expression, Operand};
use crate::value::NumericType;

/// A rule's guard plus the value it contributes when matched.
#[derive(Clone, Debug)]
pub struct Rule {
    filter_types: BitSet,
    filter_not_types: BitSet,
    only_tags: HashSet<String>,
    only_not_tags: HashSet<String>,
    expressions: Vec<Expression>,
    parameters: Vec<String>,
    select_type: NumericType,
    select_value_def: String,
    select_operand: Operand,
}

impl Rule {
    /// # Errors
    ///
    /// Returns [`Error::EmptyOperand`] if `select_value_def` is empty (see
    /// [`Operand::parse`]).
    pub fn new(
        select_value_def: impl Into<String>,
        select_type: NumericType,
    ) -> Result<Self, Error> {
        let select_value_def = select_value_def.into();
        let select_operand = Operand::parse(&select_value_def, select_type)?;
        Ok(Self {
            filter_types: BitSet::new(),
            filter_not_types: BitSet::new(),
            only_tags: HashSet::new(),
            only_not_tags: HashSet::new(),
            expressions: Vec::new(),
            parameters: Vec::new(),
            select_type,
            select_value_def,
            select_operand,
        })
    }

    /// Requires that the bit for `(tag, value)` (already resolved to a
    /// [`crate::dictionary::TagValueId`] by the caller via
    /// `TagDictionary::register`) be present in the input.
    pub fn require_type(&mut self, id: u32) -> &mut Self {
        self.filter_types.insert(id as usize);
        self
    }

    /// Requires that the bit for `(tag, value)` be absent from the input.
    pub fn forbid_type(&mut self, id: u32) -> &mut Self {
        self.filter_not_types.insert(id as usize);
        self
    }

    /// Requires that some id for `tag` be present (a "free" tag test,
    /// `tag=*`).
    pub fn require_any_value_of(&mut self, tag: impl Into<String>) -> &mut Self {
        self.only_tags.insert(tag.into());
        self
    }

    /// Requires that no id for `tag` be present (`!tag=*`).
    pub fn forbid_any_value_of(&mut self, tag: impl Into<String>) -> &mut Self {
        self.only_not_tags.insert(tag.into());
        self
    }

    pub fn add_expression(&mut self, expr: Expression) -> &mut Self {
        self.expressions.push(expr);
        self
    }

    /// Records informational metadata about a parameter this rule's
    /// selector or expressions reference. Purely descriptive (matches
    /// `registerParamConditions` in the original); evaluation resolves
    /// parameters directly through `Operand::Param`.
    pub fn note_parameter(&mut self, name: impl Into<String>) -> &mut Self {
        self.parameters.push(name.into());
        self
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Guard evaluation in the original's fixed short-circuit order.
    pub fn matches(&self, ctx: &EvalContext, input_bits: &BitSet) -> bool {
        if !self.filter_types.is_subset(input_bits) {
            return false;
        }
        if !self.filter_not_types.is_disjoint(input_bits) {
            return false;
        }
        for tag in &self.only_tags {
            let mut hit = ctx.dictionary.tag_index(tag);
            hit.intersect_with(input_bits);
            if hit.is_empty() {
                return false;
            }
        }
        for tag in &self.only_not_tags {
            let mut hit = ctx.dictionary.tag_index(tag);
            hit.intersect_with(input_bits);
            if !hit.is_empty() {
                return false;
            }
        }
        for expr in &self.expressions {
            if !expr.evaluate(ctx, input_bits) {
                return false;
            }
        }
        true
    }

    /// Selector evaluation (`calcSelectValue`), assuming the guard already
    /// matched.
    pub fn select_value(&self, ctx: &EvalContext, input_bits: &BitSet) -> Option<f64> {
        self.select_operand.resolve(ctx, input_bits, self.select_type)
    }

    pub fn select_value_def(&self) -> &str {
        &self.select_value_def
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ValueCache;
    use crate::dictionary::TagDictionary;
    use crate::params::ParameterContext;

    fn dict_with(pairs: &[(&str, &str)]) -> (TagDictionary, Vec<u32>) {
        let dict = TagDictionary::new();
        let ids = pairs.iter().map(|(t, v)| dict.register(t, v)).collect();
        (dict, ids)
    }

    #[test]
    fn access_gate_order_sensitivity() {
        let (dict, ids) = dict_with(&[("access", "no"), ("access", "yes")]);
        let no_id = ids[0];
        let yes_id = ids[1];

        let mut deny = Rule::new("-1", NumericType::Plain).unwrap();
        deny.require_type(no_id);
        let mut allow = Rule::new("1", NumericType::Plain).unwrap();
        allow.require_type(yes_id);

        let cache = ValueCache::new();
        let params = ParameterContext::new();
        let ctx = EvalContext {
            dictionary: &dict,
            cache: &cache,
            params: &params,
        };

        let mut bits_yes = BitSet::new();
        bits_yes.insert(yes_id as usize);
        let mut bits_no = BitSet::new();
        bits_no.insert(no_id as usize);

        let rules = [deny.clone(), allow.clone()];
        let eval = |rules: &[Rule], bits: &BitSet| -> Option<f64> {
            rules
                .iter()
                .find(|r| r.matches(&ctx, bits))
                .and_then(|r| r.select_value(&ctx, bits))
        };
        assert_eq!(eval(&rules, &bits_yes), Some(1.0));
        assert_eq!(eval(&rules, &bits_no), Some(-1.0));

        // With only one rule ever matching per input here, swapping order
        // doesn't change the winner — it changes which rule *would* win when
        // both match, which is covered by the attribute-context test.
        let reversed = [allow, deny];
        assert_eq!(eval(&reversed, &bits_yes), Some(1.0));
        assert_eq!(eval(&reversed, &bits_no), Some(-1.0));
    }

    #[test]
    fn short_circuit_false_guard_does_not_change_result() {
        let (dict, ids) = dict_with(&[("highway", "primary")]);
        let mut r = Rule::new("50", NumericType::Plain).unwrap();
        r.require_type(ids[0]);
        // A trivially-false extra guard: forbid the same bit we just required.
        r.forbid_type(ids[0]);

        let cache = ValueCache::new();
        let params = ParameterContext::new();
        let ctx = EvalContext {
            dictionary: &dict,
            cache: &cache,
            params: &params,
        };
        let mut bits = BitSet::new();
        bits.insert(ids[0] as usize);
        assert!(!r.matches(&ctx, &bits));
    }

    #[test]
    fn speed_dereference() {
        let dict = TagDictionary::new();
        let highway_id = dict.register("highway", "primary");
        let maxspeed_id = dict.register("maxspeed", "50");

        let mut r = Rule::new("$maxspeed", NumericType::Speed).unwrap();
        r.require_type(highway_id);

        let mut bits = BitSet::new();
        bits.insert(highway_id as usize);
        bits.insert(maxspeed_id as usize);

        let cache = ValueCache::new();
        let params = ParameterContext::new();
        let ctx = EvalContext {
            dictionary: &dict,
            cache: &cache,
            params: &params,
        };
        assert!(r.matches(&ctx, &bits));
        let value = r.select_value(&ctx, &bits).unwrap();
        assert!((value - 50.0 / 3.6).abs() < 1e-9);
    }

    #[test]
    fn empty_select_value_def_is_rejected() {
        assert_eq!(
            Rule::new("", NumericType::Plain).unwrap_err(),
            crate::error::Error::EmptyOperand
        );
    }
}
