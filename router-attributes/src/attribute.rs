//! One `AttributeContext` per attribute kind: an ordered rule list plus a
//! default, evaluated with first-match semantics.
//!
//! Grounded on `RouteAttributeContext`/`RouteDataObjectAttribute` in the
//! original.

use bit_set::BitSet;

use crate::expression::EvalContext;
use crate::rule::Rule;

/// The named decisions a [`crate::router::Router`] asks of a road, as
/// enumerated in spec §6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Access,
    OneWay,
    Obstacles,
    RoutingObstacles,
    RoadSpeed,
    RoadPriorities,
    PenaltyTransition,
}

/// An ordered rule list for one [`AttributeKind`]; the first matching rule's
/// select value wins.
pub struct AttributeContext {
    kind: AttributeKind,
    rules: Vec<Rule>,
}

impl AttributeContext {
    pub fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            rules: Vec::new(),
        }
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Walks rules in order; the first whose guard matches contributes its
    /// select value. Falls back to `default` if no rule matches (or every
    /// matching rule's selector itself resolves to `MISSING`, e.g. an
    /// unresolved `:param`).
    pub fn eval(&self, ctx: &EvalContext, input_bits: &BitSet, default: f64) -> f64 {
        for rule in &self.rules {
            if rule.matches(ctx, input_bits)
                && let Some(value) = rule.select_value(ctx, input_bits)
            {
                return value;
            }
        }
        tracing::debug!(kind = ?self.kind, "no rule matched; using default");
        default
    }

    /// As [`AttributeContext::eval`], but truncated to an integer — used for
    /// `Access`/`OneWay`, the two integer-valued attributes (spec §4.2).
    #[allow(clippy::cast_possible_truncation)]
    pub fn eval_int(&self, ctx: &EvalContext, input_bits: &BitSet, default: i32) -> i32 {
        self.eval(ctx, input_bits, f64::from(default)).trunc() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ValueCache;
    use crate::dictionary::TagDictionary;
    use crate::params::ParameterContext;
    use crate::value::NumericType;

    #[test]
    fn first_match_wins_both_orders() {
        let dict = TagDictionary::new();
        let a = dict.register("highway", "primary");
        let b = dict.register("surface", "paved");

        let mut r1 = Rule::new("1", NumericType::Plain).unwrap();
        r1.require_type(a);
        let mut r2 = Rule::new("2", NumericType::Plain).unwrap();
        r2.require_type(b);

        let mut bits = BitSet::new();
        bits.insert(a as usize);
        bits.insert(b as usize);

        let cache = ValueCache::new();
        let params = ParameterContext::new();
        let ctx = EvalContext {
            dictionary: &dict,
            cache: &cache,
            params: &params,
        };

        let mut ctx1 = AttributeContext::new(AttributeKind::RoadPriorities);
        ctx1.add_rule(r1.clone()).add_rule(r2.clone());
        assert_eq!(ctx1.eval(&ctx, &bits, 0.0), 1.0);

        let mut ctx2 = AttributeContext::new(AttributeKind::RoadPriorities);
        ctx2.add_rule(r2).add_rule(r1);
        assert_eq!(ctx2.eval(&ctx, &bits, 0.0), 2.0);
    }

    #[test]
    fn no_match_falls_back_to_default() {
        let dict = TagDictionary::new();
        let a = dict.register("highway", "primary");
        let mut r = Rule::new("1", NumericType::Plain).unwrap();
        r.require_type(a);

        let mut ac = AttributeContext::new(AttributeKind::Access);
        ac.add_rule(r);

        let cache = ValueCache::new();
        let params = ParameterContext::new();
        let ctx = EvalContext {
            dictionary: &dict,
            cache: &cache,
            params: &params,
        };
        let bits = BitSet::new();
        assert_eq!(ac.eval(&ctx, &bits, 7.0), 7.0);
    }
}
