//! The router facade: attribute queries, router-wide metadata, and turn-cost
//! computation.
//!
//! Grounded on `GeneralRouter` in `generalRouter.cpp` — `acceptLine`,
//! `isOneWay`, `defineObstacle`, `defineRoutingObstacle`,
//! `defineVehicleSpeed`, `defineRoutingSpeed`, `defineSpeedPriority`,
//! `definePenaltyTransition`, and `calculateTurnTime`.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use bit_set::BitSet;

use crate::attribute::{AttributeContext, AttributeKind};
use crate::cache::ValueCache;
use crate::dictionary::{RegionId, RegionTagDecoder, TagDictionary};
use crate::expression::EvalContext;
use crate::params::ParameterContext;
use crate::value::{kmh_to_ms, parse_value, NumericType};

/// A routable road object, as handed to the router by the (out-of-scope)
/// caller. Tag ids are in the road's own region-local numbering; the router
/// encodes them via [`TagDictionary::encode`] before evaluating rules.
pub trait Road {
    fn id(&self) -> u64;
    fn region(&self) -> RegionId;
    /// The road's own (non-point-specific) local tag ids.
    fn own_type_ids(&self) -> &[u32];
    /// Local tag ids attached to `point`, if any.
    fn point_type_ids(&self, point: usize) -> &[u32];
    /// Heading (radians) of the segment starting at `index`, oriented
    /// forward if `forward` else backward.
    fn direction_route(&self, index: usize, forward: bool) -> f64;
    /// Whether this road is part of a roundabout.
    fn roundabout(&self) -> bool;
}

/// Compiled rule set plus router-wide metadata; built once, queried many
/// times (spec §4.5).
pub struct Router {
    dictionary: TagDictionary,
    cache: ValueCache,
    contexts: HashMap<AttributeKind, AttributeContext>,
    attributes: HashMap<String, String>,
    impassable_road_ids: HashSet<u64>,
    restrictions_aware: bool,
    left_turn: f64,
    right_turn: f64,
    roundabout_turn: f64,
    min_default_speed: f64,
    max_default_speed: f64,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            dictionary: TagDictionary::new(),
            cache: ValueCache::new(),
            contexts: HashMap::new(),
            attributes: HashMap::new(),
            impassable_road_ids: HashSet::new(),
            restrictions_aware: false,
            left_turn: 0.0,
            right_turn: 0.0,
            roundabout_turn: 0.0,
            min_default_speed: kmh_to_ms(10.0),
            max_default_speed: kmh_to_ms(130.0),
        }
    }

    pub fn dictionary(&self) -> &TagDictionary {
        &self.dictionary
    }

    pub fn set_context(&mut self, ctx: AttributeContext) {
        self.contexts.insert(ctx.kind(), ctx);
    }

    pub fn add_impassable_road(&mut self, id: u64) {
        self.impassable_road_ids.insert(id);
    }

    pub fn is_impassable(&self, id: u64) -> bool {
        self.impassable_road_ids.contains(&id)
    }

    /// Registers router metadata, applying the side effects for recognized
    /// keys (spec §6). Unrecognized keys are stored but otherwise inert.
    ///
    /// See SPEC_FULL.md §2.5: the original re-parses each recognized value
    /// through a key lookup that (due to what reads as a parameter-order
    /// slip) never actually finds the value it just stored. We parse the
    /// freshly supplied value directly instead of reproducing that.
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_string(), value.to_string());
        match key {
            "restrictionsAware" => {
                self.restrictions_aware = match value {
                    "true" => true,
                    "false" => false,
                    other => {
                        tracing::warn!(value = other, "unparseable restrictionsAware; keeping previous value");
                        self.restrictions_aware
                    }
                };
            }
            "leftTurn" => self.left_turn = self.parse_seconds_or_keep(value, self.left_turn),
            "rightTurn" => self.right_turn = self.parse_seconds_or_keep(value, self.right_turn),
            "roundaboutTurn" => {
                self.roundabout_turn = self.parse_seconds_or_keep(value, self.roundabout_turn);
            }
            "minDefaultSpeed" => {
                self.min_default_speed =
                    kmh_to_ms(self.parse_seconds_or_keep(value, crate::value::ms_to_kmh(self.min_default_speed)));
            }
            "maxDefaultSpeed" => {
                self.max_default_speed =
                    kmh_to_ms(self.parse_seconds_or_keep(value, crate::value::ms_to_kmh(self.max_default_speed)));
            }
            _ => {}
        }
    }

    fn parse_seconds_or_keep(&self, value: &str, keep: f64) -> f64 {
        match parse_value(value, NumericType::Plain) {
            Some(v) => v,
            None => {
                tracing::warn!(value, "unparseable numeric router attribute; keeping previous value");
                keep
            }
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn restrictions_aware(&self) -> bool {
        self.restrictions_aware
    }

    pub fn min_default_speed(&self) -> f64 {
        self.min_default_speed
    }

    pub fn max_default_speed(&self) -> f64 {
        self.max_default_speed
    }

    fn eval_ctx<'a>(&'a self, params: &'a ParameterContext) -> EvalContext<'a> {
        EvalContext {
            dictionary: &self.dictionary,
            cache: &self.cache,
            params,
        }
    }

    fn encode_own(&self, road: &dyn Road, decoder: &dyn RegionTagDecoder) -> BitSet {
        self.dictionary
            .encode(road.region(), road.own_type_ids(), decoder)
    }

    fn encode_point(&self, road: &dyn Road, point: usize, decoder: &dyn RegionTagDecoder) -> BitSet {
        self.dictionary
            .encode(road.region(), road.point_type_ids(point), decoder)
    }

    fn eval_attribute(
        &self,
        kind: AttributeKind,
        bits: &BitSet,
        params: &ParameterContext,
        default: f64,
    ) -> f64 {
        match self.contexts.get(&kind) {
            Some(ctx) => ctx.eval(&self.eval_ctx(params), bits, default),
            None => default,
        }
    }

    /// `acceptLine`: true iff the ACCESS attribute is non-negative and the
    /// road isn't in the impassable set.
    pub fn accept_line(&self, road: &dyn Road, decoder: &dyn RegionTagDecoder, params: &ParameterContext) -> bool {
        if self.is_impassable(road.id()) {
            return false;
        }
        let bits = self.encode_own(road, decoder);
        self.eval_attribute(AttributeKind::Access, &bits, params, 0.0) >= 0.0
    }

    /// `isOneWay`: +1 forward, -1 reverse, 0 bidirectional.
    pub fn is_one_way(&self, road: &dyn Road, decoder: &dyn RegionTagDecoder, params: &ParameterContext) -> i32 {
        let bits = self.encode_own(road, decoder);
        match self.contexts.get(&AttributeKind::OneWay) {
            Some(ctx) => ctx.eval_int(&self.eval_ctx(params), &bits, 0),
            None => 0,
        }
    }

    pub fn define_obstacle(
        &self,
        road: &dyn Road,
        point: usize,
        decoder: &dyn RegionTagDecoder,
        params: &ParameterContext,
    ) -> f64 {
        if road.point_type_ids(point).is_empty() {
            return 0.0;
        }
        let bits = self.encode_point(road, point, decoder);
        self.eval_attribute(AttributeKind::Obstacles, &bits, params, 0.0)
    }

    pub fn define_routing_obstacle(
        &self,
        road: &dyn Road,
        point: usize,
        decoder: &dyn RegionTagDecoder,
        params: &ParameterContext,
    ) -> f64 {
        if road.point_type_ids(point).is_empty() {
            return 0.0;
        }
        let bits = self.encode_point(road, point, decoder);
        self.eval_attribute(AttributeKind::RoutingObstacles, &bits, params, 0.0)
    }

    pub fn define_vehicle_speed(&self, road: &dyn Road, decoder: &dyn RegionTagDecoder, params: &ParameterContext) -> f64 {
        let bits = self.encode_own(road, decoder);
        self.eval_attribute(AttributeKind::RoadSpeed, &bits, params, self.min_default_speed)
    }

    pub fn define_routing_speed(&self, road: &dyn Road, decoder: &dyn RegionTagDecoder, params: &ParameterContext) -> f64 {
        self.define_vehicle_speed(road, decoder, params)
            .min(self.max_default_speed)
    }

    pub fn define_speed_priority(&self, road: &dyn Road, decoder: &dyn RegionTagDecoder, params: &ParameterContext) -> f64 {
        let bits = self.encode_own(road, decoder);
        self.eval_attribute(AttributeKind::RoadPriorities, &bits, params, 1.0)
    }

    pub fn define_penalty_transition(
        &self,
        road: &dyn Road,
        decoder: &dyn RegionTagDecoder,
        params: &ParameterContext,
    ) -> f64 {
        if !self.contexts.contains_key(&AttributeKind::PenaltyTransition) {
            return 0.0;
        }
        let bits = self.encode_own(road, decoder);
        self.eval_attribute(AttributeKind::PenaltyTransition, &bits, params, 0.0)
    }

    /// Normalizes an angle difference to `(-pi, pi]`, matching
    /// `alignAngleDifference` in the original.
    fn align_angle_difference(diff: f64) -> f64 {
        let mut d = diff % (2.0 * PI);
        if d <= -PI {
            d += 2.0 * PI;
        } else if d > PI {
            d -= 2.0 * PI;
        }
        d
    }

    /// `calculateTurnTime`, per spec §4.3.
    ///
    /// The original reads `curr`/`prev`'s segment-start indices off a
    /// `RouteSegment` wrapper object; since this crate has no such
    /// abstraction, `curr_segment_start`/`prev_segment_start` are passed
    /// explicitly alongside the segment-end indices instead.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_turn_time(
        &self,
        curr: &dyn Road,
        curr_segment_end: usize,
        curr_segment_start: usize,
        prev: &dyn Road,
        prev_segment_end: usize,
        prev_segment_start: usize,
        decoder: &dyn RegionTagDecoder,
        params: &ParameterContext,
    ) -> f64 {
        let ts = self.define_penalty_transition(curr, decoder, params);
        let ts_prev = self.define_penalty_transition(prev, decoder, params);
        if ts != ts_prev {
            return (ts - ts_prev).abs() / 2.0;
        }

        if curr.roundabout() && !prev.roundabout() && self.roundabout_turn > 0.0 {
            return self.roundabout_turn;
        }

        if self.left_turn > 0.0 || self.right_turn > 0.0 {
            let a1 = curr.direction_route(curr_segment_start, curr_segment_start < curr_segment_end);
            let a2 = prev.direction_route(prev_segment_end, prev_segment_end < prev_segment_start);
            let diff = Self::align_angle_difference(a1 - a2 - PI).abs();
            if diff > 2.0 * PI / 3.0 {
                return self.left_turn;
            } else if diff > PI / 2.0 {
                return self.right_turn;
            }
            return 0.0;
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    struct NoTags;
    impl RegionTagDecoder for NoTags {
        fn decode(&self, _local_id: u32) -> Option<(String, String)> {
            None
        }
    }

    struct StubRoad {
        id: u64,
        roundabout: bool,
        heading_forward: f64,
        heading_backward: f64,
    }

    impl Road for StubRoad {
        fn id(&self) -> u64 {
            self.id
        }
        fn region(&self) -> RegionId {
            0
        }
        fn own_type_ids(&self) -> &[u32] {
            &[]
        }
        fn point_type_ids(&self, _point: usize) -> &[u32] {
            &[]
        }
        fn direction_route(&self, _index: usize, forward: bool) -> f64 {
            if forward {
                self.heading_forward
            } else {
                self.heading_backward
            }
        }
        fn roundabout(&self) -> bool {
            self.roundabout
        }
    }

    fn road(id: u64, roundabout: bool, heading: f64) -> StubRoad {
        StubRoad {
            id,
            roundabout,
            heading_forward: heading,
            heading_backward: heading,
        }
    }

    #[test]
    fn turn_cost_zero_with_no_config() {
        let router = Router::new();
        let decoder = NoTags;
        let params = ParameterContext::new();
        let curr = road(1, false, 0.0);
        let prev = road(2, false, PI);
        assert_eq!(
            router.calculate_turn_time(&curr, 0, 0, &prev, 0, 0, &decoder, &params),
            0.0
        );
    }

    #[test]
    fn roundabout_entry_uses_roundabout_turn_cost() {
        let mut router = Router::new();
        router.set_attribute("roundaboutTurn", "5");
        let decoder = NoTags;
        let params = ParameterContext::new();
        let curr = road(1, true, 0.0);
        let prev = road(2, false, 0.0);
        assert_eq!(
            router.calculate_turn_time(&curr, 0, 0, &prev, 0, 0, &decoder, &params),
            5.0
        );
        // Exiting a roundabout (reverse roles) doesn't trigger it.
        assert_eq!(
            router.calculate_turn_time(&prev, 0, 0, &curr, 0, 0, &decoder, &params),
            0.0
        );
    }

    #[test]
    fn turn_angle_buckets() {
        let mut router = Router::new();
        router.set_attribute("leftTurn", "10");
        router.set_attribute("rightTurn", "5");
        let decoder = NoTags;
        let params = ParameterContext::new();

        // U-turn: 170 degrees -> leftTurn bucket.
        let curr = road(1, false, 0.0);
        let prev = road(2, false, 170f64.to_radians());
        assert_eq!(
            router.calculate_turn_time(&curr, 1, 0, &prev, 0, 1, &decoder, &params),
            10.0
        );

        // 100 degree turn -> rightTurn bucket.
        let prev100 = road(2, false, 100f64.to_radians());
        assert_eq!(
            router.calculate_turn_time(&curr, 1, 0, &prev100, 0, 1, &decoder, &params),
            5.0
        );

        // 30 degree turn -> no cost.
        let prev30 = road(2, false, 30f64.to_radians());
        assert_eq!(
            router.calculate_turn_time(&curr, 1, 0, &prev30, 0, 1, &decoder, &params),
            0.0
        );
    }

    #[test]
    fn access_gate_scenario() {
        let mut router = Router::new();
        let no_id = router.dictionary().register("access", "no");
        let yes_id = router.dictionary().register("access", "yes");

        let mut r1 = Rule::new("-1", NumericType::Plain).unwrap();
        r1.require_type(no_id);
        let mut r2 = Rule::new("1", NumericType::Plain).unwrap();
        r2.require_type(yes_id);
        let mut ctx = AttributeContext::new(AttributeKind::Access);
        ctx.add_rule(r1).add_rule(r2);
        router.set_context(ctx);

        struct TaggedRoad {
            id: u64,
            tag: u32,
        }
        impl Road for TaggedRoad {
            fn id(&self) -> u64 {
                self.id
            }
            fn region(&self) -> RegionId {
                1
            }
            fn own_type_ids(&self) -> &[u32] {
                std::slice::from_ref(&self.tag)
            }
            fn point_type_ids(&self, _point: usize) -> &[u32] {
                &[]
            }
            fn direction_route(&self, _index: usize, _forward: bool) -> f64 {
                0.0
            }
            fn roundabout(&self) -> bool {
                false
            }
        }

        struct IdentityDecoder<'a>(&'a TagDictionary);
        impl RegionTagDecoder for IdentityDecoder<'_> {
            fn decode(&self, local_id: u32) -> Option<(String, String)> {
                self.0.value_of(local_id)
            }
        }

        let params = ParameterContext::new();
        let decoder = IdentityDecoder(router.dictionary());

        let yes_road = TaggedRoad { id: 10, tag: yes_id };
        assert!(router.accept_line(&yes_road, &decoder, &params));

        let no_road = TaggedRoad { id: 11, tag: no_id };
        assert!(!router.accept_line(&no_road, &decoder, &params));
    }
}
