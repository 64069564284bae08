//! On-path symbol placement across zoom levels.
//!
//! Grounded on `BinaryMapStaticSymbolsProvider_P::computePinPoints`/
//! `computePinPoint` in the original. A *block* is one full run of all
//! symbols concatenated; blocks tile a path's usable length (path length
//! minus left/right padding) contiguously. As zoom increases, the path's
//! pixel length doubles (the same geography now spans twice as many
//! screen pixels) while each symbol's own pixel footprint stays fixed, so
//! new gaps open up between existing block instances and get filled with
//! additional ones — never displacing what's already there.
//!
//! Every pin point placed at zoom Z is reproduced bit-for-bit in every
//! zoom level > Z: rather than track "new vs. already-placed" instances
//! across calls (as the original's incremental scan-state does for
//! performance), this implementation recomputes the *entire* contiguous
//! tiling fresh at each level from the same deterministic per-level
//! offset/count, which is mathematically guaranteed to reproduce prior
//! levels' positions exactly (same floating-point inputs, same formula).
//! See DESIGN.md for why this is equivalent to, and simpler than,
//! reusing the original's carried scan state.

use crate::error::Error;
use crate::path::PathPoint;
use crate::symbol::SymbolDesc;

/// One anchor point for a symbol instance on a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComputedPinPoint {
    pub point: PathPoint,
    /// Index of the path segment this offset is measured from.
    pub base_path_point_index: u32,
    /// Offset from that segment's start, in 31-bit projection units.
    pub offset_from_base_path_point_31: f64,
    /// The same offset, normalized to the segment's own length, in `[0, 1)`.
    pub normalized_offset_from_base_path_point: f32,
}

struct PathGeometry {
    points: Vec<PathPoint>,
    seg31: Vec<f64>,
    seg_px: Vec<f64>,
}

impl PathGeometry {
    fn new(path31: &[PathPoint], scale0: f64) -> Self {
        let seg31: Vec<f64> = path31.windows(2).map(|w| w[0].distance_31(w[1])).collect();
        let seg_px = seg31.iter().map(|s| s * scale0).collect();
        Self {
            points: path31.to_vec(),
            seg31,
            seg_px,
        }
    }

    fn total_px(&self) -> f64 {
        self.seg_px.iter().sum()
    }

    fn double(&mut self) {
        for s in &mut self.seg_px {
            *s *= 2.0;
        }
    }

    /// Locates the segment containing the point `target_from_base` pixels
    /// past the start of segment `start_index`, returning `(segment index,
    /// cumulative pixels before that segment, relative to `start_index`)`.
    fn locate(&self, start_index: usize, target_from_base: f64) -> Option<(usize, f64)> {
        let mut idx = start_index;
        let mut cumulative = 0.0;
        loop {
            let len = *self.seg_px.get(idx)?;
            if cumulative + len > target_from_base {
                return Some((idx, cumulative));
            }
            cumulative += len;
            idx += 1;
        }
    }
}

/// Computes one symbol's pin point.
///
/// `target_offset_px` is the symbol's left edge, measured from the usable
/// region's start (the left-padding edge); `base_path_point_index` and
/// `padding_from_base_px` locate that edge on the path (see
/// [`compute_pin_points`]'s setup). Returns `None` if the symbol's trailing
/// edge would fall beyond the path's usable length.
#[allow(clippy::cast_possible_truncation)]
fn compute_pin_point(
    geometry: &PathGeometry,
    base_path_point_index: usize,
    padding_from_base_px: f64,
    usable_length_px: f64,
    target_offset_px: f64,
    symbol: &SymbolDesc,
) -> Option<ComputedPinPoint> {
    let end_offset = target_offset_px + f64::from(symbol.full_size_px());
    if end_offset > usable_length_px {
        tracing::debug!(end_offset, usable_length_px, "symbol trailing edge past path end");
        return None;
    }

    let center_from_base =
        padding_from_base_px + target_offset_px + f64::from(symbol.left_padding_px) + f64::from(symbol.width_px) / 2.0;
    let (seg_idx, cumulative_before) = geometry.locate(base_path_point_index, center_from_base)?;

    let seg_len_px = geometry.seg_px[seg_idx];
    let frac = if seg_len_px > 0.0 {
        ((center_from_base - cumulative_before) / seg_len_px).clamp(0.0, f64::from(f32::MAX))
    } else {
        0.0
    };

    let point = geometry.points[seg_idx].lerp(geometry.points[seg_idx + 1], frac);

    Some(ComputedPinPoint {
        point,
        base_path_point_index: seg_idx as u32,
        offset_from_base_path_point_31: geometry.seg31[seg_idx] * frac,
        normalized_offset_from_base_path_point: frac as f32,
    })
}

/// Computes, for each zoom level from `min_zoom` to `max_zoom` inclusive,
/// the full set of pin points at which `symbols` should be anchored on
/// `path31`.
///
/// `global_left_padding_px`/`global_right_padding_px` keep symbols away from
/// the path's endpoints. `reference_tile_size_px` is the owner's tile size
/// in pixels, used to convert 31-bit projection lengths into pixels at
/// `min_zoom` (see spec §4.4's "Setup").
///
/// # Errors
///
/// Returns [`Error::PathTooShort`] if `path31` has fewer than two points,
/// [`Error::EmptySymbolBlock`] if `symbols` is empty, or
/// [`Error::InvalidZoomRange`] if `min_zoom > max_zoom`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compute_pin_points(
    path31: &[PathPoint],
    global_left_padding_px: f32,
    global_right_padding_px: f32,
    symbols: &[SymbolDesc],
    min_zoom: u8,
    max_zoom: u8,
    reference_tile_size_px: f64,
) -> Result<Vec<Vec<ComputedPinPoint>>, Error> {
    if path31.len() < 2 {
        return Err(Error::PathTooShort);
    }
    if symbols.is_empty() {
        return Err(Error::EmptySymbolBlock);
    }
    if min_zoom > max_zoom {
        return Err(Error::InvalidZoomRange { min_zoom, max_zoom });
    }

    let zoom_count = (max_zoom - min_zoom) as usize + 1;
    let empty_result = || vec![Vec::new(); zoom_count];

    let tile_size_31 = 1u64 << (31 - min_zoom);
    let scale0 = reference_tile_size_px / tile_size_31 as f64;

    let mut geometry = PathGeometry::new(path31, scale0);
    let total_px = geometry.total_px();

    let left_padding_px = f64::from(global_left_padding_px);
    let right_padding_px = f64::from(global_right_padding_px);
    let usable_length_px0 = total_px - left_padding_px - right_padding_px;
    if usable_length_px0 <= 0.0 {
        return Ok(empty_result());
    }

    // Find the base path point: the first segment whose cumulative length
    // (from the path start) exceeds the left padding, plus how far into
    // that segment the padding edge falls.
    let mut base_path_point_index = 0usize;
    let mut padding_from_base_px = left_padding_px;
    let mut cumulative = 0.0;
    for (i, &len) in geometry.seg_px.iter().enumerate() {
        if cumulative + len > left_padding_px {
            base_path_point_index = i;
            padding_from_base_px = left_padding_px - cumulative;
            break;
        }
        cumulative += len;
    }

    let block_width: f64 = symbols.iter().map(|s| f64::from(s.full_size_px())).sum();
    if block_width <= 0.0 {
        return Ok(empty_result());
    }

    let mut result = Vec::with_capacity(zoom_count);
    let mut l = usable_length_px0;
    let mut n: u64 = 0;
    let mut r = 0.0f64;
    let mut k: Option<f64> = None;

    for _zoom in min_zoom..=max_zoom {
        let (new_blocks, tiling_offset_px, partial_fit): (u64, f64, Option<usize>);

        if n == 0 {
            let f = l / block_width;
            let floor_f = f.floor();
            if floor_f >= 1.0 {
                new_blocks = floor_f as u64;
                tiling_offset_px = (f - floor_f) / 2.0 * block_width;
                partial_fit = None;
            } else {
                let mut fit_size = 0.0;
                let mut fit_count = 0usize;
                for s in symbols {
                    let sz = f64::from(s.full_size_px());
                    if fit_size + sz > l {
                        break;
                    }
                    fit_size += sz;
                    fit_count += 1;
                }
                new_blocks = 0;
                tiling_offset_px = ((l - fit_size) / block_width) / 2.0 * block_width;
                partial_fit = Some(fit_count);
            }
        } else {
            let k_val = k.unwrap_or(0.0);
            let k_raw = 0.5 + 2.0 * k_val;
            let k_wrapped = if k_raw > 1.0 { k_raw - 1.0 } else { k_raw };
            let additional = (n as i64 - 1) + 2 * (r / block_width).floor() as i64;
            new_blocks = additional.max(0) as u64;
            tiling_offset_px = k_wrapped * block_width;
            partial_fit = None;
        }

        let total_blocks = n + new_blocks;
        let mut level_points = Vec::new();

        if total_blocks > 0 {
            'blocks: for block_idx in 0..total_blocks {
                let block_start = tiling_offset_px + block_idx as f64 * block_width;
                let mut cursor = block_start;
                for symbol in symbols {
                    match compute_pin_point(
                        &geometry,
                        base_path_point_index,
                        padding_from_base_px,
                        l,
                        cursor,
                        symbol,
                    ) {
                        Some(p) => level_points.push(p),
                        None => {
                            tracing::debug!(block_idx, "block does not fit; stopping this block");
                            break 'blocks;
                        }
                    }
                    cursor += f64::from(symbol.full_size_px());
                }
            }
        } else if let Some(count) = partial_fit {
            let mut cursor = tiling_offset_px;
            for symbol in &symbols[..count] {
                if let Some(p) = compute_pin_point(
                    &geometry,
                    base_path_point_index,
                    padding_from_base_px,
                    l,
                    cursor,
                    symbol,
                ) {
                    level_points.push(p);
                }
                cursor += f64::from(symbol.full_size_px());
            }
        }

        result.push(level_points);

        let new_r = l - (total_blocks as f64) * block_width;
        if new_blocks > 0 || n > 0 {
            k = Some(tiling_offset_px / block_width);
        }
        n = total_blocks;
        r = new_r.max(0.0);
        l *= 2.0;
        geometry.double();
        padding_from_base_px *= 2.0;
    }

    Ok(result)
}
