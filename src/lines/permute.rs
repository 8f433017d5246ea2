//! Line ordering for turn-radius-limited platforms.
//!
//! A plane cannot turn onto the neighbouring line when the line spacing is
//! below twice its turn radius. Lines are therefore flown in a jump
//! pattern: consecutive flown lines are `k` lines apart, with
//! `k ≈ 2R / spacing` (the jump step).
//!
//! # Algorithm
//!
//! 1. Split the input into runs at gaps (spacing above `gap_factor` x the
//!    nominal spacing) and at scan-axis changes
//! 2. Order each run in blocks of `2k` lines:
//!    - one-handed (`None`/`Left`/`Right`): `k, 0, k+1, 1, ..`, so every
//!      turn goes to the same side
//!    - `Both`: blocks alternate between `0, k, 1, k+1, ..` and the
//!      one-handed order, which switches turn side per block and keeps
//!      block transitions short
//! 3. Alternate flying direction per flown line
//! 4. `Left`/`Right`: flip the whole run when its first turn goes the
//!    wrong way
//! 5. After a scan-axis change, pick the variant of the remaining sequence
//!    (as is, mirrored, reversed and mirrored, reversed) whose first start
//!    point is nearest to where the previous line ended

use std::ops::Range;

use log::debug;

use crate::config::PermuteSection;
use crate::core::LocalVector3;
use crate::platform::{PlatformDescription, PreferredTurn};

use super::flight_line::FlightLine;

/// Line ordering options
#[derive(Clone, Debug)]
pub struct PermuteOptions {
    /// Minimum turn radius (m)
    pub turn_radius: f64,
    /// Turn side policy
    pub preferred_turn: PreferredTurn,
    /// Keep every line in its original direction
    pub only_one_direction: bool,
    /// Spacing above this multiple of the nominal spacing starts a new run
    pub gap_factor: f64,
    /// Nominal line spacing; measured from the lines when `None`
    pub line_spacing: Option<f64>,
}

impl Default for PermuteOptions {
    fn default() -> Self {
        Self {
            turn_radius: 0.0,
            preferred_turn: PreferredTurn::None,
            only_one_direction: false,
            gap_factor: 1.1,
            line_spacing: None,
        }
    }
}

impl PermuteOptions {
    /// Options from the platform and the line ordering section
    pub fn from_config(platform: &PlatformDescription, section: &PermuteSection) -> Self {
        Self {
            turn_radius: platform.turn_radius,
            preferred_turn: platform.preferred_turn,
            only_one_direction: section.only_one_direction,
            gap_factor: section.gap_factor,
            line_spacing: Some(section.line_spacing),
        }
    }
}

/// Reorders and mirrors scan lines.
#[derive(Clone, Debug, Default)]
pub struct LinePermuter {
    options: PermuteOptions,
}

impl LinePermuter {
    /// Create with options
    pub fn new(options: PermuteOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub fn options(&self) -> &PermuteOptions {
        &self.options
    }

    /// Jump step for a line spacing.
    ///
    /// `None` rounds up so the turn always fits; the other policies round
    /// to the nearest step. Never below 1.
    pub fn jump_step(&self, spacing: f64) -> usize {
        let r = self.options.turn_radius;
        if spacing <= 0.0 || r <= 0.0 {
            return 1;
        }
        let ratio = 2.0 * r / spacing;
        let k = match self.options.preferred_turn {
            PreferredTurn::None => (ratio - 1e-9).ceil(),
            _ => ratio.round(),
        };
        (k.max(1.0)) as usize
    }

    /// Flight order of `lines` (input order = spatial order).
    pub fn permute(&self, lines: &[FlightLine]) -> Vec<FlightLine> {
        if lines.len() <= 1 {
            return lines.to_vec();
        }

        let spacing = self
            .options
            .line_spacing
            .filter(|s| *s > 0.0)
            .unwrap_or_else(|| nominal_spacing(lines));
        let k = self.jump_step(spacing);
        let runs = split_runs(lines, spacing, self.options.gap_factor);
        let turn = self.options.preferred_turn;

        let mut out: Vec<FlightLine> = Vec::with_capacity(lines.len());
        let mut next_forward = true;

        for (ri, run) in runs.iter().enumerate() {
            let order = run_order(run.len(), k, turn);
            let mut flown: Vec<FlightLine> = order.iter().map(|&i| lines[run.start + i].clone()).collect();

            if !self.options.only_one_direction {
                for line in flown.iter_mut() {
                    if line.is_forward != next_forward {
                        *line = line.mirrored();
                    }
                    next_forward = !next_forward;
                }

                let wanted = match turn {
                    PreferredTurn::Left => 1.0,
                    PreferredTurn::Right => -1.0,
                    _ => 0.0,
                };
                if wanted != 0.0 && flown.len() >= 2 && turn_side(&flown[0], &flown[1]) * wanted < 0.0 {
                    flown = flown.iter().map(FlightLine::mirrored).collect();
                    next_forward = !next_forward;
                }
            }

            debug!(
                "[Permute] run {} of {} lines, jump step {}: {:?}",
                ri,
                run.len(),
                k,
                flown.iter().map(|l| l.line_id).collect::<Vec<_>>()
            );
            out.extend(flown);
        }

        // re-orienting a tail moves later axis changes, so find them as we go
        for i in 1..out.len() {
            if out[i].is_rot90 != out[i - 1].is_rot90 {
                orient_remaining(&mut out, i);
            }
        }
        out
    }
}

/// Index order of a run of `n` lines for jump step `k`.
pub fn run_order(n: usize, k: usize, turn: PreferredTurn) -> Vec<usize> {
    if n <= 1 || k <= 1 {
        return (0..n).collect();
    }

    let mut order = Vec::with_capacity(n);
    let mut base = 0;
    let mut block = 0;
    while base < n {
        let r = (2 * k).min(n - base);
        let half = r / 2;
        // mirrored pairs turn to the other side with the same spacing
        let mirrored = turn == PreferredTurn::Both && block % 2 == 1;
        for j in 0..half {
            if mirrored {
                order.push(base + half - 1 - j);
                order.push(base + 2 * half - 1 - j);
            } else {
                order.push(base + half + j);
                order.push(base + j);
            }
        }
        if r % 2 == 1 {
            order.push(base + r - 1);
        }
        base += r;
        block += 1;
    }
    debug_assert_eq!(order.len(), n);
    order
}

/// Align turn-side endpoints and make room for the turn.
///
/// For each U-turn between consecutive flown lines, both turn-side
/// endpoints move to the outermost of the two along-track positions. When
/// the lines are closer than `2R`, both are pushed out by another `R` so
/// the turn can be flown outside the area. `R == 0` leaves lines alone.
pub fn assure_turn_radius(lines: &[FlightLine], turn_radius: f64) -> Vec<FlightLine> {
    let mut out = lines.to_vec();
    if turn_radius <= 0.0 {
        return out;
    }

    for i in 0..out.len().saturating_sub(1) {
        let (a, b) = (&out[i], &out[i + 1]);
        let d = a.direction();
        if a.is_rot90 != b.is_rot90 || d.dot(&b.direction()) > -0.5 {
            continue;
        }

        let a_end = a.end();
        let b_start = b.start();
        let ea = a_end.dot(&d);
        let sb = b_start.dot(&d);

        let offset = b_start - a_end;
        let lateral = (offset - d * offset.dot(&d)).horizontal_length();

        let mut target = ea.max(sb);
        if lateral < 2.0 * turn_radius {
            target += turn_radius;
        }

        let new_a = a.with_endpoints(a.start(), a_end + d * (target - ea));
        let new_b = b.with_endpoints(b_start + d * (target - sb), b.end());
        out[i] = new_a;
        out[i + 1] = new_b;
    }
    out
}

/// Smallest positive offset between neighbouring same-axis lines.
fn nominal_spacing(lines: &[FlightLine]) -> f64 {
    let s = lines
        .windows(2)
        .filter(|w| w[0].is_rot90 == w[1].is_rot90)
        .map(|w| (w[1].parallel_coordinate - w[0].parallel_coordinate).abs())
        .filter(|d| *d > 1e-9)
        .fold(f64::INFINITY, f64::min);
    if s.is_finite() { s } else { 0.0 }
}

fn split_runs(lines: &[FlightLine], spacing: f64, gap_factor: f64) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..lines.len() {
        let gap = (lines[i].parallel_coordinate - lines[i - 1].parallel_coordinate).abs();
        let axis_change = lines[i].is_rot90 != lines[i - 1].is_rot90;
        if axis_change || (spacing > 0.0 && gap > gap_factor * spacing) {
            runs.push(start..i);
            start = i;
        }
    }
    runs.push(start..lines.len());
    runs
}

/// Positive when turning from `a` onto `b` is a left turn.
fn turn_side(a: &FlightLine, b: &FlightLine) -> f64 {
    let d = a.direction();
    let o = b.start() - a.end();
    d.x * o.y - d.y * o.x
}

/// Re-orient `out[boundary..]` to start near the end of `out[boundary - 1]`.
fn orient_remaining(out: &mut [FlightLine], boundary: usize) {
    if boundary == 0 || boundary >= out.len() {
        return;
    }
    let prev_end = out[boundary - 1].end();
    let tail = &out[boundary..];
    let (first, last) = (&tail[0], &tail[tail.len() - 1]);

    let candidates: [LocalVector3; 4] = [first.start(), first.end(), last.end(), last.start()];
    let best = candidates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.horizontal_distance(&prev_end)
                .total_cmp(&b.horizontal_distance(&prev_end))
        })
        .map(|(i, _)| i)
        .unwrap_or(0);

    let tail = &mut out[boundary..];
    match best {
        1 => {
            for line in tail.iter_mut() {
                *line = line.mirrored();
            }
        }
        2 => {
            tail.reverse();
            for line in tail.iter_mut() {
                *line = line.mirrored();
            }
        }
        3 => tail.reverse(),
        _ => {}
    }
    debug!("[Permute] axis change at {}: variant {}", boundary, best);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parallel_lines(xs: &[f64]) -> Vec<FlightLine> {
        xs.iter()
            .enumerate()
            .map(|(i, &x)| {
                FlightLine::new(
                    i as u32,
                    vec![LocalVector3::new(x, 0.0, 0.0), LocalVector3::new(x, 50.0, 0.0)],
                    x,
                    false,
                )
                .unwrap()
            })
            .collect()
    }

    fn permuter(turn_radius: f64, preferred_turn: PreferredTurn) -> LinePermuter {
        LinePermuter::new(PermuteOptions {
            turn_radius,
            preferred_turn,
            ..PermuteOptions::default()
        })
    }

    fn ids(lines: &[FlightLine]) -> Vec<u32> {
        lines.iter().map(|l| l.line_id).collect()
    }

    #[test]
    fn test_jump_step_rounding() {
        assert_eq!(permuter(0.0, PreferredTurn::None).jump_step(20.0), 1);
        assert_eq!(permuter(10.0, PreferredTurn::None).jump_step(20.0), 1);
        assert_eq!(permuter(11.0, PreferredTurn::None).jump_step(20.0), 2);
        assert_eq!(permuter(11.0, PreferredTurn::Left).jump_step(20.0), 1);
        assert_eq!(permuter(16.0, PreferredTurn::Left).jump_step(20.0), 2);
    }

    #[test]
    fn test_jump_step_one_is_pure_alternation() {
        let lines = parallel_lines(&[10.0, 30.0, 50.0, 70.0, 90.0]);
        let out = permuter(10.0, PreferredTurn::None).permute(&lines);
        assert_eq!(ids(&out), vec![0, 1, 2, 3, 4]);
        let dirs: Vec<bool> = out.iter().map(|l| l.is_forward).collect();
        assert_eq!(dirs, vec![true, false, true, false, true]);
    }

    #[test]
    fn test_single_circuit() {
        assert_eq!(run_order(6, 3, PreferredTurn::None), vec![3, 0, 4, 1, 5, 2]);
        // jump step beyond half the run
        assert_eq!(run_order(6, 5, PreferredTurn::None), vec![3, 0, 4, 1, 5, 2]);
        assert_eq!(run_order(5, 4, PreferredTurn::None), vec![2, 0, 3, 1, 4]);
    }

    #[test]
    fn test_blocks() {
        assert_eq!(
            run_order(8, 2, PreferredTurn::None),
            vec![2, 0, 3, 1, 6, 4, 7, 5]
        );
        assert_eq!(
            run_order(8, 2, PreferredTurn::Both),
            vec![2, 0, 3, 1, 5, 7, 4, 6]
        );
        assert_eq!(run_order(5, 3, PreferredTurn::Both), vec![2, 0, 3, 1, 4]);
        assert_eq!(
            run_order(11, 2, PreferredTurn::Both),
            vec![2, 0, 3, 1, 5, 7, 4, 6, 9, 8, 10]
        );
        assert_eq!(run_order(1, 3, PreferredTurn::None), vec![0]);
    }

    #[test]
    fn test_both_keeps_jump_step_inside_blocks() {
        // R = 20, s = 20: k = 2
        let xs: Vec<f64> = (0..8).map(|i| i as f64 * 20.0).collect();
        let out = permuter(20.0, PreferredTurn::Both).permute(&parallel_lines(&xs));
        let jumps: Vec<f64> = out
            .windows(2)
            .map(|w| (w[1].parallel_coordinate - w[0].parallel_coordinate).abs())
            .collect();
        assert!(jumps.iter().all(|j| *j >= 40.0 - 1e-9), "{jumps:?}");

        // second block turns the other way
        let first = turn_side(&out[0], &out[1]);
        let second = turn_side(&out[4], &out[5]);
        assert!(first * second < 0.0);
    }

    #[test]
    fn test_one_handed_turns() {
        let xs: Vec<f64> = (0..8).map(|i| i as f64 * 20.0).collect();
        let lines = parallel_lines(&xs);
        for (turn, sign) in [(PreferredTurn::Left, 1.0), (PreferredTurn::Right, -1.0)] {
            // k = 4: a single block
            let out = permuter(40.0, turn).permute(&lines);
            assert_eq!(ids(&out), vec![4, 0, 5, 1, 6, 2, 7, 3]);
            for w in out.windows(2) {
                assert!(turn_side(&w[0], &w[1]) * sign > 0.0, "{turn:?}");
            }
        }
    }

    #[test]
    fn test_left_flips_run() {
        let lines = parallel_lines(&[10.0, 30.0, 50.0]);
        let left = permuter(10.0, PreferredTurn::Left).permute(&lines);
        let right = permuter(10.0, PreferredTurn::Right).permute(&lines);
        assert!(!left[0].is_forward);
        assert!(right[0].is_forward);
        assert!(turn_side(&left[0], &left[1]) > 0.0);
        assert!(turn_side(&right[0], &right[1]) < 0.0);
    }

    #[test]
    fn test_only_one_direction() {
        let lines = parallel_lines(&[10.0, 30.0, 50.0]);
        let out = LinePermuter::new(PermuteOptions {
            only_one_direction: true,
            ..PermuteOptions::default()
        })
        .permute(&lines);
        assert!(out.iter().all(|l| l.is_forward));
    }

    #[test]
    fn test_gap_restarts_pattern() {
        // two groups of three lines with a 100 m gap
        let lines = parallel_lines(&[0.0, 20.0, 40.0, 140.0, 160.0, 180.0]);
        let out = permuter(15.0, PreferredTurn::None).permute(&lines);
        // k = 2: each run of 3 is a partial block
        assert_eq!(ids(&out), vec![1, 0, 2, 4, 3, 5]);
        // direction parity carries across the gap
        let dirs: Vec<bool> = out.iter().map(|l| l.is_forward).collect();
        assert_eq!(dirs, vec![true, false, true, false, true, false]);
    }

    #[test]
    fn test_axis_change_picks_nearest_variant() {
        let mut lines = parallel_lines(&[10.0, 30.0, 50.0]);
        for (i, y) in [(3u32, 90.0), (4, 70.0)] {
            lines.push(
                FlightLine::new(
                    i,
                    vec![LocalVector3::new(0.0, y, 0.0), LocalVector3::new(60.0, y, 0.0)],
                    y,
                    true,
                )
                .unwrap(),
            );
        }
        let out = permuter(0.0, PreferredTurn::None).permute(&lines);
        assert_eq!(ids(&out), vec![0, 1, 2, 4, 3]);
        assert_eq!(out[3].start(), LocalVector3::new(60.0, 70.0, 0.0));
    }

    #[test]
    fn test_reversed_tail_keeps_later_axis_change() {
        // vertical pair, far horizontal triple, vertical pair next to the first
        let mut lines = parallel_lines(&[10.0, 30.0]);
        for (i, y) in [(2u32, 500.0), (3, 520.0), (4, 540.0)] {
            lines.push(
                FlightLine::new(
                    i,
                    vec![LocalVector3::new(0.0, y, 0.0), LocalVector3::new(60.0, y, 0.0)],
                    y,
                    true,
                )
                .unwrap(),
            );
        }
        for (i, x) in [(5u32, 50.0), (6, 70.0)] {
            lines.push(
                FlightLine::new(
                    i,
                    vec![LocalVector3::new(x, 0.0, 0.0), LocalVector3::new(x, 50.0, 0.0)],
                    x,
                    false,
                )
                .unwrap(),
            );
        }

        let out = permuter(0.0, PreferredTurn::None).permute(&lines);
        assert_eq!(ids(&out), vec![0, 1, 6, 5, 2, 3, 4]);
        // the horizontal lines start at the end nearest to the last vertical one
        assert_eq!(out[4].start(), LocalVector3::new(60.0, 500.0, 0.0));

        for i in 1..out.len() {
            if out[i].is_rot90 == out[i - 1].is_rot90 {
                continue;
            }
            let prev_end = out[i - 1].end();
            let tail_last = &out[out.len() - 1];
            let taken = out[i].start().horizontal_distance(&prev_end);
            for other in [out[i].end(), tail_last.start(), tail_last.end()] {
                assert!(taken <= other.horizontal_distance(&prev_end) + 1e-9);
            }
        }
    }

    #[test]
    fn test_assure_turn_radius() {
        let a = FlightLine::new(
            0,
            vec![LocalVector3::new(10.0, 0.0, 0.0), LocalVector3::new(10.0, 50.0, 0.0)],
            10.0,
            false,
        )
        .unwrap();
        let b = FlightLine::new(
            1,
            vec![LocalVector3::new(30.0, 45.0, 0.0), LocalVector3::new(30.0, 0.0, 0.0)],
            30.0,
            false,
        )
        .unwrap();

        let tight = assure_turn_radius(&[a.clone(), b.clone()], 15.0);
        assert!((tight[0].end().y - 65.0).abs() < 1e-9);
        assert!((tight[1].start().y - 65.0).abs() < 1e-9);
        assert_eq!(tight[0].start(), a.start());

        let wide = assure_turn_radius(&[a.clone(), b.clone()], 5.0);
        assert!((wide[0].end().y - 50.0).abs() < 1e-9);
        assert!((wide[1].start().y - 50.0).abs() < 1e-9);

        let hover = assure_turn_radius(&[a.clone(), b.clone()], 0.0);
        assert_eq!(hover[1].start(), b.start());
    }
}
