//! Slice boundary arithmetic.
//!
//! Slices are half-open windows `[start, end)` of a fixed width, aligned to
//! the process start time. Moving to the slice containing a later timestamp
//! is a single division, so long gaps in a log never cost an iteration per
//! empty slice.

use chrono::{Duration, NaiveDateTime};

/// Computes the slice containing `line_time`.
///
/// Returns `(new_start, new_end, slices_advanced)`:
/// - inside `[cur_start, cur_end)`: unchanged, 0 advanced;
/// - inside `[cur_end, cur_end + duration)`: the next slice, 1 advanced;
/// - later: jumps straight to slice `floor((line_time - cur_start) / duration)`.
///
/// Times before `cur_start` yield `None`; slices never move backwards.
/// `duration` must be positive.
pub fn next_slice(
    cur_start: NaiveDateTime,
    cur_end: NaiveDateTime,
    duration: Duration,
    line_time: NaiveDateTime,
) -> Option<(NaiveDateTime, NaiveDateTime, u64)> {
    if line_time < cur_start {
        return None;
    }
    if line_time < cur_end {
        return Some((cur_start, cur_end, 0));
    }
    if line_time < cur_end + duration {
        return Some((cur_end, cur_end + duration, 1));
    }
    let width = duration.num_seconds();
    if width <= 0 {
        return None;
    }
    let jump = (line_time - cur_start).num_seconds() / width;
    let start = cur_start + Duration::seconds(width * jump);
    Some((start, start + duration, jump as u64))
}

/// The active slice plus its sampling generation.
///
/// The generation is the slice's ordinal since the process start, reduced
/// modulo the throttle, so whether a slice is kept depends only on its
/// position and not on how the scan got there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    start: NaiveDateTime,
    end: NaiveDateTime,
    generation: u64,
    throttle: u64,
    duration_secs: i64,
    limit: NaiveDateTime,
}

impl Slice {
    /// First slice of a process window `[origin, limit)`. The end is clamped
    /// to `limit`.
    pub fn first(origin: NaiveDateTime, duration: Duration, limit: NaiveDateTime, throttle: usize) -> Self {
        Self {
            start: origin,
            end: (origin + duration).min(limit),
            generation: 0,
            throttle: throttle.max(1) as u64,
            duration_secs: duration.num_seconds(),
            limit,
        }
    }

    /// Slice start.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Slice end (exclusive).
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Generation modulo the throttle.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this slice is sampled.
    pub fn is_kept(&self) -> bool {
        self.generation == 0
    }

    /// Moves to the slice containing `tm`. Returns the number of slices
    /// advanced; 0 when `tm` is inside or before the current slice.
    pub fn advance_to(&mut self, tm: NaiveDateTime) -> u64 {
        let duration = Duration::seconds(self.duration_secs);
        // Arithmetic runs on the unclamped end so boundaries stay aligned.
        let unclamped_end = self.start + duration;
        match next_slice(self.start, unclamped_end, duration, tm) {
            Some((start, end, advanced)) if advanced > 0 => {
                self.start = start;
                self.end = end.min(self.limit);
                self.generation = (self.generation + advanced % self.throttle) % self.throttle;
                advanced
            }
            _ => 0,
        }
    }

    /// Moves exactly one slice forward.
    pub fn step(&mut self) {
        let duration = Duration::seconds(self.duration_secs);
        self.start += duration;
        self.end = (self.start + duration).min(self.limit);
        self.generation = (self.generation + 1) % self.throttle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::parse_timestamp_key;
    use proptest::prelude::*;

    fn tm(s: &str) -> NaiveDateTime {
        parse_timestamp_key(s).unwrap()
    }

    #[test]
    fn test_inside_slice_is_unchanged() {
        let start = tm("Jan 05 2024 13:00:00");
        let end = start + Duration::seconds(10);
        assert_eq!(
            next_slice(start, end, Duration::seconds(10), start + Duration::seconds(9)),
            Some((start, end, 0))
        );
    }

    #[test]
    fn test_next_slice_advances_one() {
        let start = tm("Jan 05 2024 13:00:00");
        let end = start + Duration::seconds(10);
        let (s, e, n) = next_slice(start, end, Duration::seconds(10), end).unwrap();
        assert_eq!((s, e, n), (end, end + Duration::seconds(10), 1));
    }

    #[test]
    fn test_gap_jumps_directly() {
        let start = tm("Jan 05 2024 13:00:00");
        let end = start + Duration::seconds(10);
        let line = start + Duration::seconds(47);
        let (s, e, n) = next_slice(start, end, Duration::seconds(10), line).unwrap();
        assert_eq!(n, 4);
        assert_eq!(s, start + Duration::seconds(40));
        assert_eq!(e, start + Duration::seconds(50));
    }

    #[test]
    fn test_multi_day_gap() {
        let start = tm("Jan 05 2024 13:00:00");
        let end = start + Duration::seconds(60);
        let line = tm("Jan 07 2024 13:00:30");
        let (s, _, n) = next_slice(start, end, Duration::seconds(60), line).unwrap();
        assert_eq!(n, 2 * 24 * 60);
        assert_eq!(s, tm("Jan 07 2024 13:00:00"));
    }

    #[test]
    fn test_earlier_time_is_rejected() {
        let start = tm("Jan 05 2024 13:00:00");
        let end = start + Duration::seconds(10);
        assert!(next_slice(start, end, Duration::seconds(10), start - Duration::seconds(1)).is_none());
    }

    #[test]
    fn test_slice_generation_cycles_with_throttle() {
        let origin = tm("Jan 05 2024 13:00:00");
        let limit = origin + Duration::seconds(1000);
        let mut slice = Slice::first(origin, Duration::seconds(10), limit, 3);
        let mut gens = vec![slice.generation()];
        for _ in 0..6 {
            slice.step();
            gens.push(slice.generation());
        }
        assert_eq!(gens, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_slice_end_is_clamped() {
        let origin = tm("Jan 05 2024 13:00:00");
        let limit = origin + Duration::seconds(25);
        let mut slice = Slice::first(origin, Duration::seconds(10), limit, 1);
        slice.advance_to(origin + Duration::seconds(21));
        assert_eq!(slice.start(), origin + Duration::seconds(20));
        assert_eq!(slice.end(), limit);
    }

    proptest! {
        #[test]
        fn prop_next_slice_is_idempotent(offset in 0i64..200_000, width in 1i64..5_000, gap in 0i64..100_000) {
            let origin = tm("Jan 05 2024 00:00:00");
            let duration = Duration::seconds(width);
            let start = origin + Duration::seconds(width * (offset % 50));
            let line = start + Duration::seconds(gap);
            let (s1, e1, _) = next_slice(start, start + duration, duration, line).unwrap();
            let (s2, e2, n2) = next_slice(s1, e1, duration, line).unwrap();
            prop_assert_eq!((s1, e1), (s2, e2));
            prop_assert_eq!(n2, 0);
            prop_assert!(s1 <= line && line < e1);
            prop_assert_eq!((s1 - start).num_seconds() % width, 0);
        }

        #[test]
        fn prop_generation_independent_of_path(steps in proptest::collection::vec(1i64..40, 1..30), throttle in 1usize..6) {
            let origin = tm("Jan 05 2024 00:00:00");
            let duration = Duration::seconds(10);
            let limit = origin + Duration::days(30);
            let mut jumping = Slice::first(origin, duration, limit, throttle);
            let mut stepping = Slice::first(origin, duration, limit, throttle);
            let mut t = origin;
            for step in steps {
                t += Duration::seconds(step);
                let advanced = jumping.advance_to(t);
                for _ in 0..advanced {
                    stepping.step();
                }
                prop_assert_eq!(jumping.start(), stepping.start());
                prop_assert_eq!(jumping.generation(), stepping.generation());
            }
            let ordinal = ((jumping.start() - origin).num_seconds() / 10) as u64;
            prop_assert_eq!(jumping.generation(), ordinal % throttle as u64);
        }
    }
}
