// crates/visoai-core/src/trim.rs
//
// Trim-range model for one track.
//
// Invariants held after every update:
//   0 <= start < end <= total
//   end - start >= min_span          (min_span is capped at total)
//   end - start <= max_span          (captured at load, re-anchored on reload)
//
// Proposals come from a two-thumb range control, so at most one thumb is
// "really" being dragged. We infer which one from the distance each endpoint
// moved and adjust the other one when a constraint bites.

use serde::{Deserialize, Serialize};

use crate::error::TimelineConstraintViolation;

/// Smallest selectable interval, in seconds.
pub const DEFAULT_MIN_SPAN: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Thumb {
    Start,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrimUpdate {
    Applied { start: f64, end: f64, active: Thumb },
    /// The proposal resolved to the pair already stored.
    Unchanged,
    /// Malformed input; the previous pair is retained.
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrimRange {
    total:    f64,
    start:    f64,
    end:      f64,
    max_span: f64,
    min_span: f64,
}

impl TrimRange {
    /// Full-duration selection. The span ceiling is the full duration.
    pub fn new(total: f64) -> Self {
        Self::with_max_span(total, total)
    }

    /// Full selection with an explicit span ceiling. The initial selection is
    /// `(0, max_span)` so the invariants hold from the start.
    pub fn with_max_span(total: f64, max_span: f64) -> Self {
        let total    = if total.is_finite() { total.max(0.0) } else { 0.0 };
        let min_span = DEFAULT_MIN_SPAN.min(total);
        let max_span = if max_span.is_finite() { max_span.clamp(min_span, total) } else { total };
        Self { total, start: 0.0, end: max_span, max_span, min_span }
    }

    pub fn with_min_span(mut self, min_span: f64) -> Self {
        if min_span.is_finite() && min_span > 0.0 {
            self.min_span = min_span.min(self.max_span);
        }
        self
    }

    pub fn start(&self)    -> f64 { self.start }
    pub fn end(&self)      -> f64 { self.end }
    pub fn total(&self)    -> f64 { self.total }
    pub fn span(&self)     -> f64 { self.end - self.start }
    pub fn max_span(&self) -> f64 { self.max_span }
    pub fn min_span(&self) -> f64 { self.min_span }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Apply a proposed `(start, end)` pair from a thumb drag.
    pub fn propose(&mut self, new_start: f64, new_end: f64) -> TrimUpdate {
        if !new_start.is_finite() || !new_end.is_finite() {
            log::debug!("[trim] {}; keeping {:.3}..{:.3}",
                TimelineConstraintViolation::NonFinite, self.start, self.end);
            return TrimUpdate::Rejected;
        }

        let mut start = new_start.clamp(0.0, self.total);
        let mut end   = new_end.clamp(0.0, self.total);
        let active    = active_thumb(self.start, self.end, start, end);

        // Never store an inverted or zero-width interval: the dragged thumb
        // stops `min_span` short of the other one.
        if end - start < self.min_span {
            log::trace!("[trim] {}", TimelineConstraintViolation::Inverted);
            match active {
                Thumb::Start => {
                    start = end - self.min_span;
                    if start < 0.0 {
                        start = 0.0;
                        end   = self.min_span;
                    }
                }
                Thumb::End => {
                    end = start + self.min_span;
                    if end > self.total {
                        end   = self.total;
                        start = self.total - self.min_span;
                    }
                }
            }
        }

        // Span ceiling: the thumb that was NOT dragged follows the dragged one.
        let span = end - start;
        if span > self.max_span {
            log::trace!("[trim] {}", TimelineConstraintViolation::SpanCeiling {
                span, ceiling: self.max_span,
            });
            match active {
                Thumb::End   => start = end - self.max_span,
                Thumb::Start => end   = start + self.max_span,
            }
        }

        if start == self.start && end == self.end {
            return TrimUpdate::Unchanged;
        }
        self.start = start;
        self.end   = end;
        TrimUpdate::Applied { start, end, active }
    }
}

/// The endpoint that moved further is the one being dragged.
/// On a tie the start is preserved, i.e. treated as the dragged side so the
/// end is the one that gets adjusted.
pub fn active_thumb(prev_start: f64, prev_end: f64, start: f64, end: f64) -> Thumb {
    let moved_start = (start - prev_start).abs();
    let moved_end   = (end - prev_end).abs();
    if moved_end > moved_start { Thumb::End } else { Thumb::Start }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(r: &TrimRange) {
        assert!(r.start() >= 0.0, "start {} < 0", r.start());
        assert!(r.start() < r.end(), "start {} >= end {}", r.start(), r.end());
        assert!(r.end() <= r.total(), "end {} > total {}", r.end(), r.total());
        assert!(r.span() <= r.max_span() + 1e-9, "span {} > ceiling {}", r.span(), r.max_span());
    }

    #[test]
    fn new_selects_full_duration() {
        let r = TrimRange::new(12.5);
        assert_eq!((r.start(), r.end()), (0.0, 12.5));
        assert_eq!(r.max_span(), 12.5);
    }

    #[test]
    fn clamp_invariant_holds_for_wild_proposals() {
        let proposals = [
            (-5.0, 3.0), (2.0, 40.0), (8.0, 2.0), (19.99, 20.0), (0.0, 0.0),
            (20.0, 20.0), (-1.0, -0.5), (25.0, 30.0), (4.0, 4.0), (10.0, 9.95),
        ];
        let mut r = TrimRange::with_max_span(20.0, 10.0);
        for (s, e) in proposals {
            r.propose(s, e);
            assert_invariants(&r);
        }
    }

    #[test]
    fn end_drag_past_ceiling_pulls_start_along() {
        let mut r = TrimRange::with_max_span(20.0, 10.0);
        assert_eq!((r.start(), r.end()), (0.0, 10.0));
        let upd = r.propose(0.0, 15.0);
        assert_eq!(upd, TrimUpdate::Applied { start: 5.0, end: 15.0, active: Thumb::End });
        assert!(r.span() <= 10.0);
    }

    #[test]
    fn start_drag_past_ceiling_pulls_end_back() {
        let mut r = TrimRange::with_max_span(20.0, 10.0);
        r.propose(10.0, 20.0);
        assert_eq!((r.start(), r.end()), (10.0, 20.0));

        let upd = r.propose(5.0, 20.0);
        assert_eq!(upd, TrimUpdate::Applied { start: 5.0, end: 15.0, active: Thumb::Start });
    }

    #[test]
    fn non_finite_is_rejected_and_previous_pair_kept() {
        let mut r = TrimRange::new(10.0);
        r.propose(2.0, 8.0);
        assert_eq!(r.propose(f64::NAN, 5.0), TrimUpdate::Rejected);
        assert_eq!(r.propose(1.0, f64::INFINITY), TrimUpdate::Rejected);
        assert_eq!((r.start(), r.end()), (2.0, 8.0));
    }

    #[test]
    fn dragging_start_over_end_stops_short() {
        let mut r = TrimRange::new(10.0);
        r.propose(2.0, 6.0);
        r.propose(9.0, 6.0);
        assert_eq!(r.end(), 6.0);
        assert!((r.start() - (6.0 - DEFAULT_MIN_SPAN)).abs() < 1e-9);
    }

    #[test]
    fn dragging_end_below_start_stops_short() {
        let mut r = TrimRange::new(10.0);
        r.propose(4.0, 8.0);
        r.propose(4.0, 1.0);
        assert_eq!(r.start(), 4.0);
        assert!((r.end() - (4.0 + DEFAULT_MIN_SPAN)).abs() < 1e-9);
    }

    #[test]
    fn equal_moves_preserve_start() {
        let mut r = TrimRange::with_max_span(20.0, 10.0);
        r.propose(5.0, 15.0);
        // Both thumbs moved 3s outward; the span would be 16s.
        let upd = r.propose(2.0, 18.0);
        assert_eq!(upd, TrimUpdate::Applied { start: 2.0, end: 12.0, active: Thumb::Start });
    }

    #[test]
    fn identical_proposal_is_unchanged() {
        let mut r = TrimRange::new(10.0);
        r.propose(1.0, 4.0);
        assert_eq!(r.propose(1.0, 4.0), TrimUpdate::Unchanged);
    }

    #[test]
    fn tiny_track_caps_min_span() {
        let mut r = TrimRange::new(0.05);
        r.propose(0.05, 0.0);
        assert_invariants(&r);
        assert_eq!(r.span(), 0.05);
    }
}
