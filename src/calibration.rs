//! Per-axis calibration estimator (§4.D). Accumulates `(angle_deg,
//! cumulative_steps)` samples taken while the user sights known bodies, and
//! on `stop_calibration` derives `steps_per_rev` as the median of the
//! pairwise estimate over every unordered pair of samples — ported from the
//! source's `Controller.stop_calibration`, which uses
//! `itertools.combinations` plus `statistics.median`.

/// One axis's accumulated sightings. Cleared on `start_calibration`.
#[derive(Debug, Default, Clone)]
pub struct AxisSamples(Vec<(f64, i64)>);

impl AxisSamples {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn push(&mut self, angle_deg: f64, steps: i64) {
        self.0.push((angle_deg, steps));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn samples(&self) -> &[(f64, i64)] {
        &self.0
    }

    /// Estimate `steps_per_rev` from every unordered pair of samples,
    /// taking the median of the per-pair candidates. Returns `None` when
    /// fewer than two samples are present, or when every pair degenerates
    /// (`angles_diff == 0`) — in both cases the caller must leave the
    /// axis's existing `steps_per_rev` unchanged (§7: calibration
    /// underdetermined is not an error).
    pub fn estimate_steps_per_rev(&self) -> Option<u32> {
        let samples = &self.0;
        if samples.len() < 2 {
            return None;
        }

        let mut candidates = Vec::new();
        for i in 0..samples.len() {
            for j in (i + 1)..samples.len() {
                let (angle_i, steps_i) = samples[i];
                let (angle_j, steps_j) = samples[j];
                let steps_diff = (steps_j - steps_i) as f64;
                let mut angle_diff = angle_j - angle_i;

                if steps_diff * angle_diff < 0.0 {
                    angle_diff += if steps_diff > 0.0 { 360.0 } else { -360.0 };
                }

                if angle_diff == 0.0 {
                    continue;
                }

                candidates.push(360.0 * steps_diff / angle_diff);
            }
        }

        if candidates.is_empty() {
            return None;
        }

        candidates.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mid = candidates.len() / 2;
        let median = if candidates.len() % 2 == 0 {
            (candidates[mid - 1] + candidates[mid]) / 2.0
        } else {
            candidates[mid]
        };

        Some(median.abs().round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_median_of_pairwise_candidates() {
        let mut samples = AxisSamples::new();
        for (angle, steps) in [(0.0, 0), (90.0, 1000), (180.0, 1950), (270.0, 3000)] {
            samples.push(angle, steps);
        }
        assert_eq!(samples.estimate_steps_per_rev(), Some(4000));
    }

    #[test]
    fn fewer_than_two_samples_is_underdetermined() {
        let mut samples = AxisSamples::new();
        assert_eq!(samples.estimate_steps_per_rev(), None);
        samples.push(0.0, 0);
        assert_eq!(samples.estimate_steps_per_rev(), None);
    }

    #[test]
    fn scale_invariant_to_a_common_step_factor() {
        // Invariant 3: multiplying every steps_i by c scales the estimate by c.
        let mut base = AxisSamples::new();
        let mut scaled = AxisSamples::new();
        let c = 3i64;
        for (angle, steps) in [(0.0, 0), (90.0, 1000), (200.0, 2200)] {
            base.push(angle, steps);
            scaled.push(angle, steps * c);
        }
        let base_est = base.estimate_steps_per_rev().unwrap();
        let scaled_est = scaled.estimate_steps_per_rev().unwrap();
        assert_eq!(scaled_est, base_est * c as u32);
    }

    #[test]
    fn shortest_arc_sign_correction_handles_wraparound() {
        let mut samples = AxisSamples::new();
        samples.push(350.0, 0);
        samples.push(10.0, 200);
        let estimate = samples.estimate_steps_per_rev().unwrap();
        assert_eq!(estimate, 3600);
    }
}
