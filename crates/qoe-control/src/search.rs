//! Candidate search over the feasible configuration space

use qoe_core::{Configuration, NetworkState, PredictionResult, QoeError, QoeResult};
use qoe_model::QualityPredictor;
use serde::{Deserialize, Serialize};

/// Tolerance within which two predicted scores count as tied
pub const DEFAULT_TIE_EPSILON: f64 = 1e-6;

/// Declared search axes.
///
/// Enumeration order is bitrate (outermost), frame size, complexity, then
/// FEC, each in the listed order. That order is part of the tie-break and
/// must not change between runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub bitrates: Vec<u32>,
    pub frame_sizes_ms: Vec<u16>,
    pub complexities: Vec<u8>,
    pub fec: Vec<bool>,
}

impl Default for SearchSpace {
    /// The grid the reference training data was generated on
    fn default() -> Self {
        SearchSpace {
            bitrates: vec![8_000, 12_000, 16_000, 24_000, 32_000, 48_000],
            frame_sizes_ms: vec![20, 40, 60],
            complexities: vec![5, 9],
            fec: vec![false, true],
        }
    }
}

impl SearchSpace {
    /// Cartesian product of the axes, in declared order
    pub fn enumerate(&self) -> Vec<Configuration> {
        let mut candidates = Vec::with_capacity(
            self.bitrates.len()
                * self.frame_sizes_ms.len()
                * self.complexities.len()
                * self.fec.len(),
        );
        for &bitrate in &self.bitrates {
            for &frame_size_ms in &self.frame_sizes_ms {
                for &complexity in &self.complexities {
                    for &use_fec in &self.fec {
                        candidates.push(Configuration::new(
                            bitrate,
                            frame_size_ms,
                            complexity,
                            use_fec,
                        ));
                    }
                }
            }
        }
        candidates
    }
}

/// Finite, order-stable candidate set
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateSearch {
    candidates: Vec<Configuration>,
}

impl CandidateSearch {
    /// Enumerate a search space. Fails if it yields nothing or any candidate
    /// is outside the declared domains.
    pub fn new(space: &SearchSpace) -> QoeResult<Self> {
        Self::from_candidates(space.enumerate())
    }

    /// Use an explicit ordered candidate list
    pub fn from_candidates(candidates: Vec<Configuration>) -> QoeResult<Self> {
        if candidates.is_empty() {
            return Err(QoeError::EmptySearchSpace);
        }
        for candidate in &candidates {
            candidate.validate()?;
        }
        Ok(CandidateSearch { candidates })
    }

    /// Restartable: every call yields the same sequence
    pub fn enumerate_candidates(&self) -> impl Iterator<Item = Configuration> + '_ {
        self.candidates.iter().copied()
    }

    pub fn candidates(&self) -> &[Configuration] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn contains(&self, config: &Configuration) -> bool {
        self.candidates.contains(config)
    }

    /// Score every candidate; the first prediction error aborts the search
    pub fn score_all(
        &self,
        predictor: &QualityPredictor,
        state: &NetworkState,
    ) -> QoeResult<Vec<PredictionResult>> {
        self.enumerate_candidates()
            .map(|candidate| predictor.evaluate(&candidate, state))
            .collect()
    }

    /// Highest-scoring candidate, tie-broken by [`select_best`]
    pub fn best(
        &self,
        predictor: &QualityPredictor,
        state: &NetworkState,
        tie_epsilon: f64,
    ) -> QoeResult<PredictionResult> {
        let scored = self.score_all(predictor, state)?;
        select_best(&scored, tie_epsilon).ok_or(QoeError::EmptySearchSpace)
    }
}

/// Pick the maximum predicted score.
///
/// Every result within `tie_epsilon` of the maximum is a tie; among ties the
/// lowest bitrate wins, then the smallest frame size, then the earliest in
/// enumeration order.
pub fn select_best(results: &[PredictionResult], tie_epsilon: f64) -> Option<PredictionResult> {
    let max = results
        .iter()
        .map(|r| r.score)
        .fold(f64::NEG_INFINITY, f64::max);

    results
        .iter()
        .filter(|r| r.score >= max - tie_epsilon)
        .min_by_key(|r| (r.configuration.bitrate, r.configuration.frame_size_ms))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(bitrate: u32, frame: u16, complexity: u8, score: f64) -> PredictionResult {
        PredictionResult::new(
            Configuration::new(bitrate, frame, complexity, false),
            score,
            NetworkState::new(0.0).unwrap(),
        )
    }

    #[test]
    fn test_default_grid() {
        let search = CandidateSearch::new(&SearchSpace::default()).unwrap();
        assert_eq!(search.len(), 72);
        assert!(search.enumerate_candidates().all(|c| c.is_valid()));

        let first = search.candidates()[0];
        assert_eq!(first, Configuration::new(8_000, 20, 5, false));
        assert_eq!(search.candidates()[1], Configuration::new(8_000, 20, 5, true));
        assert_eq!(search.candidates()[2], Configuration::new(8_000, 20, 9, false));
        assert_eq!(search.candidates()[71], Configuration::new(48_000, 60, 9, true));
    }

    #[test]
    fn test_restartable() {
        let search = CandidateSearch::new(&SearchSpace::default()).unwrap();
        let first: Vec<_> = search.enumerate_candidates().collect();
        let second: Vec<_> = search.enumerate_candidates().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_axis_is_construction_error() {
        let space = SearchSpace {
            fec: vec![],
            ..SearchSpace::default()
        };
        assert_eq!(CandidateSearch::new(&space), Err(QoeError::EmptySearchSpace));
        assert_eq!(
            CandidateSearch::from_candidates(vec![]),
            Err(QoeError::EmptySearchSpace)
        );
    }

    #[test]
    fn test_out_of_domain_axis_rejected() {
        let space = SearchSpace {
            frame_sizes_ms: vec![20, 30],
            ..SearchSpace::default()
        };
        assert!(matches!(
            CandidateSearch::new(&space),
            Err(QoeError::ConfigurationDomain(_))
        ));
    }

    #[test]
    fn test_select_unique_max() {
        let results = [
            result(8_000, 20, 5, 2.0),
            result(32_000, 40, 5, 3.9),
            result(48_000, 20, 5, 3.5),
        ];
        let best = select_best(&results, DEFAULT_TIE_EPSILON).unwrap();
        assert_eq!(best.configuration.bitrate, 32_000);
        assert_eq!(best.score, 3.9);
    }

    #[test]
    fn test_tie_prefers_low_bitrate_then_small_frame() {
        let results = [
            result(48_000, 20, 5, 3.0),
            result(16_000, 60, 5, 3.0 + 1e-7),
            result(16_000, 40, 9, 3.0),
            result(16_000, 40, 5, 3.0),
        ];
        let best = select_best(&results, DEFAULT_TIE_EPSILON).unwrap();
        assert_eq!(best.configuration, Configuration::new(16_000, 40, 9, false));
    }

    #[test]
    fn test_outside_epsilon_is_not_a_tie() {
        let results = [result(8_000, 20, 5, 3.0), result(48_000, 20, 5, 3.001)];
        let best = select_best(&results, DEFAULT_TIE_EPSILON).unwrap();
        assert_eq!(best.configuration.bitrate, 48_000);
    }

    #[test]
    fn test_select_from_nothing() {
        assert!(select_best(&[], DEFAULT_TIE_EPSILON).is_none());
    }
}
