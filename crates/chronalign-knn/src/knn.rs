//! k-nearest-neighbour classification over feature vectors.

use std::collections::BTreeMap;

use chronalign_dtw::euclidean;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::KnnError;

/// A stored training example: a class label and its selected features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbour {
    /// Class label of the example.
    pub class: usize,
    /// Feature values, one per selected input.
    pub features: Vec<f64>,
}

/// Majority-vote classifier over the `k` stored examples nearest to the input.
///
/// The classifier reads only the inputs listed in `which_inputs`, so several
/// classifiers can share one raw input vector while looking at different
/// features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnClassifier {
    which_inputs: Vec<usize>,
    k: usize,
    neighbours: Vec<Neighbour>,
}

impl KnnClassifier {
    /// Create an empty classifier reading the given input indices.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`KnnError::InvalidK`] | `k` is zero |
    /// | [`KnnError::NoInputs`] | `which_inputs` is empty |
    pub fn new(which_inputs: Vec<usize>, k: usize) -> Result<Self, KnnError> {
        if k == 0 {
            return Err(KnnError::InvalidK { k });
        }
        if which_inputs.is_empty() {
            return Err(KnnError::NoInputs);
        }
        Ok(Self {
            which_inputs,
            k,
            neighbours: Vec::new(),
        })
    }

    /// Return the number of features each example carries.
    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.which_inputs.len()
    }

    /// Return the input indices this classifier reads.
    #[must_use]
    pub fn which_inputs(&self) -> &[usize] {
        &self.which_inputs
    }

    /// Return the number of neighbours consulted per vote.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Change the number of neighbours consulted per vote.
    ///
    /// # Errors
    ///
    /// Returns [`KnnError::InvalidK`] when `k` is zero.
    pub fn set_k(&mut self, k: usize) -> Result<(), KnnError> {
        if k == 0 {
            return Err(KnnError::InvalidK { k });
        }
        self.k = k;
        Ok(())
    }

    /// Return the stored examples.
    #[must_use]
    pub fn neighbours(&self) -> &[Neighbour] {
        &self.neighbours
    }

    /// Store a training example. `features` are already selected, one per input.
    ///
    /// # Errors
    ///
    /// Returns [`KnnError::FeatureCountMismatch`] when `features.len() != num_inputs()`.
    pub fn add_example(&mut self, class: usize, features: Vec<f64>) -> Result<(), KnnError> {
        if features.len() != self.num_inputs() {
            return Err(KnnError::FeatureCountMismatch {
                expected: self.num_inputs(),
                got: features.len(),
                example_index: self.neighbours.len(),
            });
        }
        self.neighbours.push(Neighbour { class, features });
        Ok(())
    }

    /// Drop every stored example, keeping the configuration.
    pub fn clear(&mut self) {
        self.neighbours.clear();
    }

    /// Return `(example index, distance)` for the `min(k, n)` nearest examples,
    /// nearest first. Equidistant examples keep their insertion order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`KnnError::EmptyTrainingSet`] | No examples are stored |
    /// | [`KnnError::InputTooShort`] | A selected input index is out of range for `input` |
    pub fn nearest(&self, input: &[f64]) -> Result<Vec<(usize, f64)>, KnnError> {
        if self.neighbours.is_empty() {
            return Err(KnnError::EmptyTrainingSet);
        }
        let pattern = self.select(input)?;

        let mut scored = self
            .neighbours
            .iter()
            .enumerate()
            .map(|(i, n)| Ok((i, euclidean(&pattern, &n.features)?)))
            .collect::<Result<Vec<_>, KnnError>>()?;
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(self.k);
        Ok(scored)
    }

    /// Classify `input` by majority vote among its nearest examples.
    ///
    /// Vote ties resolve to the smallest class label.
    ///
    /// # Errors
    ///
    /// Same conditions as [`KnnClassifier::nearest`].
    pub fn classify(&self, input: &[f64]) -> Result<usize, KnnError> {
        let nearest = self.nearest(input)?;

        let mut votes: BTreeMap<usize, usize> = BTreeMap::new();
        for &(i, _) in &nearest {
            *votes.entry(self.neighbours[i].class).or_default() += 1;
        }

        let mut found = 0;
        let mut most_votes = 0;
        for (&class, &count) in &votes {
            if count > most_votes {
                most_votes = count;
                found = class;
            }
        }
        trace!(class = found, votes = most_votes, k = nearest.len(), "knn vote");
        Ok(found)
    }

    /// Check invariants that deserialization cannot enforce.
    pub(crate) fn validate(&self) -> Result<(), KnnError> {
        if self.k == 0 {
            return Err(KnnError::InvalidK { k: self.k });
        }
        if self.which_inputs.is_empty() {
            return Err(KnnError::NoInputs);
        }
        if let Some((example_index, n)) = self
            .neighbours
            .iter()
            .enumerate()
            .find(|(_, n)| n.features.len() != self.num_inputs())
        {
            return Err(KnnError::FeatureCountMismatch {
                expected: self.num_inputs(),
                got: n.features.len(),
                example_index,
            });
        }
        Ok(())
    }

    fn select(&self, input: &[f64]) -> Result<Vec<f64>, KnnError> {
        self.which_inputs
            .iter()
            .map(|&index| {
                input.get(index).copied().ok_or(KnnError::InputTooShort {
                    index,
                    len: input.len(),
                })
            })
            .collect()
    }
}
