//! Several classifiers evaluated against one shared input vector.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::KnnError;
use crate::knn::KnnClassifier;

/// One labelled training row: a raw input vector and one label per model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Raw input values shared by every model.
    pub input: Vec<f64>,
    /// Target class for each model, in model order.
    pub output: Vec<usize>,
}

impl TrainingExample {
    /// Bundle an input vector with its per-model labels.
    #[must_use]
    pub fn new(input: Vec<f64>, output: Vec<usize>) -> Self {
        Self { input, output }
    }
}

/// Ordered set of [`KnnClassifier`]s that all read the same raw input vector.
///
/// Model `i` predicts output column `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSet {
    pub(crate) num_inputs: usize,
    pub(crate) input_names: Vec<String>,
    pub(crate) models: Vec<KnnClassifier>,
}

impl ModelSet {
    /// Assemble a set from already configured classifiers.
    ///
    /// Input names default to `input_0`, `input_1`, ...
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`KnnError::NoInputs`] | `num_inputs` is zero |
    /// | [`KnnError::InvalidModel`] | `models` is empty, or a model reads an input index `>= num_inputs` |
    pub fn new(num_inputs: usize, models: Vec<KnnClassifier>) -> Result<Self, KnnError> {
        let set = Self {
            num_inputs,
            input_names: default_names(num_inputs),
            models,
        };
        set.validate()?;
        Ok(set)
    }

    /// Train one classifier per output column, each reading every input.
    ///
    /// The number of inputs and outputs is taken from the first example.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`KnnError::EmptyTrainingSet`] | `examples` is empty |
    /// | [`KnnError::InvalidK`] | `k` is zero |
    /// | [`KnnError::NoInputs`] | The first example has no inputs |
    /// | [`KnnError::InvalidModel`] | The first example has no outputs |
    /// | [`KnnError::FeatureCountMismatch`] | An example's input width differs from the first |
    /// | [`KnnError::LabelCountMismatch`] | An example's output width differs from the first |
    #[instrument(skip(examples), fields(n_examples = examples.len()))]
    pub fn train(examples: &[TrainingExample], k: usize) -> Result<Self, KnnError> {
        let first = examples.first().ok_or(KnnError::EmptyTrainingSet)?;
        let num_inputs = first.input.len();
        let num_outputs = first.output.len();
        if num_outputs == 0 {
            return Err(KnnError::InvalidModel {
                reason: "training examples carry no output labels".into(),
            });
        }

        let all_inputs: Vec<usize> = (0..num_inputs).collect();
        let models = (0..num_outputs)
            .map(|_| KnnClassifier::new(all_inputs.clone(), k))
            .collect::<Result<Vec<_>, _>>()?;

        let mut set = Self {
            num_inputs,
            input_names: default_names(num_inputs),
            models,
        };
        for example in examples {
            set.add_example(example)?;
        }

        debug!(num_inputs, num_outputs, k, "model set trained");
        Ok(set)
    }

    /// Replace the input names, one per input.
    ///
    /// # Errors
    ///
    /// Returns [`KnnError::InvalidModel`] when `names.len() != num_inputs()`.
    pub fn with_input_names(mut self, names: Vec<String>) -> Result<Self, KnnError> {
        if names.len() != self.num_inputs {
            return Err(KnnError::InvalidModel {
                reason: format!(
                    "{} input names given for {} inputs",
                    names.len(),
                    self.num_inputs
                ),
            });
        }
        self.input_names = names;
        Ok(self)
    }

    /// Feed one example to every model, each taking its own output column.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`KnnError::FeatureCountMismatch`] | `example.input` does not have `num_inputs()` values |
    /// | [`KnnError::LabelCountMismatch`] | `example.output` does not have `num_outputs()` labels |
    pub fn add_example(&mut self, example: &TrainingExample) -> Result<(), KnnError> {
        let example_index = self.models.first().map_or(0, |m| m.neighbours().len());
        if example.input.len() != self.num_inputs {
            return Err(KnnError::FeatureCountMismatch {
                expected: self.num_inputs,
                got: example.input.len(),
                example_index,
            });
        }
        if example.output.len() != self.models.len() {
            return Err(KnnError::LabelCountMismatch {
                expected: self.models.len(),
                got: example.output.len(),
                example_index,
            });
        }

        for (model, &class) in self.models.iter_mut().zip(&example.output) {
            let features = model
                .which_inputs()
                .iter()
                .map(|&i| example.input[i])
                .collect();
            model.add_example(class, features)?;
        }
        Ok(())
    }

    /// Run every model on `input`, returning one class per model.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`KnnError::FeatureCountMismatch`] | `input` does not have `num_inputs()` values |
    /// | [`KnnError::EmptyTrainingSet`] | A model has no examples |
    pub fn process(&self, input: &[f64]) -> Result<Vec<usize>, KnnError> {
        if input.len() != self.num_inputs {
            return Err(KnnError::FeatureCountMismatch {
                expected: self.num_inputs,
                got: input.len(),
                example_index: 0,
            });
        }
        self.models.iter().map(|m| m.classify(input)).collect()
    }

    /// Drop every stored example from every model.
    pub fn clear_examples(&mut self) {
        for model in &mut self.models {
            model.clear();
        }
    }

    /// Return the models in output order.
    #[must_use]
    pub fn models(&self) -> &[KnnClassifier] {
        &self.models
    }

    /// Return the input names.
    #[must_use]
    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    /// Return the width of the shared input vector.
    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Return the number of models, which is the width of the output.
    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.models.len()
    }

    pub(crate) fn validate(&self) -> Result<(), KnnError> {
        if self.num_inputs == 0 {
            return Err(KnnError::NoInputs);
        }
        if self.models.is_empty() {
            return Err(KnnError::InvalidModel {
                reason: "model set holds no models".into(),
            });
        }
        if self.input_names.len() != self.num_inputs {
            return Err(KnnError::InvalidModel {
                reason: format!(
                    "{} input names for {} inputs",
                    self.input_names.len(),
                    self.num_inputs
                ),
            });
        }
        for (i, model) in self.models.iter().enumerate() {
            model.validate()?;
            if let Some(&bad) = model.which_inputs().iter().find(|&&w| w >= self.num_inputs) {
                return Err(KnnError::InvalidModel {
                    reason: format!(
                        "model {i} reads input {bad} but only {} inputs exist",
                        self.num_inputs
                    ),
                });
            }
        }
        Ok(())
    }
}

fn default_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("input_{i}")).collect()
}
