//! Nearest-template classification of whole series.

use chronalign_dtw::{FastDtw, Series, SeriesView};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::KnnError;

/// Result of matching one series against every stored template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesMatch {
    /// Label of the best-matching template.
    pub label: usize,
    /// Alignment cost against the best-matching template.
    pub cost: f64,
    /// Index of the best-matching template in insertion order.
    pub template_index: usize,
    /// Alignment cost against every template, in insertion order.
    pub costs: Vec<f64>,
}

/// Labels a series with the label of the template it aligns to most cheaply.
///
/// Costs come from [`FastDtw`]; equal costs resolve to the earlier template.
#[derive(Debug, Clone)]
pub struct SeriesClassifier {
    fast: FastDtw,
    templates: Vec<(usize, Series<f64>)>,
}

impl SeriesClassifier {
    /// Create an empty classifier aligning with the given search radius.
    #[must_use]
    pub fn new(radius: usize) -> Self {
        Self {
            fast: FastDtw::new(radius),
            templates: Vec::new(),
        }
    }

    /// Return the search radius used for alignment.
    #[must_use]
    pub fn radius(&self) -> usize {
        self.fast.radius()
    }

    /// Return the number of stored templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Return true if no template is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Store a labelled template.
    ///
    /// # Errors
    ///
    /// Returns [`KnnError::TemplateDimensionMismatch`] when the template's
    /// frame dimension differs from the templates already stored.
    pub fn add_template(&mut self, label: usize, template: Series<f64>) -> Result<(), KnnError> {
        if let Some((_, first)) = self.templates.first()
            && first.dimension() != template.dimension()
        {
            return Err(KnnError::TemplateDimensionMismatch {
                expected: first.dimension(),
                got: template.dimension(),
            });
        }
        self.templates.push((label, template));
        Ok(())
    }

    /// Match `series` against every template.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`KnnError::EmptyTrainingSet`] | No templates are stored |
    /// | [`KnnError::Align`] | `series` has a different frame dimension than the templates |
    #[instrument(skip(self, series), fields(len = series.len(), templates = self.templates.len()))]
    pub fn classify(&self, series: SeriesView<'_, f64>) -> Result<SeriesMatch, KnnError> {
        if self.templates.is_empty() {
            return Err(KnnError::EmptyTrainingSet);
        }

        let costs = self
            .templates
            .iter()
            .map(|(_, template)| self.fast.cost(series, template.as_view()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut best = 0;
        for (i, cost) in costs.iter().enumerate().skip(1) {
            if *cost < costs[best] {
                best = i;
            }
        }

        let label = self.templates[best].0;
        debug!(label, template = best, cost = costs[best], "series matched");
        Ok(SeriesMatch {
            label,
            cost: costs[best],
            template_index: best,
            costs,
        })
    }
}
