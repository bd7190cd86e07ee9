//! Classifiers that match live input against stored examples.
//!
//! Provides a k-nearest-neighbour classifier over feature vectors, a
//! nearest-template classifier over whole series scored by multi-resolution
//! DTW, a container running several classifiers on one input, and JSON
//! persistence for that container.

mod error;
mod knn;
mod model_set;
mod serialize;
mod template;

pub use error::KnnError;
pub use knn::{KnnClassifier, Neighbour};
pub use model_set::{ModelSet, TrainingExample};
pub use template::{SeriesClassifier, SeriesMatch};
