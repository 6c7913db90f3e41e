//! Core types for Florascope

use serde::{Deserialize, Serialize};

/// Outcome of classifying a single image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class name
    pub label: String,

    /// Index of the class in the model's output layer
    pub index: usize,

    /// Softmax probability of the predicted class (0.0-1.0)
    pub confidence: f32,

    /// Inference latency in microseconds
    #[serde(default)]
    pub latency_us: u64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: impl Into<String>, index: usize, confidence: f32) -> Self {
        Self {
            label: label.into(),
            index,
            confidence,
            latency_us: 0,
        }
    }

    /// Attach the measured latency
    pub fn with_latency_us(mut self, latency_us: u64) -> Self {
        self.latency_us = latency_us;
        self
    }
}
