//! Trait definitions for the pipeline's external seams.

pub mod recognizer;

pub use recognizer::{Detection, TextRecognizer};
