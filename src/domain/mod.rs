//! Domain types for color-highlighted region reading.
//!
//! This module contains the data model shared by the processors and the pipeline:
//! the binary [`Mask`], extracted [`Region`]s with their [`RegionBox`] geometry,
//! clustered [`Row`]s forming a [`VisitingSequence`], and the per-region
//! [`RegionText`] produced by recognition.

pub mod mask;
pub mod region;
pub mod text;

pub use mask::Mask;
pub use region::{Positioned, Region, RegionBox, Row, VisitingSequence};
pub use text::{RecognitionOutcome, RegionText};
