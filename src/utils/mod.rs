//! Utility functions for the ink pipeline.
//!
//! This module provides image loading and transport helpers, overlay rendering and
//! logging setup.

pub mod image;
#[cfg(feature = "visualization")]
pub mod visualization;

pub use self::image::{
    base64_body, decode_data_url, dynamic_to_rgb, encode_png, encode_png_base64,
    encode_png_data_url, load_image, load_image_from_memory,
};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
