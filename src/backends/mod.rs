//! Canvas implementations.

pub mod recording;

#[cfg(feature = "svg")]
pub mod svg;

#[cfg(feature = "cairo")]
pub mod cairo;
