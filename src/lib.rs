//! Stipple draws SVG-like shape markup onto pluggable canvases.
//!
//! An element tree ([`ShapeElement`]) is walked by [`render`], which resolves
//! each element's presentation attributes and inline style, inherits them
//! through groups, flattens Bézier curves into polygons and issues drawing
//! primitives on anything implementing [`api::ShapeCanvas`].
//!
//! ```
//! use stipple::backends::recording::RecordingCanvas;
//! use stipple::ShapeElement;
//!
//! let root = ShapeElement::new("svg").child(
//!     ShapeElement::new("circle")
//!         .attr("cx", "10")
//!         .attr("cy", "10")
//!         .attr("r", "5")
//!         .attr("fill", "red"),
//! );
//! let mut canvas = RecordingCanvas::new();
//! stipple::render(&root, &mut canvas)?;
//! assert_eq!(canvas.ops().len(), 1);
//! # Ok::<(), stipple::StippleError>(())
//! ```

pub mod api;
pub mod backends;
pub mod bezier;
pub mod config;
#[cfg(feature = "svg")]
pub mod document;
pub mod element;
pub mod error;
pub mod path;
pub mod shapes;
pub mod style;

pub use config::RenderOptions;
pub use element::ShapeElement;
pub use error::{Result, StippleError};
pub use shapes::{render, render_with};
