//! Canvas object model.

mod capabilities;
mod object;
mod stroke;

pub use capabilities::Capabilities;
pub use object::{BoxShape, CanvasObject, CanvasShape, Shape};
pub use stroke::{Stroke, StrokeStyle};
