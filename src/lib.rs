//! Placement of SVG-style markers (arrowheads, dots, and other vertex decorations) along
//! stroked paths: per-vertex orientation transforms, instance counting, bounds
//! accumulation, and the show/hide lifecycle against an external rendering container.

mod bindings;
mod consts;
mod marker;
mod misc;
mod orientation;
mod path;
mod walk;

pub use bindings::*;
pub use consts::*;
pub use marker::*;
pub use misc::{dvec2_to_point, point_to_dvec2};
pub use orientation::*;
pub use path::*;
pub use walk::*;
