use crate::consts::MAX_ABSOLUTE_DIFFERENCE;
use crate::misc::point_to_dvec2;

use glam::DVec2;
use kurbo::{BezPath, CubicBez, Line, ParamCurve, PathEl, PathSeg, Point, QuadBez};

/// One continuous run of segments within a [`Path`], optionally closed.
///
/// `segments` holds only the explicit curve segments; the straight closing segment of a
/// closed subpath is implicit and synthesized on demand by [`Subpath::closing_segment`].
/// A subpath with no segments at all represents a bare move-to: a single on-path point.
#[derive(Clone, Debug, PartialEq)]
pub struct Subpath {
	start: Point,
	segments: Vec<PathSeg>,
	closed: bool,
}

#[cfg(feature = "dyn-any")]
unsafe impl dyn_any::StaticType for Subpath {
	type Static = Subpath;
}

impl Subpath {
	/// Create a subpath from its first on-path point and its explicit segments.
	///
	/// When `segments` is non-empty, `start` must coincide with the first segment's start
	/// point; consecutive segments are expected to connect end to start.
	pub fn new(start: Point, segments: Vec<PathSeg>, closed: bool) -> Self {
		debug_assert!(
			segments.first().map_or(true, |segment| point_to_dvec2(segment.start()).abs_diff_eq(point_to_dvec2(start), MAX_ABSOLUTE_DIFFERENCE)),
			"Subpath start point does not match its first segment"
		);
		Self { start, segments, closed }
	}

	/// A subpath consisting of a single point (a bare move-to).
	pub fn from_point(point: Point) -> Self {
		Self {
			start: point,
			segments: Vec::new(),
			closed: false,
		}
	}

	pub fn is_closed(&self) -> bool {
		self.closed
	}

	/// The explicit segments, excluding the implicit closing segment.
	pub fn segments(&self) -> &[PathSeg] {
		&self.segments
	}

	/// The subpath's first on-path point.
	pub fn start_point(&self) -> Point {
		self.start
	}

	/// The final on-path point of the explicit segments (the start point for a bare move-to).
	pub fn end_point(&self) -> Point {
		self.segments.last().map_or(self.start, |segment| segment.end())
	}

	/// The straight segment from the end of the last explicit segment back to the start point.
	/// Zero length for a bare move-to.
	pub fn closing_segment(&self) -> PathSeg {
		PathSeg::Line(Line::new(self.end_point(), self.start))
	}

	/// The number of segments in the stroked decomposition of this subpath.
	/// The implicit closing segment is counted only when the subpath is closed and
	/// `include_closing` is set.
	pub fn segment_count(&self, include_closing: bool) -> usize {
		self.segments.len() + (self.closed && include_closing) as usize
	}

	/// The segment at `segment_index` in the stroked decomposition, where a closed subpath's
	/// closing segment sits at the final index.
	pub fn segment(&self, segment_index: usize) -> Option<PathSeg> {
		if segment_index < self.segments.len() {
			return Some(self.segments[segment_index]);
		}
		(self.closed && segment_index == self.segments.len()).then(|| self.closing_segment())
	}

	/// Iterate the stroked decomposition: every explicit segment, then the closing segment
	/// when the subpath is closed.
	pub fn stroke_segments(&self) -> impl Iterator<Item = PathSeg> + '_ {
		let closing = self.closed.then(|| self.closing_segment());
		self.segments.iter().copied().chain(closing)
	}

	/// The first segment of the stroked decomposition. A bare move-to yields its zero-length
	/// closing segment, which places markers at the point itself.
	pub fn first_segment(&self) -> PathSeg {
		self.segment(0).unwrap_or_else(|| self.closing_segment())
	}

	/// The last segment of the stroked decomposition, closing segment included.
	/// A bare move-to yields its zero-length closing segment.
	pub fn last_segment(&self) -> PathSeg {
		let count = self.segment_count(true);
		if count == 0 {
			return self.closing_segment();
		}
		self.segment(count - 1).unwrap_or_else(|| self.closing_segment())
	}
}

/// An ordered collection of subpaths. Order matters to marker placement: the first
/// subpath's first vertex is the path's start, the last subpath's last vertex is its end.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
	subpaths: Vec<Subpath>,
}

#[cfg(feature = "dyn-any")]
unsafe impl dyn_any::StaticType for Path {
	type Static = Path;
}

impl Path {
	pub const fn new(subpaths: Vec<Subpath>) -> Self {
		Self { subpaths }
	}

	/// Split a [`BezPath`] into subpaths at each `MoveTo`, recording `ClosePath` as the
	/// closed flag. Segments following a `ClosePath` without an intervening `MoveTo`
	/// continue in a new subpath at the closed subpath's start point.
	pub fn from_bezpath(bezpath: &BezPath) -> Self {
		let mut subpaths = Vec::new();
		let mut start = Point::ZERO;
		let mut current = Point::ZERO;
		let mut segments: Vec<PathSeg> = Vec::new();
		let mut pending = false;

		for element in bezpath.elements() {
			if !pending {
				match element {
					PathEl::MoveTo(_) => {}
					PathEl::ClosePath => continue,
					_ => {
						if subpaths.is_empty() {
							log::warn!("Path segment before any MoveTo is dropped");
							continue;
						}
						start = current;
						pending = true;
					}
				}
			}
			match *element {
				PathEl::MoveTo(point) => {
					if pending {
						subpaths.push(Subpath::new(start, std::mem::take(&mut segments), false));
					}
					start = point;
					current = point;
					pending = true;
				}
				PathEl::LineTo(point) => {
					segments.push(PathSeg::Line(Line::new(current, point)));
					current = point;
				}
				PathEl::QuadTo(handle, point) => {
					segments.push(PathSeg::Quad(QuadBez::new(current, handle, point)));
					current = point;
				}
				PathEl::CurveTo(handle_start, handle_end, point) => {
					segments.push(PathSeg::Cubic(CubicBez::new(current, handle_start, handle_end, point)));
					current = point;
				}
				PathEl::ClosePath => {
					subpaths.push(Subpath::new(start, std::mem::take(&mut segments), true));
					current = start;
					pending = false;
				}
			}
		}
		if pending {
			subpaths.push(Subpath::new(start, segments, false));
		}

		Self { subpaths }
	}

	pub fn subpaths(&self) -> &[Subpath] {
		&self.subpaths
	}

	pub fn is_empty(&self) -> bool {
		self.subpaths.is_empty()
	}

	/// The total number of on-path vertices: each subpath contributes one more vertex than
	/// its stroked segment count, counting both of its endpoints.
	pub fn vertex_count(&self) -> usize {
		self.subpaths.iter().map(|subpath| subpath.segment_count(true) + 1).sum()
	}
}

fn control_points(segment: PathSeg) -> [Point; 4] {
	match segment {
		PathSeg::Line(line) => [line.p0, line.p1, line.p1, line.p1],
		PathSeg::Quad(quad) => [quad.p0, quad.p1, quad.p2, quad.p2],
		PathSeg::Cubic(cubic) => [cubic.p0, cubic.p1, cubic.p2, cubic.p3],
	}
}

/// Returns true if all of the segment's control points are at the same location, so the
/// segment has zero length and no usable tangent direction.
pub fn segment_is_degenerate(segment: PathSeg) -> bool {
	let [start, rest @ ..] = control_points(segment).map(point_to_dvec2);
	rest.iter().all(|point| point.abs_diff_eq(start, MAX_ABSOLUTE_DIFFERENCE))
}

/// The unit tangent in the direction of travel at the segment's start (parameter 0).
///
/// For a Bezier segment this is the direction from the start towards the first control
/// point distinct from it, which also covers the cusp case where the derivative vanishes
/// at the start. Returns the zero vector for a degenerate segment.
pub fn segment_tangent_at_start(segment: PathSeg) -> DVec2 {
	let [start, rest @ ..] = control_points(segment).map(point_to_dvec2);
	rest.into_iter()
		.find(|point| !point.abs_diff_eq(start, MAX_ABSOLUTE_DIFFERENCE))
		.map(|point| (point - start).normalize())
		.unwrap_or(DVec2::ZERO)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn square_with_tail() -> BezPath {
		let mut bezpath = BezPath::new();
		bezpath.move_to((0., 0.));
		bezpath.line_to((1., 0.));
		bezpath.line_to((1., 1.));
		bezpath.line_to((0., 1.));
		bezpath.close_path();
		bezpath.move_to((5., 5.));
		bezpath.curve_to((6., 5.), (7., 6.), (7., 7.));
		bezpath.move_to((9., 9.));
		bezpath
	}

	#[test]
	fn from_bezpath_splits_subpaths() {
		let path = Path::from_bezpath(&square_with_tail());
		assert_eq!(path.subpaths().len(), 3);

		let square = &path.subpaths()[0];
		assert!(square.is_closed());
		assert_eq!(square.segments().len(), 3);
		assert_eq!(square.segment_count(true), 4);
		assert_eq!(square.segment_count(false), 3);
		assert_eq!(square.closing_segment(), PathSeg::Line(Line::new(Point::new(0., 1.), Point::new(0., 0.))));

		let tail = &path.subpaths()[1];
		assert!(!tail.is_closed());
		assert_eq!(tail.segment_count(true), 1);

		let lone = &path.subpaths()[2];
		assert_eq!(lone.segment_count(true), 0);
		assert_eq!(lone.start_point(), Point::new(9., 9.));
		assert!(segment_is_degenerate(lone.first_segment()));
		assert!(segment_is_degenerate(lone.last_segment()));
	}

	#[test]
	fn vertex_count_counts_both_endpoints() {
		let path = Path::from_bezpath(&square_with_tail());
		// 4 + 1 for the closed square, 1 + 1 for the tail, 0 + 1 for the bare move-to.
		assert_eq!(path.vertex_count(), 8);
		assert_eq!(Path::default().vertex_count(), 0);
	}

	#[test]
	fn closed_subpath_last_segment_is_the_closing_segment() {
		let mut bezpath = BezPath::new();
		bezpath.move_to((0., 0.));
		bezpath.line_to((2., 0.));
		bezpath.line_to((2., 2.));
		bezpath.close_path();
		let path = Path::from_bezpath(&bezpath);

		let subpath = &path.subpaths()[0];
		assert_eq!(subpath.last_segment(), subpath.closing_segment());
		assert_eq!(subpath.last_segment(), PathSeg::Line(Line::new(Point::new(2., 2.), Point::new(0., 0.))));
		assert_eq!(subpath.stroke_segments().count(), 3);
	}

	#[test]
	fn segments_after_close_open_a_new_subpath() {
		let elements = [
			PathEl::MoveTo(Point::new(0., 0.)),
			PathEl::LineTo(Point::new(1., 0.)),
			PathEl::ClosePath,
			PathEl::LineTo(Point::new(0., 5.)),
		];
		let path = Path::from_bezpath(&BezPath::from_vec(elements.to_vec()));
		assert_eq!(path.subpaths().len(), 2);
		assert!(path.subpaths()[0].is_closed());
		assert_eq!(path.subpaths()[1].start_point(), Point::new(0., 0.));
		assert_eq!(path.subpaths()[1].end_point(), Point::new(0., 5.));
	}

	#[test]
	fn tangent_at_start_falls_back_past_coincident_handles() {
		let cusp = PathSeg::Cubic(CubicBez::new(Point::new(1., 1.), Point::new(1., 1.), Point::new(4., 1.), Point::new(4., 4.)));
		assert!(!segment_is_degenerate(cusp));
		assert!(segment_tangent_at_start(cusp).abs_diff_eq(DVec2::X, 1e-12));

		let dot = PathSeg::Line(Line::new(Point::new(3., 4.), Point::new(3., 4.)));
		assert!(segment_is_degenerate(dot));
		assert_eq!(segment_tangent_at_start(dot), DVec2::ZERO);
	}
}
