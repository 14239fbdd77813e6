//! Per-vertex placement transforms for markers on a stroked path.
//!
//! From the SVG specification: the axes of the temporary new user coordinate system are
//! aligned according to the `orient` attribute on the marker element and the slope of the
//! curve at the given vertex. If there is a discontinuity at a vertex, the slope is the
//! average of the slopes of the two segments of the curve that join at the given vertex.
//! If a slope cannot be determined, the slope is assumed to be zero.
//!
//! Reference: <https://www.w3.org/TR/SVG11/painting.html#MarkerElement>, the `orient` attribute.
//! Reference for the behaviour of zero-length segments:
//! <https://www.w3.org/TR/SVG11/implnote.html#PathElementImplementationNotes>

use crate::misc::point_to_dvec2;
use crate::path::{segment_is_degenerate, segment_tangent_at_start};

use glam::DAffine2;
use kurbo::{ParamCurve, PathSeg};
use std::f64::consts::PI;

/// The placement transform at the vertex shared by two adjacent segments: a rotation to
/// the bisector of the two tangent directions, composed with a translation to the vertex.
///
/// Both tangents are taken pointing in the direction of travel through the vertex. When the
/// two tangent angles differ by more than π, the naive average lies in the middle of the
/// larger of the two sectors they bound, so it is flipped by 180° to land in the smaller
/// sector. (Imagine a circle with rays drawn at both angles from its centre; the rays
/// divide the circle into two sectors.)
pub fn transform_at_junction(incoming: PathSeg, outgoing: PathSeg) -> DAffine2 {
	let vertex = point_to_dvec2(incoming.end());
	let tangent_in = -segment_tangent_at_start(incoming.reverse());
	let tangent_out = segment_tangent_at_start(outgoing);

	let angle_in = tangent_in.to_angle();
	let angle_out = tangent_out.to_angle();

	let mut bisector = (angle_in + angle_out) / 2.;
	if (angle_out - angle_in).abs() > PI {
		bisector += PI;
	}

	DAffine2::from_angle_translation(bisector, vertex)
}

/// The placement transform at a segment's start vertex: a rotation to the tangent
/// direction leaving the vertex, composed with a translation to the vertex.
///
/// A degenerate segment yields a pure translation with no rotation. The SVG spec suggests
/// searching neighbouring segments for a usable direction in that case; a zero angle is
/// used instead.
pub fn transform_at_start(segment: PathSeg) -> DAffine2 {
	let vertex = point_to_dvec2(segment.start());
	if segment_is_degenerate(segment) {
		return DAffine2::from_translation(vertex);
	}
	DAffine2::from_angle_translation(segment_tangent_at_start(segment).to_angle(), vertex)
}

/// The placement transform at a segment's end vertex: a rotation to the tangent direction
/// arriving at the vertex, composed with a translation to the vertex.
///
/// The tangent is recovered by reversing the segment and negating its start tangent, so it
/// points onwards in the direction of travel. A degenerate segment yields a pure
/// translation, as in [`transform_at_start`].
pub fn transform_at_end(segment: PathSeg) -> DAffine2 {
	let vertex = point_to_dvec2(segment.end());
	if segment_is_degenerate(segment) {
		return DAffine2::from_translation(vertex);
	}
	let tangent = -segment_tangent_at_start(segment.reverse());
	DAffine2::from_angle_translation(tangent.to_angle(), vertex)
}

#[cfg(test)]
mod tests {
	use super::*;
	use glam::DVec2;
	use kurbo::{Line, Point};

	fn line(from: (f64, f64), to: (f64, f64)) -> PathSeg {
		PathSeg::Line(Line::new(Point::new(from.0, from.1), Point::new(to.0, to.1)))
	}

	fn rotation_angle(transform: DAffine2) -> f64 {
		transform.transform_vector2(DVec2::X).to_angle()
	}

	/// Smallest absolute angular difference between two angles, in `[0, π]`.
	fn angular_distance(a: f64, b: f64) -> f64 {
		let difference = (a - b).rem_euclid(2. * PI);
		difference.min(2. * PI - difference)
	}

	#[test]
	fn start_and_end_transforms_follow_the_tangent() {
		let diagonal = line((0., 0.), (2., 2.));

		let at_start = transform_at_start(diagonal);
		assert!(at_start.translation.abs_diff_eq(DVec2::ZERO, 1e-12));
		assert!((rotation_angle(at_start) - PI / 4.).abs() < 1e-12);

		let at_end = transform_at_end(diagonal);
		assert!(at_end.translation.abs_diff_eq(DVec2::new(2., 2.), 1e-12));
		assert!((rotation_angle(at_end) - PI / 4.).abs() < 1e-12);
	}

	#[test]
	fn degenerate_segment_falls_back_to_pure_translation() {
		let dot = line((3., 4.), (3., 4.));
		for transform in [transform_at_start(dot), transform_at_end(dot)] {
			assert!(transform.translation.abs_diff_eq(DVec2::new(3., 4.), 1e-12));
			assert!(transform.matrix2.abs_diff_eq(glam::DMat2::IDENTITY, 1e-12));
		}
	}

	#[test]
	fn junction_bisects_a_right_angle_turn() {
		let incoming = line((0., 0.), (1., 0.));
		let outgoing = line((1., 0.), (1., 1.));
		let transform = transform_at_junction(incoming, outgoing);
		assert!(transform.translation.abs_diff_eq(DVec2::new(1., 0.), 1e-12));
		assert!((rotation_angle(transform) - PI / 4.).abs() < 1e-12);
	}

	#[test]
	fn junction_bisector_crosses_the_angle_wraparound() {
		// Travel direction into the vertex is 3π/4, out of it is -3π/4. The naive average
		// is 0, which points into the larger sector; the correct bisector points at π.
		let incoming = line((1., -1.), (0., 0.));
		let outgoing = line((0., 0.), (-1., -1.));
		let transform = transform_at_junction(incoming, outgoing);
		assert!((angular_distance(rotation_angle(transform), PI)) < 1e-12);
	}

	#[test]
	fn junction_bisector_always_lands_in_the_smaller_sector() {
		let steps = 16;
		for i in 0..steps {
			for j in 0..steps {
				let angle_in = -PI + 2. * PI * (i as f64) / (steps as f64);
				let angle_out = -PI + 2. * PI * (j as f64) / (steps as f64);
				let direction_in = DVec2::from_angle(angle_in);
				let direction_out = DVec2::from_angle(angle_out);

				let incoming = PathSeg::Line(Line::new(crate::misc::dvec2_to_point(-direction_in), Point::ZERO));
				let outgoing = PathSeg::Line(Line::new(Point::ZERO, crate::misc::dvec2_to_point(direction_out)));
				let bisector = rotation_angle(transform_at_junction(incoming, outgoing));

				assert!(bisector.is_finite());
				let to_in = angular_distance(bisector, angle_in);
				let to_out = angular_distance(bisector, angle_out);
				// Equidistant from both tangent directions, and inside the smaller sector:
				// the two distances sum to the sector's angle rather than to its reflex.
				assert!((to_in - to_out).abs() < 1e-9, "bisector is not equidistant for angles {angle_in}, {angle_out}");
				assert!(
					(to_in + to_out - angular_distance(angle_in, angle_out)).abs() < 1e-9,
					"bisector escaped the smaller sector for angles {angle_in}, {angle_out}"
				);
			}
		}
	}
}
