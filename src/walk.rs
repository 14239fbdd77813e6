//! The single traversal shared by the instance-emission, bounding-box, and print
//! consumers. All three must enumerate exactly the same vertices in exactly the same
//! order, because the rendering container pre-allocates per-slot instance storage from
//! [`crate::MarkerBindings::instance_counts`] before the walk runs.

use crate::bindings::MarkerBindings;
use crate::marker::{MarkerDefinition, MarkerSlot, VertexRole};
use crate::orientation::{transform_at_end, transform_at_junction, transform_at_start};
use crate::path::Path;

use glam::DAffine2;
use kurbo::PathSeg;

/// Receives one callback per (vertex, firing slot) pair, in traversal order. `base` is the
/// tangent-derived placement transform for the vertex; per-marker adjustments are the
/// visitor's business, via [`crate::oriented_placement`].
pub trait MarkerVisitor {
	fn visit(&mut self, slot: MarkerSlot, marker: &dyn MarkerDefinition, role: VertexRole, base: DAffine2);
}

fn fire(bindings: &MarkerBindings, visitor: &mut impl MarkerVisitor, role: VertexRole, base: DAffine2, suppress_all: bool) {
	for slot in [MarkerSlot::All, role.slot()] {
		if suppress_all && slot == MarkerSlot::All {
			continue;
		}
		if let Some(marker) = bindings.marker(slot) {
			visitor.visit(slot, marker.as_ref(), role, base);
		}
	}
}

/// Walk every marker-bearing vertex of `path`, calling the visitor once per firing slot.
///
/// The path's first vertex takes the start role, its final vertex the end role, and every
/// other vertex the mid role; the `All` slot fires at each of them, before the positional
/// slot. The vertex enumeration agrees exactly, per slot, with
/// [`crate::MarkerBindings::instance_counts`].
pub fn walk_markers(path: &Path, bindings: &MarkerBindings, visitor: &mut impl MarkerVisitor) {
	let (Some(first_subpath), Some(last_subpath)) = (path.subpaths().first(), path.subpaths().last()) else {
		return;
	};

	// Start region: the first vertex of the path.
	fire(bindings, visitor, VertexRole::Start, transform_at_start(first_subpath.first_segment()), false);

	// Mid region: every path-internal vertex. Skipped outright when no bound marker can
	// fire at one, so paths with only start/end arrowheads never iterate their segments.
	if bindings.marker(MarkerSlot::Mid).is_some() || bindings.marker(MarkerSlot::All).is_some() {
		let last_index = path.subpaths().len() - 1;
		for (subpath_index, subpath) in path.subpaths().iter().enumerate() {
			let segment_count = subpath.segment_count(true);

			// The first vertex of each subpath after the first is an internal vertex of the
			// path, except a trailing bare move-to, which is the path's end vertex instead.
			if subpath_index != 0 && !(subpath_index == last_index && segment_count == 0) {
				fire(bindings, visitor, VertexRole::Mid, transform_at_start(subpath.first_segment()), false);
			}

			// Junctions between consecutive segments. The closing segment of a closed
			// subpath participates as the final outgoing segment, so a marker lands where
			// the last explicit segment meets it.
			let segments: Vec<PathSeg> = subpath.stroke_segments().collect();
			for pair in segments.windows(2) {
				fire(bindings, visitor, VertexRole::Mid, transform_at_junction(pair[0], pair[1]), false);
			}

			// The final vertex of each subpath before the last.
			if subpath_index != last_index && segment_count > 0 {
				fire(bindings, visitor, VertexRole::Mid, transform_at_end(subpath.last_segment()), false);
			}
		}
	}

	// End region: the final vertex of the path. On a one-vertex path (a single bare
	// move-to) that vertex already fired `All` in the start region, so only the `End` slot
	// fires here; the counter counts such a path as one vertex.
	let suppress_all = path.vertex_count() == 1;
	fire(bindings, visitor, VertexRole::End, transform_at_end(last_subpath.last_segment()), suppress_all);
}
