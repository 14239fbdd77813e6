use crate::marker::{oriented_placement, MarkerDefinition, MarkerItem, MarkerSlot, RenderKey, VertexRole};
use crate::misc::union_bounds;
use crate::path::Path;
use crate::walk::{walk_markers, MarkerVisitor};

use glam::{DAffine2, DVec2};
use std::sync::Arc;

/// The four marker slots of one shape.
///
/// Slots hold shared references to externally owned marker definitions; an unused slot is
/// `None`. The bindings are rebuilt by the owner whenever its style's marker references
/// change, via [`MarkerBindings::rebind`].
#[derive(Clone, Default)]
pub struct MarkerBindings {
	markers: [Option<Arc<dyn MarkerDefinition>>; MarkerSlot::COUNT],
}

impl MarkerBindings {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace one slot's binding, returning the previous one so the caller can release it.
	pub fn rebind(&mut self, slot: MarkerSlot, marker: Option<Arc<dyn MarkerDefinition>>) -> Option<Arc<dyn MarkerDefinition>> {
		std::mem::replace(&mut self.markers[slot.index()], marker)
	}

	pub fn marker(&self, slot: MarkerSlot) -> Option<&Arc<dyn MarkerDefinition>> {
		self.markers[slot.index()].as_ref()
	}

	pub fn is_empty(&self) -> bool {
		self.markers.iter().all(Option::is_none)
	}

	/// Whether the owning shape renders any markers at all.
	///
	/// `inside_marker` is threaded down by the caller from its document traversal: a shape
	/// used as the content of a marker definition never renders markers of its own, which
	/// keeps marker rendering from recursing.
	pub fn has_markers(&self, path: &Path, inside_marker: bool) -> bool {
		!inside_marker && !path.is_empty() && !self.is_empty()
	}

	/// The number of marker instances each slot renders for `path`, indexed by
	/// [`MarkerSlot::index`]. Zero for unpopulated slots and for an empty path.
	///
	/// The placement walk emits exactly these numbers of instances per slot, which lets the
	/// rendering container pre-allocate instance storage via
	/// [`MarkerBindings::dimension_views`] before [`MarkerBindings::update_views`] runs.
	pub fn instance_counts(&self, path: &Path) -> [usize; MarkerSlot::COUNT] {
		let mut counts = [0; MarkerSlot::COUNT];
		if path.is_empty() {
			return counts;
		}
		let vertex_count = path.vertex_count();
		for slot in MarkerSlot::SLOTS {
			if self.marker(slot).is_none() {
				continue;
			}
			counts[slot.index()] = match slot {
				MarkerSlot::All => vertex_count,
				// One start marker at the first subpath's first vertex, one end marker at
				// the last subpath's last vertex.
				MarkerSlot::Start | MarkerSlot::End => 1,
				// Every vertex except the path's start and end. A one-vertex path has
				// neither interior vertices nor a negative count.
				MarkerSlot::Mid => vertex_count.saturating_sub(2),
			};
		}
		counts
	}

	/// Declare the per-slot instance counts to each bound marker's rendering container.
	/// Must run before [`MarkerBindings::update_views`] for the same render context.
	pub fn dimension_views(&self, path: &Path, key_base: RenderKey) {
		let counts = self.instance_counts(path);
		for slot in MarkerSlot::SLOTS {
			if let Some(marker) = self.marker(slot) {
				marker.show_dimension(key_base.for_slot(slot), counts[slot.index()]);
			}
		}
	}

	/// Position every marker instance for `path`: the instance-emission walk.
	///
	/// Each emission carries the slot's render key, a per-slot index counting up from zero
	/// in traversal order, the fully adjusted placement transform, and the stroke width for
	/// any remaining stroke-relative work in the renderer.
	pub fn update_views(&self, path: &Path, key_base: RenderKey, stroke_width: f64) {
		let mut emitter = InstanceEmitter {
			key_base,
			stroke_width,
			indices: [0; MarkerSlot::COUNT],
		};
		walk_markers(path, self, &mut emitter);
	}

	/// Release every marker instance previously shown for this render context.
	pub fn hide_views(&self, key_base: RenderKey) {
		for slot in MarkerSlot::SLOTS {
			if let Some(marker) = self.marker(slot) {
				marker.hide(key_base.for_slot(slot));
			}
		}
	}

	/// The union of the visual bounds of every marker instance on `path`, in the space
	/// `to_world` maps the shape into. Markers without renderable content contribute
	/// nothing; `None` when nothing contributes at all.
	pub fn visual_bounds(&self, path: &Path, to_world: DAffine2, stroke_width: f64) -> Option<[DVec2; 2]> {
		let mut accumulator = BoundsAccumulator {
			to_world,
			stroke_width,
			bounds: None,
		};
		walk_markers(path, self, &mut accumulator);
		accumulator.bounds
	}

	/// Invoke `emit` once per marker instance with renderable content, passing the marker's
	/// first child and its fully composed transform (orientation, units scaling, the
	/// marker's child-to-parent transform, and the child's own transform). The closure
	/// carries whatever print context the caller is driving; no instance bookkeeping is
	/// involved.
	pub fn print(&self, path: &Path, stroke_width: f64, mut emit: impl FnMut(&dyn MarkerItem, DAffine2)) {
		let mut printer = PrintEmitter { stroke_width, emit: &mut emit };
		walk_markers(path, self, &mut printer);
	}
}

impl std::fmt::Debug for MarkerBindings {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let populated: Vec<MarkerSlot> = MarkerSlot::SLOTS.into_iter().filter(|&slot| self.marker(slot).is_some()).collect();
		f.debug_struct("MarkerBindings").field("populated", &populated).finish()
	}
}

struct InstanceEmitter {
	key_base: RenderKey,
	stroke_width: f64,
	indices: [usize; MarkerSlot::COUNT],
}

impl MarkerVisitor for InstanceEmitter {
	fn visit(&mut self, slot: MarkerSlot, marker: &dyn MarkerDefinition, role: VertexRole, base: DAffine2) {
		let placement = oriented_placement(base, role, marker, self.stroke_width);
		let index = self.indices[slot.index()];
		self.indices[slot.index()] += 1;
		marker.show_instance(self.key_base.for_slot(slot), index, placement, self.stroke_width);
	}
}

struct BoundsAccumulator {
	to_world: DAffine2,
	stroke_width: f64,
	bounds: Option<[DVec2; 2]>,
}

impl MarkerVisitor for BoundsAccumulator {
	fn visit(&mut self, _slot: MarkerSlot, marker: &dyn MarkerDefinition, role: VertexRole, base: DAffine2) {
		let Some(child) = marker.first_child() else { return };
		let placement = oriented_placement(base, role, marker, self.stroke_width);
		let transform = self.to_world * placement * marker.marker_transform() * child.transform();
		if let Some(child_bounds) = child.visual_bounds(transform) {
			self.bounds = Some(match self.bounds {
				Some(bounds) => union_bounds(bounds, child_bounds),
				None => child_bounds,
			});
		}
	}
}

struct PrintEmitter<'a, F: FnMut(&dyn MarkerItem, DAffine2)> {
	stroke_width: f64,
	emit: &'a mut F,
}

impl<F: FnMut(&dyn MarkerItem, DAffine2)> MarkerVisitor for PrintEmitter<'_, F> {
	fn visit(&mut self, _slot: MarkerSlot, marker: &dyn MarkerDefinition, role: VertexRole, base: DAffine2) {
		let Some(child) = marker.first_child() else { return };
		let placement = oriented_placement(base, role, marker, self.stroke_width);
		(self.emit)(child, placement * marker.marker_transform() * child.transform());
	}
}
