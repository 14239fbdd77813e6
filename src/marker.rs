use glam::{DAffine2, DVec2};
use std::f64::consts::PI;

/// One of the four marker positions a shape can bind independently.
///
/// `All` applies to every vertex of the path; the other three apply only to vertices in
/// the matching positional role. A vertex therefore renders up to two stacked instances:
/// its positional slot and `All`. The discriminant doubles as the slot's render-key offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerSlot {
	All = 0,
	Start = 1,
	Mid = 2,
	End = 3,
}

#[cfg(feature = "dyn-any")]
unsafe impl dyn_any::StaticType for MarkerSlot {
	type Static = MarkerSlot;
}

impl MarkerSlot {
	pub const COUNT: usize = 4;
	pub const SLOTS: [MarkerSlot; 4] = [MarkerSlot::All, MarkerSlot::Start, MarkerSlot::Mid, MarkerSlot::End];

	pub fn index(self) -> usize {
		self as usize
	}
}

/// The positional category of a path vertex: the path's first vertex, its last vertex, or
/// any vertex in between. The `All` slot borrows the orientation rule of whichever role
/// applies at the vertex it fires on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VertexRole {
	Start,
	Mid,
	End,
}

impl VertexRole {
	/// The positional slot that fires at a vertex of this role, alongside [`MarkerSlot::All`].
	pub fn slot(self) -> MarkerSlot {
		match self {
			VertexRole::Start => MarkerSlot::Start,
			VertexRole::Mid => MarkerSlot::Mid,
			VertexRole::End => MarkerSlot::End,
		}
	}
}

/// How a marker instance is rotated at its vertex.
///
/// As defined in SVG: <https://www.w3.org/TR/SVG2/painting.html#OrientAttribute>.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerOrient {
	/// A fixed angle in degrees, ignoring the path's direction.
	Angle(f64),
	/// Align to the local path tangent (the angle bisector at a junction).
	Auto,
	/// Align to the local path tangent, rotated a further 180° when placed as a start marker.
	AutoStartReverse,
}

impl Default for MarkerOrient {
	fn default() -> Self {
		MarkerOrient::Angle(0.)
	}
}

#[cfg(feature = "dyn-any")]
unsafe impl dyn_any::StaticType for MarkerOrient {
	type Static = MarkerOrient;
}

/// The coordinate system a marker's contents are expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerUnits {
	/// Marker space is multiplied by the stroke width, so the marker scales with the stroke.
	#[default]
	StrokeWidth,
	/// Marker space maps directly to the shape's user space.
	UserSpaceOnUse,
}

#[cfg(feature = "dyn-any")]
unsafe impl dyn_any::StaticType for MarkerUnits {
	type Static = MarkerUnits;
}

/// Identifies one display context's storage for marker instances in the external rendering
/// container. The four slots of one shape share a base key, disambiguated by the slot's
/// fixed offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderKey(pub usize);

impl RenderKey {
	pub fn for_slot(self, slot: MarkerSlot) -> RenderKey {
		RenderKey(self.0 + slot.index())
	}
}

/// A marker element, owned and reference-counted by the surrounding document. This
/// subsystem only reads its configuration and drives its positioned instances; it never
/// constructs or destroys one.
pub trait MarkerDefinition {
	fn orient(&self) -> MarkerOrient;
	fn units(&self) -> MarkerUnits;
	/// The marker element's own child-to-parent transform (reference point offset and
	/// viewBox scaling), applied between the placement transform and the marker's contents.
	fn marker_transform(&self) -> DAffine2;
	/// The first renderable child of the marker element, if any.
	fn first_child(&self) -> Option<&dyn MarkerItem>;

	/// Declare how many instances the given render context must store for this marker.
	/// Called before any [`MarkerDefinition::show_instance`] with an index below `count`.
	fn show_dimension(&self, key: RenderKey, count: usize);
	/// Position instance `index` of the given render context.
	fn show_instance(&self, key: RenderKey, index: usize, transform: DAffine2, stroke_width: f64);
	/// Release every instance held for the given render context.
	fn hide(&self, key: RenderKey);
}

/// The renderable content of a marker, exposing what the bounding-box and print consumers
/// need from it.
pub trait MarkerItem {
	/// The child's own local transform, the final multiplicand of the total instance transform.
	fn transform(&self) -> DAffine2;
	/// The child's visual bounds under `transform`, as `[min, max]` corners, or `None` when
	/// it has no renderable extent.
	fn visual_bounds(&self, transform: DAffine2) -> Option<[DVec2; 2]>;
}

/// Adjust a vertex placement transform for one marker definition: the start-reverse flip,
/// the fixed-angle override, and stroke-width units scaling.
///
/// `base` is the tangent-derived transform from the orientation calculator. The reversal
/// applies only when the marker fires in the `Start` role; a fixed angle replaces the
/// rotation while keeping the anchor point; stroke-width units prepend a uniform scale in
/// marker space.
pub fn oriented_placement(base: DAffine2, role: VertexRole, marker: &dyn MarkerDefinition, stroke_width: f64) -> DAffine2 {
	let mut placement = base;
	match marker.orient() {
		MarkerOrient::Auto => {}
		MarkerOrient::AutoStartReverse => {
			if role == VertexRole::Start {
				placement = base * DAffine2::from_angle(PI);
			}
		}
		MarkerOrient::Angle(degrees) => {
			placement = DAffine2::from_angle_translation(degrees.to_radians(), base.translation);
		}
	}
	if marker.units() == MarkerUnits::StrokeWidth {
		placement *= DAffine2::from_scale(DVec2::splat(stroke_width));
	}
	placement
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Definition {
		orient: MarkerOrient,
		units: MarkerUnits,
	}

	impl MarkerDefinition for Definition {
		fn orient(&self) -> MarkerOrient {
			self.orient
		}
		fn units(&self) -> MarkerUnits {
			self.units
		}
		fn marker_transform(&self) -> DAffine2 {
			DAffine2::IDENTITY
		}
		fn first_child(&self) -> Option<&dyn MarkerItem> {
			None
		}
		fn show_dimension(&self, _: RenderKey, _: usize) {}
		fn show_instance(&self, _: RenderKey, _: usize, _: DAffine2, _: f64) {}
		fn hide(&self, _: RenderKey) {}
	}

	fn rotation_angle(transform: DAffine2) -> f64 {
		transform.transform_vector2(DVec2::X).to_angle()
	}

	#[test]
	fn start_reverse_flips_only_the_start_role() {
		let marker = Definition {
			orient: MarkerOrient::AutoStartReverse,
			units: MarkerUnits::UserSpaceOnUse,
		};
		let base = DAffine2::from_angle_translation(PI / 6., DVec2::new(5., -1.));

		let reversed = oriented_placement(base, VertexRole::Start, &marker, 1.);
		assert!((rotation_angle(reversed) - (PI / 6. - PI)).abs() < 1e-12);
		assert!(reversed.translation.abs_diff_eq(DVec2::new(5., -1.), 1e-12));

		for role in [VertexRole::Mid, VertexRole::End] {
			let unchanged = oriented_placement(base, role, &marker, 1.);
			assert!((rotation_angle(unchanged) - PI / 6.).abs() < 1e-12);
		}
	}

	#[test]
	fn fixed_angle_overrides_rotation_but_keeps_the_anchor() {
		let marker = Definition {
			orient: MarkerOrient::Angle(90.),
			units: MarkerUnits::UserSpaceOnUse,
		};
		let base = DAffine2::from_angle_translation(PI / 5., DVec2::new(2., 3.));
		let placement = oriented_placement(base, VertexRole::Mid, &marker, 7.);
		assert!((rotation_angle(placement) - PI / 2.).abs() < 1e-12);
		assert!(placement.translation.abs_diff_eq(DVec2::new(2., 3.), 1e-12));
	}

	#[test]
	fn stroke_width_units_scale_marker_space() {
		let marker = Definition {
			orient: MarkerOrient::Auto,
			units: MarkerUnits::StrokeWidth,
		};
		let base = DAffine2::from_angle_translation(0., DVec2::new(1., 1.));
		let placement = oriented_placement(base, VertexRole::Mid, &marker, 3.);
		// The anchor stays put while distances in marker space triple.
		assert!(placement.transform_point2(DVec2::ZERO).abs_diff_eq(DVec2::new(1., 1.), 1e-12));
		assert!((placement.transform_vector2(DVec2::X).length() - 3.).abs() < 1e-12);
	}
}
