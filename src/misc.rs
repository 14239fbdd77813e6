use glam::DVec2;

pub fn point_to_dvec2(point: kurbo::Point) -> DVec2 {
	DVec2 { x: point.x, y: point.y }
}

pub fn dvec2_to_point(value: DVec2) -> kurbo::Point {
	kurbo::Point { x: value.x, y: value.y }
}

/// The smallest axis-aligned box enclosing both boxes, each given as `[min, max]` corners.
pub fn union_bounds(a: [DVec2; 2], b: [DVec2; 2]) -> [DVec2; 2] {
	[a[0].min(b[0]), a[1].max(b[1])]
}
