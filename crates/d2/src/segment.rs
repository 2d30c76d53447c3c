//! Selection of the reference flight segment.
//!
//! Each trajectory leg is clipped to the generation area; the leg with the
//! longest portion inside the area becomes the segment candidates are
//! generated around.

use obstacle_search_core::{Error, FlightSegment, GenerationArea, Point2D, Result};

/// Clips a segment to the area (Liang–Barsky).
///
/// Returns the portion of the segment inside the area, or None when the
/// segment misses it or only touches it in a single point.
pub fn clip_segment(area: &GenerationArea, segment: &FlightSegment) -> Option<FlightSegment> {
    let (x0, y0) = (segment.start.x, segment.start.y);
    let dx = segment.end.x - x0;
    let dy = segment.end.y - y0;

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    // (p, q) pairs for the left, right, bottom and top edges.
    let edges = [
        (-dx, x0 - area.min.x),
        (dx, area.max.x - x0),
        (-dy, y0 - area.min.y),
        (dy, area.max.y - y0),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            // Parallel to this edge: reject if outside it.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    if t1 <= t0 {
        return None;
    }

    Some(FlightSegment::new(
        Point2D::new(x0 + t0 * dx, y0 + t0 * dy),
        Point2D::new(x0 + t1 * dx, y0 + t1 * dy),
    ))
}

/// Picks the trajectory leg with the longest clipped length inside the area.
///
/// Returns the clipped portion. Ties keep the earlier leg.
pub fn select_flight_segment(
    area: &GenerationArea,
    segments: &[FlightSegment],
) -> Result<FlightSegment> {
    let mut best: Option<(FlightSegment, f64)> = None;

    for segment in segments {
        let Some(clipped) = clip_segment(area, segment) else {
            continue;
        };
        let length = clipped.length();
        if length > best.map_or(0.0, |(_, l)| l) {
            best = Some((clipped, length));
        }
    }

    best.map(|(segment, _)| segment).ok_or(Error::NoFlightSegment)
}
