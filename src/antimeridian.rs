/// Antimeridian splitting for cell boundary rings
///
/// A cell boundary is a closed loop of `(lng, lat)` vertices with longitudes
/// in [-180, 180]. When a cell straddles the ±180° line the naive planar ring
/// jumps across the whole map, so it is cut at the line into pieces that each
/// stay on one side.

use glam::DVec2;

use crate::constants::{ANTIMERIDIAN_LNG, FULL_TURN_DEG, POLE_LAT};

/// A ring of `(lng, lat)` vertices in degrees
pub type Ring = Vec<(f64, f64)>;

fn side(lng: f64) -> f64 {
    if lng < 0.0 { -1.0 } else { 1.0 }
}

fn on_antimeridian(lng: f64) -> bool {
    lng.abs() == ANTIMERIDIAN_LNG
}

fn crosses(a: DVec2, b: DVec2) -> bool {
    (b.x - a.x).abs() > ANTIMERIDIAN_LNG
}

/// Latitude at which the edge `a -> b` meets the antimeridian
fn crossing_lat(a: DVec2, b: DVec2) -> f64 {
    let s = side(a.x);
    let b_unwrapped = DVec2::new(b.x + FULL_TURN_DEG * s, b.y);
    let t = (ANTIMERIDIAN_LNG * s - a.x) / (b_unwrapped.x - a.x);
    a.lerp(b_unwrapped, t).y
}

fn close(mut ring: Ring) -> Ring {
    if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}

/// Move vertices lying exactly on ±180° to the side of their nearest
/// off-line neighbour, so touching the line never counts as crossing it.
///
/// Returns `false` when every vertex is on the line.
fn snap_line_vertices(points: &mut [DVec2]) -> bool {
    let n = points.len();
    let sides: Vec<Option<f64>> = points
        .iter()
        .map(|p| (!on_antimeridian(p.x)).then(|| side(p.x)))
        .collect();

    if sides.iter().all(Option::is_none) {
        return false;
    }

    for i in 0..n {
        if sides[i].is_some() {
            continue;
        }
        let nearest = (1..n).find_map(|step| sides[(i + n - step) % n].or(sides[(i + step) % n]));
        if let Some(s) = nearest {
            points[i].x = ANTIMERIDIAN_LNG * s;
        }
    }
    true
}

/// Split a cell boundary ring at the antimeridian.
///
/// A ring that does not cross ±180° comes back as a single closed ring with
/// the same vertices. A crossing ring comes back as one closed ring per
/// contiguous run of vertices on one side, each bounded by vertices on the
/// line at the interpolated crossing latitudes. A ring that crosses an odd
/// number of times encloses a pole and is capped along that pole's latitude.
pub fn split(ring: &[(f64, f64)]) -> Vec<Ring> {
    let mut points: Vec<DVec2> = ring.iter().map(|&(lng, lat)| DVec2::new(lng, lat)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.is_empty() {
        return Vec::new();
    }

    let n = points.len();
    if n < 3 || !snap_line_vertices(&mut points) {
        return vec![close(ring.to_vec())];
    }

    let crossings: Vec<usize> = (0..n)
        .filter(|&i| crosses(points[i], points[(i + 1) % n]))
        .collect();

    if crossings.is_empty() {
        return vec![close(points.iter().map(|p| (p.x, p.y)).collect())];
    }

    // Walk the ring starting just after the first crossing so each piece
    // opens and closes on the line.
    let first = crossings[0];
    let start = (first + 1) % n;
    let entry_lat = crossing_lat(points[first], points[start]);

    let mut pieces: Vec<Ring> = Vec::with_capacity(crossings.len());
    let mut piece: Ring = vec![(ANTIMERIDIAN_LNG * side(points[start].x), entry_lat)];

    for k in 0..n {
        let i = (start + k) % n;
        let j = (i + 1) % n;
        let (a, b) = (points[i], points[j]);
        piece.push((a.x, a.y));

        if crosses(a, b) {
            let lat = crossing_lat(a, b);
            piece.push((ANTIMERIDIAN_LNG * side(a.x), lat));
            pieces.push(std::mem::take(&mut piece));
            piece.push((ANTIMERIDIAN_LNG * side(b.x), lat));
        }
    }

    if crossings.len() % 2 == 1 {
        let mean_lat = points.iter().map(|p| p.y).sum::<f64>() / n as f64;
        let pole_lat = POLE_LAT * side(mean_lat);
        for piece in pieces.iter_mut() {
            cap_at_pole(piece, pole_lat);
        }
    }

    pieces.into_iter().map(close).collect()
}

/// Close a piece that enters and leaves on opposite sides of the line by
/// running along the pole latitude between them.
fn cap_at_pole(piece: &mut Ring, pole_lat: f64) {
    let (Some(&(entry_lng, _)), Some(&(exit_lng, _))) = (piece.first(), piece.last()) else {
        return;
    };
    if side(entry_lng) != side(exit_lng) {
        piece.push((exit_lng, pole_lat));
        piece.push((entry_lng, pole_lat));
    }
}
