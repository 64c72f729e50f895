use std::f64::consts::TAU;

/// Convert (theta, phi) in radians to a unit vector `[x, y, z]`.
///
/// `theta` is the colatitude measured from the north pole, `phi` the
/// longitude measured eastward from the x axis.
pub fn ang2vec(theta: f64, phi: f64) -> [f64; 3] {
    let sin_theta = theta.sin();
    [sin_theta * phi.cos(), sin_theta * phi.sin(), theta.cos()]
}

/// Convert a (not necessarily normalized) vector to (theta, phi) in radians.
/// `theta` is in `[0, pi]`, `phi` is in `[0, 2*pi)`.
pub fn vec2ang(v: [f64; 3]) -> (f64, f64) {
    let theta = f64::atan2(v[0].hypot(v[1]), v[2]);
    let mut phi = f64::atan2(v[1], v[0]);
    if phi < 0.0 {
        phi += TAU;
    }
    if phi >= TAU {
        phi -= TAU;
    }
    (theta, phi)
}

/// Scale a vector to unit length. Returns `None` for the zero vector.
pub fn normalize(v: [f64; 3]) -> Option<[f64; 3]> {
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    let inv = 1.0 / norm;
    Some([v[0] * inv, v[1] * inv, v[2] * inv])
}

/// Great-circle angular distance between two unit vectors, in radians.
///
/// Uses the atan2 form, which stays accurate for nearly coincident and
/// nearly antipodal points.
pub fn angular_distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    let cx = a[1] * b[2] - a[2] * b[1];
    let cy = a[2] * b[0] - a[0] * b[2];
    let cz = a[0] * b[1] - a[1] * b[0];
    f64::atan2((cx * cx + cy * cy + cz * cz).sqrt(), dot)
}
