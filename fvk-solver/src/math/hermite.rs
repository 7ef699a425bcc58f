//! One-dimensional Hermite bases on [0, 1]
//!
//! Quintic ordering follows the edge data layout used throughout the crate:
//! `[value(0), slope(0), second(0), second(1), slope(1), value(1)]`.
//! Cubic ordering is `[value(0), slope(0), slope(1), value(1)]`.

use nalgebra::SMatrix;

use super::quadrature::gauss_legendre_4;

/// Cubic Hermite basis values
pub fn cubic(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        2.0 * t3 - 3.0 * t2 + 1.0,
        t3 - 2.0 * t2 + t,
        t3 - t2,
        -2.0 * t3 + 3.0 * t2,
    ]
}

/// First derivatives of the cubic Hermite basis
pub fn cubic_d1(t: f64) -> [f64; 4] {
    let t2 = t * t;
    [
        6.0 * t2 - 6.0 * t,
        3.0 * t2 - 4.0 * t + 1.0,
        3.0 * t2 - 2.0 * t,
        -6.0 * t2 + 6.0 * t,
    ]
}

/// Quintic Hermite basis values
pub fn quintic(t: f64) -> [f64; 6] {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;
    [
        1.0 - 10.0 * t3 + 15.0 * t4 - 6.0 * t5,
        t - 6.0 * t3 + 8.0 * t4 - 3.0 * t5,
        0.5 * t2 - 1.5 * t3 + 1.5 * t4 - 0.5 * t5,
        0.5 * t3 - t4 + 0.5 * t5,
        -4.0 * t3 + 7.0 * t4 - 3.0 * t5,
        10.0 * t3 - 15.0 * t4 + 6.0 * t5,
    ]
}

/// First derivatives of the quintic Hermite basis
pub fn quintic_d1(t: f64) -> [f64; 6] {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    [
        -30.0 * t2 + 60.0 * t3 - 30.0 * t4,
        1.0 - 18.0 * t2 + 32.0 * t3 - 15.0 * t4,
        t - 4.5 * t2 + 6.0 * t3 - 2.5 * t4,
        1.5 * t2 - 4.0 * t3 + 2.5 * t4,
        -12.0 * t2 + 28.0 * t3 - 15.0 * t4,
        30.0 * t2 - 60.0 * t3 + 30.0 * t4,
    ]
}

/// Second derivatives of the quintic Hermite basis
pub fn quintic_d2(t: f64) -> [f64; 6] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        -60.0 * t + 180.0 * t2 - 120.0 * t3,
        -36.0 * t + 96.0 * t2 - 60.0 * t3,
        1.0 - 9.0 * t + 18.0 * t2 - 10.0 * t3,
        3.0 * t - 12.0 * t2 + 10.0 * t3,
        -24.0 * t + 84.0 * t2 - 60.0 * t3,
        60.0 * t - 180.0 * t2 + 120.0 * t3,
    ]
}

/// Gram matrix of quintic second derivatives, `G[i][j] = ∫₀¹ H_i'' H_j'' dt`
///
/// The integrand is a degree-6 polynomial so four Gauss points are exact.
pub fn quintic_bending_gram() -> SMatrix<f64, 6, 6> {
    let mut gram = SMatrix::<f64, 6, 6>::zeros();
    for (t, w) in gauss_legendre_4() {
        let d2 = quintic_d2(t);
        for i in 0..6 {
            for j in 0..6 {
                gram[(i, j)] += w * d2[i] * d2[j];
            }
        }
    }
    gram
}
