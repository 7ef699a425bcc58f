//! Quadrature rules on the unit interval and the reference triangle

/// Four-point Gauss-Legendre rule on [0, 1], exact to degree 7
pub fn gauss_legendre_4() -> [(f64, f64); 4] {
    let a = 0.339_981_043_584_856_3;
    let b = 0.861_136_311_594_052_6;
    let wa = 0.652_145_154_862_546_1;
    let wb = 0.347_854_845_137_453_9;
    [
        (0.5 * (1.0 - b), 0.5 * wb),
        (0.5 * (1.0 - a), 0.5 * wa),
        (0.5 * (1.0 + a), 0.5 * wa),
        (0.5 * (1.0 + b), 0.5 * wb),
    ]
}

/// Seven-point rule on the reference triangle `{ξ1, ξ2 ≥ 0, ξ1 + ξ2 ≤ 1}`,
/// exact to degree 5. Returns `(ξ1, ξ2, weight)`; the weights sum to 1/2.
pub fn triangle_7() -> [(f64, f64, f64); 7] {
    let a1 = 0.059_715_871_789_769_8;
    let b1 = 0.470_142_064_105_115_1;
    let w1 = 0.132_394_152_788_506_2;
    let a2 = 0.797_426_985_353_087_3;
    let b2 = 0.101_286_507_323_456_3;
    let w2 = 0.125_939_180_544_827_2;
    let third = 1.0 / 3.0;
    [
        (third, third, 0.5 * 0.225),
        (b1, b1, 0.5 * w1),
        (a1, b1, 0.5 * w1),
        (b1, a1, 0.5 * w1),
        (b2, b2, 0.5 * w2),
        (a2, b2, 0.5 * w2),
        (b2, a2, 0.5 * w2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gauss_integrates_degree_seven() {
        let integral: f64 = gauss_legendre_4().iter().map(|(t, w)| w * t.powi(7)).sum();
        assert_relative_eq!(integral, 1.0 / 8.0, epsilon = 1e-14);
    }

    #[test]
    fn test_triangle_rule() {
        let rule = triangle_7();
        let area: f64 = rule.iter().map(|(_, _, w)| w).sum();
        assert_relative_eq!(area, 0.5, epsilon = 1e-12);
        // ∫ ξ1^2 ξ2^2 over the reference triangle = 2! 2! / 6! = 1/180
        let moment: f64 = rule.iter().map(|(x, y, w)| w * x * x * y * y).sum();
        assert_relative_eq!(moment, 1.0 / 180.0, epsilon = 1e-10);
    }
}
