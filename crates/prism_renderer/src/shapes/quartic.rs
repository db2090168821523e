//! Closed-form polynomial root finding up to degree four.
//!
//! The quartic is solved with Ferrari's method: depress it, solve the
//! resolvent cubic (Cardano, or the trigonometric form when all three roots
//! are real), then split into two quadratics. Roots are not sorted and may
//! repeat. Callers that need surface accuracy polish them afterwards.

/// Small discriminants are snapped to zero (tangent case) within this bound.
const PEPS: f64 = 1e-10;

/// A resolvent root this far below zero is rounding noise.
const RESOLVENT_NOISE: f64 = 1e-5;

/// Real roots of a polynomial, stored inline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Roots<const N: usize> {
    values: [f64; N],
    len: usize,
}

impl<const N: usize> Default for Roots<N> {
    fn default() -> Self {
        Self {
            values: [0.0; N],
            len: 0,
        }
    }
}

impl<const N: usize> Roots<N> {
    fn push(&mut self, value: f64) {
        if self.len < N {
            self.values[self.len] = value;
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len]
    }
}

/// Roots of `x^2 + b x + c = 0`.
pub fn solve_quadratic(b: f64, c: f64) -> Roots<2> {
    let mut roots = Roots::default();
    let mut disc = b * b - 4.0 * c;
    if disc < -PEPS {
        return roots;
    }
    if disc < 0.0 {
        disc = 0.0;
    }

    if disc == 0.0 {
        roots.push(-0.5 * b);
        return roots;
    }

    // Avoids cancellation between -b and sqrt(disc)
    let sqrt_disc = disc.sqrt();
    let q = -0.5 * (b + if b > 0.0 { sqrt_disc } else { -sqrt_disc });
    roots.push(q);
    roots.push(c / q);
    roots
}

/// Roots of `x^3 + a x^2 + b x + c = 0`.
pub fn solve_cubic(a: f64, b: f64, c: f64) -> Roots<3> {
    const ONE_THIRD: f64 = 1.0 / 3.0;

    let mut roots = Roots::default();
    let sq_a = a * a;
    let p = b - ONE_THIRD * sq_a;
    let q = a * (2.0 / 27.0 * sq_a - ONE_THIRD * b) + c;
    let cube_p = p * p * p;
    let mut disc = q * q + 4.0 / 27.0 * cube_p;
    if disc.abs() < PEPS {
        disc = 0.0;
    }

    let shift = ONE_THIRD * a;
    if disc > 0.0 {
        let sqrt_disc = disc.sqrt();
        let u = (-0.5 * q + 0.5 * sqrt_disc).cbrt();
        let v = (-0.5 * q - 0.5 * sqrt_disc).cbrt();
        roots.push(u + v - shift);
    } else if disc == 0.0 {
        let u = (-0.5 * q).cbrt();
        roots.push(2.0 * u - shift);
        roots.push(-u - shift);
    } else {
        // Casus irreducibilis: three distinct real roots, largest first
        let acos_arg = (-0.5 * q / (-cube_p / 27.0).sqrt()).clamp(-1.0, 1.0);
        let phi = acos_arg.acos();
        let r = 2.0 * (-p / 3.0).sqrt();
        let tau = 2.0 * std::f64::consts::PI;
        roots.push(r * (phi * ONE_THIRD).cos() - shift);
        roots.push(r * ((phi + tau) * ONE_THIRD).cos() - shift);
        roots.push(r * ((phi + 2.0 * tau) * ONE_THIRD).cos() - shift);
    }
    roots
}

/// Real roots of `c[4] x^4 + c[3] x^3 + c[2] x^2 + c[1] x + c[0] = 0`.
///
/// Returns no roots when the leading coefficient vanishes.
pub fn solve_quartic(c: [f64; 5]) -> Roots<4> {
    let mut roots = Roots::default();
    if c[4].abs() < PEPS {
        return roots;
    }

    let inv = 1.0 / c[4];
    let a = c[3] * inv;
    let b = c[2] * inv;
    let cc = c[1] * inv;
    let d = c[0] * inv;

    // Depressed quartic y^4 + p y^2 + q y + r with x = y - a/4
    let sq_a = a * a;
    let p = -0.375 * sq_a + b;
    let q = 0.125 * sq_a * a - 0.5 * a * b + cc;
    let r = -0.01171875 * sq_a * sq_a + 0.0625 * sq_a * b - 0.25 * a * cc + d;
    let shift = 0.25 * a;

    if q.abs() < PEPS {
        // Biquadratic: solve for y^2
        for &y_sq in solve_quadratic(p, r).as_slice() {
            if y_sq >= 0.0 {
                let y = y_sq.sqrt();
                roots.push(y - shift);
                roots.push(-y - shift);
            }
        }
        return roots;
    }

    // Resolvent cubic z^3 + 2p z^2 + (p^2 - 4r) z - q^2; its first root is
    // the largest real one
    let resolvent = solve_cubic(2.0 * p, p * p - 4.0 * r, -q * q);
    let Some(&first) = resolvent.as_slice().first() else {
        return roots;
    };
    let z = if first < 0.0 && first > -RESOLVENT_NOISE {
        0.0
    } else {
        first
    };
    let sqrt_z = z.max(0.0).sqrt();
    let q_term = if sqrt_z > PEPS { q / sqrt_z } else { 0.0 };

    // (y^2 - sqrt(z) y + r1)(y^2 + sqrt(z) y + r2)
    let r1 = 0.5 * (p + z + q_term);
    let r2 = 0.5 * (p + z - q_term);
    for &y in solve_quadratic(-sqrt_z, r1).as_slice() {
        roots.push(y - shift);
    }
    for &y in solve_quadratic(sqrt_z, r2).as_slice() {
        roots.push(y - shift);
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut v = values.to_vec();
        v.sort_by(f64::total_cmp);
        v
    }

    fn assert_roots(found: &[f64], expected: &[f64], eps: f64) {
        let found = sorted(found);
        assert_eq!(found.len(), expected.len(), "roots: {found:?}");
        for (f, e) in found.iter().zip(expected) {
            assert!((f - e).abs() < eps, "{found:?} != {expected:?}");
        }
    }

    /// Coefficients (low to high) of the monic polynomial with the given roots.
    fn poly_from_roots(r: [f64; 4]) -> [f64; 5] {
        // Multiply by (x - root) one factor at a time, c[i] is the x^i term
        let mut coeffs = vec![1.0];
        for root in r {
            let mut next = vec![0.0; coeffs.len() + 1];
            for (i, &k) in coeffs.iter().enumerate() {
                next[i + 1] += k;
                next[i] -= k * root;
            }
            coeffs = next;
        }
        let mut c = [0.0; 5];
        c.copy_from_slice(&coeffs);
        c
    }

    #[test]
    fn test_quadratic() {
        assert_roots(solve_quadratic(-3.0, 2.0).as_slice(), &[1.0, 2.0], 1e-12);
        assert_roots(solve_quadratic(-2.0, 1.0).as_slice(), &[1.0], 1e-12);
        assert!(solve_quadratic(0.0, 1.0).is_empty());
    }

    #[test]
    fn test_cubic_one_real_root() {
        // (x - 2)(x^2 + 1) = x^3 - 2x^2 + x - 2
        assert_roots(solve_cubic(-2.0, 1.0, -2.0).as_slice(), &[2.0], 1e-9);
    }

    #[test]
    fn test_cubic_three_real_roots() {
        // (x - 1)(x - 2)(x - 3) = x^3 - 6x^2 + 11x - 6
        let roots = solve_cubic(-6.0, 11.0, -6.0);
        assert_roots(roots.as_slice(), &[1.0, 2.0, 3.0], 1e-9);
        // Largest root comes first
        assert!((roots.as_slice()[0] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_biquadratic_quartic() {
        let c = poly_from_roots([2.5, 3.5, 6.5, 7.5]);
        assert_roots(solve_quartic(c).as_slice(), &[2.5, 3.5, 6.5, 7.5], 1e-9);
    }

    #[test]
    fn test_general_quartic() {
        let c = poly_from_roots([-1.0, 0.5, 2.0, 4.0]);
        assert_roots(solve_quartic(c).as_slice(), &[-1.0, 0.5, 2.0, 4.0], 1e-6);
    }

    #[test]
    fn test_quartic_with_two_real_roots() {
        // (x - 1)(x - 3)(x^2 + 1)
        let c = [3.0, -4.0, 4.0, -4.0, 1.0];
        assert_roots(solve_quartic(c).as_slice(), &[1.0, 3.0], 1e-6);
    }

    #[test]
    fn test_quartic_without_real_roots() {
        // x^4 + 1
        assert!(solve_quartic([1.0, 0.0, 0.0, 0.0, 1.0]).is_empty());
    }

    #[test]
    fn test_degenerate_leading_coefficient() {
        assert!(solve_quartic([1.0, 2.0, 3.0, 4.0, 0.0]).is_empty());
    }
}
