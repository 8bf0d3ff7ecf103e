//! Small numerical helpers treated as black boxes by the rest of the crate:
//! a fixed quadrature rule, scalar bisection, and the Debye function.

/// Nodes and weights of the 64-point Gauss-Legendre rule on `[-1, 1]`,
/// listed for the positive half (the rule is symmetric).
///
/// Generated once and hardcoded rather than computed at runtime: the degree
/// is fixed for every caller, so there is no benefit to recomputing it, and
/// the node/weight values are widely tabulated.
const GAUSS_LEGENDRE_64: [(f64, f64); 32] = [
    (0.0243502926634244, 0.0486909570091397),
    (0.0729931217877990, 0.0485754674415034),
    (0.1214628192961206, 0.0483447622348030),
    (0.1696444204239928, 0.0479993885964583),
    (0.2174236437400071, 0.0475401657148303),
    (0.2646871622087674, 0.0469681828162100),
    (0.3113228719902110, 0.0462847965813144),
    (0.3572201583376681, 0.0454916279274181),
    (0.4022701579639916, 0.0445905581637566),
    (0.4463660172534641, 0.0435837245293235),
    (0.4894031457070530, 0.0424735151236536),
    (0.5312794640198946, 0.0412625632426235),
    (0.5718956462026340, 0.0399537411327203),
    (0.6111553551723933, 0.0385501531786156),
    (0.6489654712546573, 0.0370551285402400),
    (0.6852363130542333, 0.0354722132568824),
    (0.7198818501716109, 0.0338051618371416),
    (0.7528199072605319, 0.0320579283548516),
    (0.7839723589433414, 0.0302346570724025),
    (0.8132653151227975, 0.0283396726142595),
    (0.8406292962525803, 0.0263774697150547),
    (0.8659993981540928, 0.0243527025687109),
    (0.8893154459951141, 0.0222701738083833),
    (0.9105221370785028, 0.0201348231535302),
    (0.9295691721319396, 0.0179517157756973),
    (0.9464113748584028, 0.0157260304760247),
    (0.9610087996520538, 0.0134630478967186),
    (0.9733268277899110, 0.0111681394601311),
    (0.9833362538846260, 0.0088467598263639),
    (0.9910133714767443, 0.0065044579689784),
    (0.9963401167719553, 0.0041470332605625),
    (0.9993050417357722, 0.0017832807216964),
];

/// Integrates `f` over `(0, 1)` with a fixed 64-point Gauss-Legendre rule.
/// Used by the BB6/BB7/BB8 `parameters_to_tau` quadratures, whose integrands
/// are smooth on the open interval.
pub fn integrate_unit_interval(mut f: impl FnMut(f64) -> f64) -> f64 {
    let mut sum = 0.0;
    for (node, weight) in GAUSS_LEGENDRE_64 {
        // map node in (-1, 1) onto (0, 1) twice, once per sign, halving the Jacobian
        let x_pos = 0.5 * (node + 1.0);
        let x_neg = 0.5 * (1.0 - node);
        sum += weight * 0.5 * (f(x_pos) + f(x_neg));
    }
    sum
}

/// Integrates `f` over an arbitrary interval `[lo, hi]` by rescaling the
/// fixed 64-point rule used by [`integrate_unit_interval`].
///
/// Used by the elliptical families to accumulate the bivariate normal/t
/// density over a correlation path (`Phi2(h, k, rho) = Phi(h)Phi(k) +
/// integral_0^rho density(h, k, r) dr`), the same Gauss-Legendre machinery
/// the original implementation uses for the Student bivariate CDF.
pub fn integrate_interval(lo: f64, hi: f64, mut f: impl FnMut(f64) -> f64) -> f64 {
    let width = hi - lo;
    if width == 0.0 {
        return 0.0;
    }
    width * integrate_unit_interval(|x| f(lo + width * x))
}

/// Finds a root of `f` on `[lo, hi]` by bisection, assuming `f(lo)` and
/// `f(hi)` have opposite signs. Stops after `max_iter` halvings or once the
/// bracket shrinks below `tol`.
pub fn bisect(mut f: impl FnMut(f64) -> f64, mut lo: f64, mut hi: f64, tol: f64, max_iter: usize) -> f64 {
    let mut f_lo = f(lo);
    for _ in 0..max_iter {
        if (hi - lo).abs() < tol {
            break;
        }
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return mid;
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// The Debye function of order 1, `D_1(x) = (1/x) * integral_0^x t/(e^t - 1) dt`,
/// needed by Frank's `parameters_to_tau`.
///
/// Uses the convergent Bernoulli-number series for small `|x|` and the
/// exponential-tail asymptotic expansion for large `|x|`; no Debye-function
/// crate is available in the ecosystem to depend on instead.
#[must_use]
pub fn debye1(x: f64) -> f64 {
    let x = x.abs();
    if x < 1e-8 {
        1.0 - x / 4.0
    } else if x <= 2.0 * std::f64::consts::PI {
        debye1_series(x)
    } else {
        debye1_asymptotic(x)
    }
}

/// `D1(x) = 1 - x/4 + sum_{k>=1} B_{2k} / (2k+1)! * x^{2k}`, the series
/// obtained by integrating the generating function `t/(e^t-1) = sum B_n t^n / n!`
/// term by term and dividing by `x`.
fn debye1_series(x: f64) -> f64 {
    const BERNOULLI_EVEN: [f64; 7] = [
        1.0 / 6.0,
        -1.0 / 30.0,
        1.0 / 42.0,
        -1.0 / 30.0,
        5.0 / 66.0,
        -691.0 / 2730.0,
        7.0 / 6.0,
    ];
    let mut sum = 1.0 - x / 4.0;
    let mut x_pow = x * x;
    let mut factorial = 6.0_f64; // 3!
    for (k, b2k) in BERNOULLI_EVEN.iter().enumerate() {
        let two_k = 2 * (k + 1);
        let term = b2k * x_pow / factorial;
        sum += term;
        if term.abs() < 1e-16 {
            break;
        }
        x_pow *= x * x;
        factorial *= f64::from(((two_k + 2) * (two_k + 3)) as u32);
    }
    sum
}

/// `D1(x) ~ pi^2/(6x) - sum_{k>=1} e^{-kx}(1 + 1/(kx)) / k^2` for large `x`.
fn debye1_asymptotic(x: f64) -> f64 {
    let mut sum = std::f64::consts::PI * std::f64::consts::PI / (6.0 * x);
    for k in 1..=20u32 {
        let kf = f64::from(k);
        let contribution = (-kf * x).exp() * (1.0 + 1.0 / (kf * x)) / (kf * kf);
        sum -= contribution;
        if contribution.abs() < 1e-16 {
            break;
        }
    }
    sum
}

/// The digamma function `psi(x) = d/dx ln Gamma(x)`, needed by Joe's
/// `parameters_to_tau`. Shifts `x` above 6 with the recurrence
/// `psi(x) = psi(x+1) - 1/x` and applies the standard asymptotic series there.
#[must_use]
pub fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    result + x.ln() - 0.5 * inv
        - inv2 * (1.0 / 12.0 - inv2 * (1.0 / 120.0 - inv2 * (1.0 / 252.0 - inv2 * (1.0 / 240.0 - inv2 / 132.0))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn integrates_constant_one() {
        let area = integrate_unit_interval(|_| 1.0);
        assert_approx_eq!(f64, area, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn integrates_x_squared() {
        let area = integrate_unit_interval(|x| x * x);
        assert_approx_eq!(f64, area, 1.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn bisect_finds_sqrt_two() {
        let root = bisect(|x| x * x - 2.0, 0.0, 2.0, 1e-12, 100);
        assert_approx_eq!(f64, root, std::f64::consts::SQRT_2, epsilon = 1e-9);
    }

    #[test]
    fn debye1_at_zero_is_one() {
        assert_approx_eq!(f64, debye1(1e-9), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn debye1_is_decreasing() {
        assert!(debye1(1.0) > debye1(5.0));
        assert!(debye1(5.0) > debye1(20.0));
    }

    #[test]
    fn debye1_series_and_asymptotic_agree_near_boundary() {
        let boundary = 2.0 * std::f64::consts::PI;
        let from_series = debye1_series(boundary);
        let from_asymptotic = debye1_asymptotic(boundary + 1e-6);
        assert_approx_eq!(f64, from_series, from_asymptotic, epsilon = 1e-3);
    }

    #[test]
    fn digamma_matches_known_value_at_one() {
        // psi(1) = -gamma (Euler-Mascheroni constant)
        assert_approx_eq!(f64, digamma(1.0), -0.5772156649, epsilon = 1e-8);
    }

    #[test]
    fn digamma_satisfies_the_recurrence() {
        let x = 3.7;
        assert_approx_eq!(f64, digamma(x + 1.0), digamma(x) + 1.0 / x, epsilon = 1e-10);
    }
}
