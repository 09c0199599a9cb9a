//! Gaussian-process surrogate and acquisition for Bayesian search.
//!
//! The surrogate always operates on the continuous relaxation of the
//! parameter space, normalized to the unit cube; discrete domains are
//! projected back only when a proposal is turned into a configuration.

/// Gaussian process with an RBF kernel and fixed hyperparameters.
///
/// Inputs are points of the unit cube; observations are centered on their
/// mean before fitting. Small tuning budgets keep the Gram matrix tiny, so a
/// dense Cholesky factorization is all that is needed.
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    inputs: Vec<Vec<f64>>,
    observation_mean: f64,
    length_scale: f64,
    chol: Vec<Vec<f64>>,
    alpha: Vec<f64>,
}

impl GaussianProcess {
    pub const DEFAULT_LENGTH_SCALE: f64 = 0.2;
    pub const DEFAULT_NOISE: f64 = 1e-6;

    /// Fit on observed (input, objective) pairs.
    ///
    /// Returns `None` if the Gram matrix cannot be factorized even after
    /// escalating the noise jitter (e.g. many duplicated inputs).
    pub fn fit(inputs: Vec<Vec<f64>>, observations: &[f64], length_scale: f64, noise: f64) -> Option<Self> {
        debug_assert_eq!(inputs.len(), observations.len());
        if inputs.is_empty() {
            return None;
        }

        let n = inputs.len();
        let observation_mean = observations.iter().sum::<f64>() / n as f64;
        let centered: Vec<f64> = observations.iter().map(|y| y - observation_mean).collect();

        let mut jitter = noise;
        let mut factorization = None;
        for _ in 0..5 {
            let mut gram = vec![vec![0.0; n]; n];
            for i in 0..n {
                for j in 0..=i {
                    let k = rbf(&inputs[i], &inputs[j], length_scale);
                    gram[i][j] = k;
                    gram[j][i] = k;
                }
                gram[i][i] += jitter;
            }
            if let Some(chol) = cholesky(&gram) {
                let alpha = solve_cholesky(&chol, &centered);
                factorization = Some((chol, alpha));
                break;
            }
            jitter *= 100.0;
        }

        let (chol, alpha) = factorization?;
        Some(Self {
            inputs,
            observation_mean,
            length_scale,
            chol,
            alpha,
        })
    }

    /// Posterior predictive mean and standard deviation at `point`.
    pub fn predict(&self, point: &[f64]) -> (f64, f64) {
        let k_star: Vec<f64> = self
            .inputs
            .iter()
            .map(|x| rbf(x, point, self.length_scale))
            .collect();

        let mean = self.observation_mean
            + k_star.iter().zip(&self.alpha).map(|(k, a)| k * a).sum::<f64>();

        let v = solve_lower(&self.chol, &k_star);
        let prior_variance = rbf(point, point, self.length_scale);
        let variance = (prior_variance - v.iter().map(|x| x * x).sum::<f64>()).max(0.0);
        (mean, variance.sqrt())
    }

    /// Upper confidence bound acquisition: `mean + kappa * std`.
    pub fn upper_confidence_bound(&self, point: &[f64], kappa: f64) -> f64 {
        let (mean, std) = self.predict(point);
        mean + kappa * std
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

fn rbf(a: &[f64], b: &[f64], length_scale: f64) -> f64 {
    let sq_dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    (-0.5 * sq_dist / (length_scale * length_scale)).exp()
}

/// Lower-triangular Cholesky factor, or `None` if the matrix is not
/// positive definite.
fn cholesky(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut lower = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| lower[i][k] * lower[j][k]).sum();
            if i == j {
                let diag = matrix[i][i] - sum;
                if diag <= 0.0 {
                    return None;
                }
                lower[i][j] = diag.sqrt();
            } else {
                lower[i][j] = (matrix[i][j] - sum) / lower[j][j];
            }
        }
    }
    Some(lower)
}

/// Solve `L x = b` for lower-triangular `L`.
fn solve_lower(lower: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut x = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| lower[i][k] * x[k]).sum();
        x[i] = (b[i] - sum) / lower[i][i];
    }
    x
}

/// Solve `L L^T x = b` given the Cholesky factor `L`.
fn solve_cholesky(lower: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let y = solve_lower(lower, b);
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|k| lower[k][i] * x[k]).sum();
        x[i] = (y[i] - sum) / lower[i][i];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_gp() -> GaussianProcess {
        let inputs = vec![vec![0.1], vec![0.5], vec![0.9]];
        let observations = [0.2, 0.8, 0.3];
        GaussianProcess::fit(
            inputs,
            &observations,
            GaussianProcess::DEFAULT_LENGTH_SCALE,
            GaussianProcess::DEFAULT_NOISE,
        )
        .unwrap()
    }

    #[test]
    fn interpolates_observations() {
        let gp = sample_gp();
        let (mean, std) = gp.predict(&[0.5]);
        assert!((mean - 0.8).abs() < 1e-2, "mean at datum was {mean}");
        assert!(std < 0.05, "std at datum was {std}");
    }

    #[test]
    fn uncertainty_grows_away_from_data() {
        let gp = sample_gp();
        let (_, std_near) = gp.predict(&[0.5]);
        let (_, std_far) = gp.predict(&[2.5]);
        assert!(std_far > std_near);
        // Far from all data the posterior reverts to the prior.
        let (mean_far, _) = gp.predict(&[2.5]);
        assert!((mean_far - gp.observation_mean).abs() < 1e-6);
    }

    #[test]
    fn ucb_increases_with_kappa() {
        let gp = sample_gp();
        let point = [0.7];
        assert!(gp.upper_confidence_bound(&point, 2.0) > gp.upper_confidence_bound(&point, 0.5));
    }

    #[test]
    fn duplicate_inputs_survive_via_jitter() {
        let inputs = vec![vec![0.5], vec![0.5], vec![0.5]];
        let observations = [0.4, 0.5, 0.6];
        let gp = GaussianProcess::fit(
            inputs,
            &observations,
            GaussianProcess::DEFAULT_LENGTH_SCALE,
            GaussianProcess::DEFAULT_NOISE,
        );
        assert!(gp.is_some());
    }

    #[test]
    fn empty_fit_is_none() {
        assert!(GaussianProcess::fit(vec![], &[], 0.2, 1e-6).is_none());
    }

    #[test]
    fn cholesky_identity() {
        let identity = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let lower = cholesky(&identity).unwrap();
        assert_eq!(lower, identity);
    }

    #[test]
    fn cholesky_rejects_indefinite() {
        let indefinite = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        assert!(cholesky(&indefinite).is_none());
    }
}
