//! Conjugate gradient on the normal equations `AᵀA·x = Aᵀb`.
//!
//! `AᵀA` is never formed; each step costs one product with `A` and one with
//! `Aᵀ`. A diagonal preconditioner uses the inverse squared column norms of
//! `A` (the diagonal of `AᵀA`).
//!
//! The reported error is `sqrt(|Aᵀ(b − A·x)|² / |Aᵀb|²)`, and the iteration
//! stops once it drops below `tolerance`.
use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

/// Result of a least-squares solve.
#[derive(Clone, Debug)]
pub struct CgOutcome {
    pub x: DVector<f64>,
    /// Iterations performed (0 when the initial guess already meets the target).
    pub iterations: u32,
    /// Relative normal-equation residual at exit.
    pub error: f64,
    pub converged: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeastSquaresCg {
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl Default for LeastSquaresCg {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 1e-5,
        }
    }
}

/// Inverse squared column norms; empty columns get 1.
pub fn jacobi_preconditioner(a: &CsrMatrix<f64>) -> DVector<f64> {
    let mut col_norm2 = DVector::<f64>::zeros(a.ncols());
    for (_, j, v) in a.triplet_iter() {
        col_norm2[j] += v * v;
    }
    col_norm2.map(|s| if s > 0.0 { 1.0 / s } else { 1.0 })
}

impl LeastSquaresCg {
    pub fn new(max_iterations: u32, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    /// Solve from a zero initial guess.
    pub fn solve(&self, a: &CsrMatrix<f64>, b: &DVector<f64>) -> CgOutcome {
        self.solve_with_guess(a, b, DVector::zeros(a.ncols()))
    }

    /// Solve starting from `guess`.
    pub fn solve_with_guess(
        &self,
        a: &CsrMatrix<f64>,
        b: &DVector<f64>,
        guess: DVector<f64>,
    ) -> CgOutcome {
        let at = a.transpose();
        let rhs_norm2 = (&at * b).norm_squared();
        if rhs_norm2 == 0.0 {
            return CgOutcome {
                x: DVector::zeros(a.ncols()),
                iterations: 0,
                error: 0.0,
                converged: true,
            };
        }

        let threshold = self.tolerance * self.tolerance * rhs_norm2;
        let inv_diag = jacobi_preconditioner(a);

        let mut x = guess;
        let mut residual = b - a * &x;
        let mut normal_residual = &at * &residual;
        let mut residual_norm2 = normal_residual.norm_squared();
        if residual_norm2 < threshold {
            return CgOutcome {
                x,
                iterations: 0,
                error: (residual_norm2 / rhs_norm2).sqrt(),
                converged: true,
            };
        }

        let mut p = normal_residual.component_mul(&inv_diag);
        let mut abs_new = normal_residual.dot(&p);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            let tmp = a * &p;
            let denom = tmp.norm_squared();
            if denom <= f64::MIN_POSITIVE {
                debug!("cgls: search direction vanished at iteration {iterations}");
                break;
            }
            let alpha = abs_new / denom;
            x.axpy(alpha, &p, 1.0);
            residual.axpy(-alpha, &tmp, 1.0);
            normal_residual = &at * &residual;
            residual_norm2 = normal_residual.norm_squared();
            iterations += 1;
            if residual_norm2 < threshold {
                converged = true;
                break;
            }

            let z = normal_residual.component_mul(&inv_diag);
            let abs_old = abs_new;
            abs_new = normal_residual.dot(&z);
            let beta = abs_new / abs_old;
            p = z + p * beta;
        }

        let error = (residual_norm2 / rhs_norm2).sqrt();
        debug!(
            "cgls: iterations={iterations}/{} error={error:.3e} converged={converged}",
            self.max_iterations
        );
        CgOutcome {
            x,
            iterations,
            error,
            converged,
        }
    }
}
