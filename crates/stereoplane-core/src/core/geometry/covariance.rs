use nalgebra::{Matrix3, Point3, Vector3};

/// Number of power / inverse-power iterations. Fixed, no convergence test.
pub const EIGEN_ITERATIONS: usize = 30;
/// Number of Gauss-Seidel sweeps per approximate solve.
pub const SOLVE_SWEEPS: usize = 10;
/// Diagonal regularizer added before inverse iteration.
pub const INVERSE_REGULARIZER: f64 = 1e-4;
/// Damping added to each diagonal denominator inside the Gauss-Seidel sweep.
pub const SOLVE_DAMPING: f64 = 1e-3;

const VANISHING_NORM: f64 = 1e-12;

/// Symmetric 3x3 scatter matrix of a point set around a center.
///
/// The eigenvector routines here are deliberately approximate: they run a fixed number
/// of iterations from a fixed start vector and never shift or test for convergence, so
/// the vectors they return (and therefore which candidate plane wins a tie) are fully
/// deterministic for a given input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Covariance {
    matrix: Matrix3<f64>,
}

impl Covariance {
    /// Builds `Σ (p - c)(p - c)ᵗ` over `points`. The sum is not normalized by the count.
    pub fn from_points(points: &[Point3<f64>], center: &Point3<f64>) -> Self {
        let matrix = points.iter().fold(Matrix3::zeros(), |acc, p| {
            let q = p - center;
            acc + q * q.transpose()
        });
        Self { matrix }
    }

    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Approximates the eigenvector of the largest eigenvalue by forward power iteration.
    ///
    /// Returns `None` when `M·v` vanishes or stops being finite, which happens for an
    /// all-zero matrix (single point, or after deflating a rank-one matrix).
    pub fn largest_eigenvector(&self) -> Option<Vector3<f64>> {
        let mut v = start_vector();
        for _ in 0..EIGEN_ITERATIONS {
            v = finite_normalize(&(self.matrix * v))?;
        }
        Some(v)
    }

    /// Approximates the eigenvector of the smallest eigenvalue by inverse iteration.
    ///
    /// The matrix is regularized with [`INVERSE_REGULARIZER`] on the diagonal and each
    /// step solves `M x = v` approximately with [`solve_approx`](Self::solve_approx).
    pub fn smallest_eigenvector(&self) -> Option<Vector3<f64>> {
        let regularized =
            Self::from_matrix(self.matrix + Matrix3::identity() * INVERSE_REGULARIZER);
        let mut v = start_vector();
        for _ in 0..EIGEN_ITERATIONS {
            v = finite_normalize(&regularized.solve_approx(&v))?;
        }
        Some(v)
    }

    /// Approximately solves `M x = b` with [`SOLVE_SWEEPS`] damped Gauss-Seidel sweeps,
    /// starting from `x = b`.
    pub fn solve_approx(&self, b: &Vector3<f64>) -> Vector3<f64> {
        let m = &self.matrix;
        let mut x = *b;
        for _ in 0..SOLVE_SWEEPS {
            let x0 = (b.x - m[(0, 1)] * x.y - m[(0, 2)] * x.z) / (m[(0, 0)] + SOLVE_DAMPING);
            let x1 = (b.y - m[(1, 0)] * x0 - m[(1, 2)] * x.z) / (m[(1, 1)] + SOLVE_DAMPING);
            let x2 = (b.z - m[(2, 0)] * x0 - m[(2, 1)] * x1) / (m[(2, 2)] + SOLVE_DAMPING);
            x = Vector3::new(x0, x1, x2);
        }
        x
    }

    /// Removes the component along `v`: `M - λ v vᵗ` with `λ = vᵗ M v`.
    pub fn deflate(&self, v: &Vector3<f64>) -> Self {
        let lambda = v.dot(&(self.matrix * v));
        Self::from_matrix(self.matrix - lambda * v * v.transpose())
    }

    /// Normal of the plane spanned by the two dominant directions,
    /// `normalize(largest1 × largest2)` where `largest2` comes from the deflated matrix.
    pub fn dominant_plane_normal(&self) -> Option<Vector3<f64>> {
        let largest1 = self.largest_eigenvector()?;
        let largest2 = self.deflate(&largest1).largest_eigenvector()?;
        finite_normalize(&largest1.cross(&largest2))
    }
}

fn start_vector() -> Vector3<f64> {
    Vector3::new(1.0, 1.0, 1.0).normalize()
}

fn finite_normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    if !v.iter().all(|c| c.is_finite()) {
        return None;
    }
    v.try_normalize(VANISHING_NORM)
}
