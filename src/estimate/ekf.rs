use log::{debug, trace};

use crate::traits::FloatScalar;
use crate::{DynMatrix, DynVector};

use super::{EkfConfig, EkfError, JacobianRefresh, Model};

/// Extended Kalman Filter with runtime state dimension `n` and observation
/// dimension `m`.
///
/// Holds the state estimate `x`, posterior covariance `P`, the constant
/// noise matrices `Q = qval·I` and `R = rval·I`, and the model Jacobians
/// `F` (n×n) and `H` (m×n). Each [`step`](Ekf::step) runs
///
/// ```text
/// x⁻ = f(x)                 P⁻ = F P Fᵀ + Q
/// G  = P⁻ Hᵀ (H P⁻ Hᵀ + R)⁻¹
/// x  = x⁻ + G (z − h(x⁻))   P  = (I − G H) P⁻
/// ```
///
/// A step either commits all of its results or none of them: on error the
/// estimate, covariances and Jacobians are exactly as before the call.
///
/// # Example
///
/// ```
/// use tinyekf::estimate::{Ekf, EkfConfig, FnModel};
/// use tinyekf::{DynMatrix, DynVector};
///
/// // Constant-velocity model: state = [position, velocity], position observed
/// let dt = 0.1;
/// let model = FnModel::new(
///     move |x: &DynVector<f64>| DynVector::from_slice(&[x[0] + dt * x[1], x[1]]),
///     move |_x: &DynVector<f64>| DynMatrix::from_rows(2, 2, &[1.0, dt, 0.0, 1.0]),
///     |x: &DynVector<f64>| DynVector::from_slice(&[x[0]]),
///     |_x: &DynVector<f64>| DynMatrix::from_rows(1, 2, &[1.0, 0.0]),
/// );
/// let config = EkfConfig::new(10.0, 1e-3, 0.05);
/// let mut ekf = Ekf::with_config(model, 2, 1, config).unwrap();
///
/// for k in 1..=100 {
///     let t = k as f64 * dt;
///     ekf.step(&[2.0 * t]).unwrap();
/// }
/// assert!((ekf.state()[1] - 2.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone)]
pub struct Ekf<T, M> {
    model: M,
    config: EkfConfig<T>,
    n: usize,
    m: usize,
    /// State estimate.
    x: DynVector<T>,
    /// Posterior covariance.
    p_post: DynMatrix<T>,
    /// Prior covariance of the last step.
    p_pre: Option<DynMatrix<T>>,
    q: DynMatrix<T>,
    r: DynMatrix<T>,
    f_jac: DynMatrix<T>,
    h_jac: DynMatrix<T>,
    eye: DynMatrix<T>,
    gain: Option<DynMatrix<T>>,
    innovation: Option<DynVector<T>>,
    steps: u64,
}

impl<T: FloatScalar, M: Model<T>> Ekf<T, M> {
    /// Create a filter with `n` states and `m` observables using the default
    /// configuration (`pval = 0.1`, `qval = 1e-4`, `rval = 0.1`).
    pub fn new(model: M, n: usize, m: usize) -> Result<Self, EkfError>
    where
        EkfConfig<T>: Default,
    {
        Self::with_config(model, n, m, EkfConfig::default())
    }

    /// Create a filter with explicit configuration.
    ///
    /// The state starts at zero and `P = pval·I`. Both Jacobians are
    /// evaluated once against the zero state.
    pub fn with_config(
        model: M,
        n: usize,
        m: usize,
        config: EkfConfig<T>,
    ) -> Result<Self, EkfError> {
        if n == 0 || m == 0 {
            return Err(EkfError::ZeroDimension { n, m });
        }

        let x = DynVector::zeros(n);
        let f_jac = eval_state_jacobian(&model, &x, n)?;
        let h_jac = eval_observation_jacobian(&model, &x, n, m)?;

        let eye = DynMatrix::eye(n);
        trace!(
            "ekf: n = {}, m = {}, pval = {:?}, qval = {:?}, rval = {:?}, jacobians = {:?}",
            n,
            m,
            config.pval,
            config.qval,
            config.rval,
            config.jacobians,
        );

        Ok(Self {
            p_post: eye.scale(config.pval),
            p_pre: None,
            q: eye.scale(config.qval),
            r: DynMatrix::eye(m).scale(config.rval),
            model,
            config,
            n,
            m,
            x,
            f_jac,
            h_jac,
            eye,
            gain: None,
            innovation: None,
            steps: 0,
        })
    }

    /// Run one predict/update cycle on observation `z` (length m) and return
    /// a copy of the updated state.
    ///
    /// Fails with [`EkfError::DimensionMismatch`] if `z` or any model output
    /// has the wrong shape, and with [`EkfError::SingularMatrix`] if the
    /// innovation covariance cannot be inverted. On failure the filter is
    /// unchanged; a caller may skip the observation and call
    /// [`predict`](Ekf::predict) instead.
    pub fn step(&mut self, z: &[T]) -> Result<DynVector<T>, EkfError> {
        let z = DynVector::from_slice(z);
        z.expect_len("observation", self.m)?;

        // Predict
        let x_pre = self.model.transition(&self.x);
        x_pre.expect_len("state transition", self.n)?;

        let refreshed = match self.config.jacobians {
            JacobianRefresh::Construction => None,
            JacobianRefresh::EveryStep => Some((
                eval_state_jacobian(&self.model, &self.x, self.n)?,
                eval_observation_jacobian(&self.model, &x_pre, self.n, self.m)?,
            )),
        };
        let (f_jac, h_jac) = match &refreshed {
            Some((f, h)) => (f, h),
            None => (&self.f_jac, &self.h_jac),
        };

        let p_pre = f_jac
            .try_mul(&self.p_post)?
            .try_mul(&f_jac.transpose())?
            .try_add(&self.q)?;

        // Update
        let p_ht = p_pre.try_mul(&h_jac.transpose())?;
        let s_inv = h_jac.try_mul(&p_ht)?.try_add(&self.r)?.inverse()?;
        let gain = p_ht.try_mul(&s_inv)?;

        let hx = self.model.observe(&x_pre);
        hx.expect_len("observation function", self.m)?;
        let innovation = z.try_sub(&hx)?;

        let x_post = x_pre.try_add(&gain.try_mul_vec(&innovation)?)?;
        let p_post = self.eye.try_sub(&gain.try_mul(h_jac)?)?.try_mul(&p_pre)?;

        // Commit
        if let Some((f, h)) = refreshed {
            self.f_jac = f;
            self.h_jac = h;
        }
        self.x = x_post;
        self.p_post = p_post;
        self.p_pre = Some(p_pre);
        self.gain = Some(gain);
        self.innovation = Some(innovation);
        self.steps += 1;

        trace!(
            "ekf step {}: x = {:?}, innovation = {:?}",
            self.steps,
            self.x.as_slice(),
            self.innovation.as_ref().map(|v| v.as_slice()),
        );

        Ok(self.x.clone())
    }

    /// Predict-only cycle: `x = f(x)`, `P = F P Fᵀ + Q`, no observation.
    ///
    /// With [`JacobianRefresh::EveryStep`] `F` is re-evaluated at the current
    /// estimate first. Clears the gain and innovation snapshots.
    pub fn predict(&mut self) -> Result<DynVector<T>, EkfError> {
        let x_pre = self.model.transition(&self.x);
        x_pre.expect_len("state transition", self.n)?;

        let refreshed = match self.config.jacobians {
            JacobianRefresh::Construction => None,
            JacobianRefresh::EveryStep => Some(eval_state_jacobian(&self.model, &self.x, self.n)?),
        };
        let f_jac = refreshed.as_ref().unwrap_or(&self.f_jac);

        let p_pre = f_jac
            .try_mul(&self.p_post)?
            .try_mul(&f_jac.transpose())?
            .try_add(&self.q)?;

        if let Some(f) = refreshed {
            self.f_jac = f;
        }
        self.x = x_pre;
        self.p_post = p_pre.clone();
        self.p_pre = Some(p_pre);
        self.gain = None;
        self.innovation = None;

        debug!("ekf predict-only: x = {:?}", self.x.as_slice());

        Ok(self.x.clone())
    }

    /// Re-evaluate `F` and `H` at the current estimate.
    pub fn refresh_jacobians(&mut self) -> Result<(), EkfError> {
        let f_jac = eval_state_jacobian(&self.model, &self.x, self.n)?;
        let h_jac = eval_observation_jacobian(&self.model, &self.x, self.n, self.m)?;
        self.f_jac = f_jac;
        self.h_jac = h_jac;
        trace!("ekf: jacobians refreshed at x = {:?}", self.x.as_slice());
        Ok(())
    }

    /// Overwrite the state estimate. The covariance and Jacobians are left
    /// as they are.
    pub fn set_state(&mut self, x: &[T]) -> Result<(), EkfError> {
        let x = DynVector::from_slice(x);
        x.expect_len("state", self.n)?;
        self.x = x;
        Ok(())
    }
}

impl<T, M> Ekf<T, M> {
    /// Current state estimate.
    #[inline]
    pub fn state(&self) -> &DynVector<T> {
        &self.x
    }

    /// Posterior state covariance.
    #[inline]
    pub fn covariance(&self) -> &DynMatrix<T> {
        &self.p_post
    }

    /// Prior covariance computed by the most recent step, if any.
    #[inline]
    pub fn prior_covariance(&self) -> Option<&DynMatrix<T>> {
        self.p_pre.as_ref()
    }

    /// Process noise covariance `Q`.
    #[inline]
    pub fn process_noise(&self) -> &DynMatrix<T> {
        &self.q
    }

    /// Measurement noise covariance `R`.
    #[inline]
    pub fn measurement_noise(&self) -> &DynMatrix<T> {
        &self.r
    }

    /// State-transition Jacobian `F` in use.
    #[inline]
    pub fn state_jacobian(&self) -> &DynMatrix<T> {
        &self.f_jac
    }

    /// Observation Jacobian `H` in use.
    #[inline]
    pub fn observation_jacobian(&self) -> &DynMatrix<T> {
        &self.h_jac
    }

    /// Kalman gain of the most recent update.
    #[inline]
    pub fn kalman_gain(&self) -> Option<&DynMatrix<T>> {
        self.gain.as_ref()
    }

    /// Innovation `z − h(x⁻)` of the most recent update.
    #[inline]
    pub fn innovation(&self) -> Option<&DynVector<T>> {
        self.innovation.as_ref()
    }

    /// State dimension n.
    #[inline]
    pub fn state_dim(&self) -> usize {
        self.n
    }

    /// Observation dimension m.
    #[inline]
    pub fn observation_dim(&self) -> usize {
        self.m
    }

    /// Number of successful [`step`](Ekf::step) calls.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[inline]
    pub fn config(&self) -> &EkfConfig<T> {
        &self.config
    }

    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }
}

fn eval_state_jacobian<T: FloatScalar>(
    model: &impl Model<T>,
    x: &DynVector<T>,
    n: usize,
) -> Result<DynMatrix<T>, EkfError> {
    let f_jac = model.state_jacobian(x);
    f_jac.expect_shape("state Jacobian", (n, n))?;
    Ok(f_jac)
}

fn eval_observation_jacobian<T: FloatScalar>(
    model: &impl Model<T>,
    x: &DynVector<T>,
    n: usize,
    m: usize,
) -> Result<DynMatrix<T>, EkfError> {
    let h_jac = model.observation_jacobian(x);
    h_jac.expect_shape("observation Jacobian", (m, n))?;
    Ok(h_jac)
}
