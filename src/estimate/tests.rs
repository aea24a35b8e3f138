use core::cell::Cell;

use approx::assert_abs_diff_eq;

use super::*;
use crate::{DynMatrix, DynVector};

/// x' = x, z = x, F = H = I.
#[derive(Debug, Clone)]
struct Identity {
    n: usize,
}

impl Model<f64> for Identity {
    fn transition(&self, x: &DynVector<f64>) -> DynVector<f64> {
        x.clone()
    }

    fn state_jacobian(&self, _x: &DynVector<f64>) -> DynMatrix<f64> {
        DynMatrix::eye(self.n)
    }

    fn observe(&self, x: &DynVector<f64>) -> DynVector<f64> {
        x.clone()
    }

    fn observation_jacobian(&self, _x: &DynVector<f64>) -> DynMatrix<f64> {
        DynMatrix::eye(self.n)
    }
}

/// Pendulum [θ, ω] with small time step, observing sin θ.
#[derive(Clone)]
struct Pendulum {
    dt: f64,
}

impl Model<f64> for Pendulum {
    fn transition(&self, x: &DynVector<f64>) -> DynVector<f64> {
        DynVector::from_slice(&[x[0] + self.dt * x[1], x[1] - 9.81 * self.dt * x[0].sin()])
    }

    fn state_jacobian(&self, x: &DynVector<f64>) -> DynMatrix<f64> {
        DynMatrix::from_rows(2, 2, &[1.0, self.dt, -9.81 * self.dt * x[0].cos(), 1.0])
    }

    fn observe(&self, x: &DynVector<f64>) -> DynVector<f64> {
        DynVector::from_slice(&[x[0].sin()])
    }

    fn observation_jacobian(&self, x: &DynVector<f64>) -> DynMatrix<f64> {
        DynMatrix::from_rows(1, 2, &[x[0].cos(), 0.0])
    }
}

/// Counts Jacobian evaluations.
struct Counting {
    f_calls: Cell<usize>,
    h_calls: Cell<usize>,
}

impl Counting {
    fn new() -> Self {
        Self {
            f_calls: Cell::new(0),
            h_calls: Cell::new(0),
        }
    }
}

impl Model<f64> for Counting {
    fn transition(&self, x: &DynVector<f64>) -> DynVector<f64> {
        x.clone()
    }

    fn state_jacobian(&self, x: &DynVector<f64>) -> DynMatrix<f64> {
        self.f_calls.set(self.f_calls.get() + 1);
        // state-dependent so refreshes are observable
        DynMatrix::from_rows(1, 1, &[1.0 + x[0]])
    }

    fn observe(&self, x: &DynVector<f64>) -> DynVector<f64> {
        x.clone()
    }

    fn observation_jacobian(&self, _x: &DynVector<f64>) -> DynMatrix<f64> {
        self.h_calls.set(self.h_calls.get() + 1);
        DynMatrix::eye(1)
    }
}

fn assert_symmetric(p: &DynMatrix<f64>) {
    let diff = p.max_abs_diff(&p.transpose()).unwrap();
    assert!(diff < 1e-10, "covariance not symmetric: max |P - Pᵀ| = {diff}");
}

// ── Construction ────────────────────────────────────────────────────

#[test]
fn construction_defaults() {
    let ekf = Ekf::new(Identity { n: 3 }, 3, 3).unwrap();

    assert_eq!(ekf.state_dim(), 3);
    assert_eq!(ekf.observation_dim(), 3);
    assert_eq!(ekf.state().as_slice(), &[0.0, 0.0, 0.0]);
    assert_eq!(*ekf.covariance(), DynMatrix::eye(3).scale(0.1));
    assert_eq!(*ekf.process_noise(), DynMatrix::eye(3).scale(1e-4));
    assert_eq!(*ekf.measurement_noise(), DynMatrix::eye(3).scale(0.1));
    assert_eq!(*ekf.state_jacobian(), DynMatrix::eye(3));
    assert_eq!(*ekf.observation_jacobian(), DynMatrix::eye(3));
    assert!(ekf.prior_covariance().is_none());
    assert!(ekf.kalman_gain().is_none());
    assert!(ekf.innovation().is_none());
    assert_eq!(ekf.steps(), 0);
    assert_eq!(ekf.config().jacobians, JacobianRefresh::Construction);
}

#[test]
fn construction_with_config() {
    let config = EkfConfig::new(2.0, 0.5, 3.0);
    let ekf = Ekf::with_config(Pendulum { dt: 0.01 }, 2, 1, config).unwrap();
    assert_eq!(ekf.covariance()[(1, 1)], 2.0);
    assert_eq!(ekf.process_noise()[(0, 0)], 0.5);
    assert_eq!(ekf.measurement_noise().shape(), (1, 1));
    assert_eq!(ekf.measurement_noise()[(0, 0)], 3.0);
}

#[test]
fn jacobians_evaluated_once_at_zero_state() {
    let ekf = Ekf::new(Pendulum { dt: 0.1 }, 2, 1).unwrap();
    // cos(0) = 1
    let expected = DynMatrix::from_rows(2, 2, &[1.0, 0.1, -0.981, 1.0]);
    assert!(ekf.state_jacobian().max_abs_diff(&expected).unwrap() < 1e-15);
    assert_eq!(*ekf.observation_jacobian(), DynMatrix::from_rows(1, 2, &[1.0, 0.0]));

    let counting = Counting::new();
    let mut ekf = Ekf::new(&counting, 1, 1).unwrap();
    assert_eq!(counting.f_calls.get(), 1);
    assert_eq!(counting.h_calls.get(), 1);
    for _ in 0..5 {
        ekf.step(&[1.0]).unwrap();
    }
    assert_eq!(counting.f_calls.get(), 1);
    assert_eq!(counting.h_calls.get(), 1);
    assert_eq!(ekf.state_jacobian()[(0, 0)], 1.0);
}

#[test]
fn zero_dimension_rejected() {
    for (n, m) in [(0, 1), (1, 0), (0, 0)] {
        let err = Ekf::new(Identity { n: 1 }, n, m).unwrap_err();
        assert_eq!(err, EkfError::ZeroDimension { n, m });
        assert!(err.is_dimension_mismatch());
    }
}

#[test]
fn wrong_jacobian_shape_rejected() {
    // Identity model claims 2 states but the filter is built for 3
    let err = Ekf::new(Identity { n: 2 }, 3, 3).unwrap_err();
    match err {
        EkfError::DimensionMismatch(e) => {
            assert_eq!(e.context, "state Jacobian");
            assert_eq!(e.expected, (3, 3));
            assert_eq!(e.got, (2, 2));
        }
        other => panic!("expected dimension mismatch, got {:?}", other),
    }

    // H must be m×n
    let model = FnModel::new(
        |x: &DynVector<f64>| x.clone(),
        |_x: &DynVector<f64>| DynMatrix::eye(2),
        |x: &DynVector<f64>| DynVector::from_slice(&[x[0]]),
        |_x: &DynVector<f64>| DynMatrix::from_rows(2, 1, &[1.0, 0.0]),
    );
    let err = Ekf::new(model, 2, 1).unwrap_err();
    match err {
        EkfError::DimensionMismatch(e) => {
            assert_eq!(e.context, "observation Jacobian");
            assert_eq!(e.expected, (1, 2));
        }
        other => panic!("expected dimension mismatch, got {:?}", other),
    }
}

// ── Step ────────────────────────────────────────────────────────────

#[test]
fn scalar_step_matches_closed_form() {
    let config = EkfConfig::new(1.0, 1e-4, 0.1);
    let mut ekf = Ekf::with_config(Identity { n: 1 }, 1, 1, config).unwrap();

    let x = ekf.step(&[5.0]).unwrap();

    let p_pre = 1.0 + 1e-4;
    let g = p_pre / (p_pre + 0.1);
    assert_abs_diff_eq!(x[0], g * 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(ekf.prior_covariance().unwrap()[(0, 0)], p_pre, epsilon = 1e-15);
    assert_abs_diff_eq!(ekf.covariance()[(0, 0)], (1.0 - g) * p_pre, epsilon = 1e-12);
    assert_abs_diff_eq!(ekf.kalman_gain().unwrap()[(0, 0)], g, epsilon = 1e-12);
    assert_abs_diff_eq!(ekf.innovation().unwrap()[0], 5.0, epsilon = 1e-15);
    assert_eq!(ekf.steps(), 1);
}

#[test]
fn constant_velocity_step_matches_hand_computation() {
    let dt = 0.5;
    let model = FnModel::new(
        move |x: &DynVector<f64>| DynVector::from_slice(&[x[0] + dt * x[1], x[1]]),
        move |_x: &DynVector<f64>| DynMatrix::from_rows(2, 2, &[1.0, dt, 0.0, 1.0]),
        |x: &DynVector<f64>| DynVector::from_slice(&[x[0]]),
        |_x: &DynVector<f64>| DynMatrix::from_rows(1, 2, &[1.0, 0.0]),
    );
    let mut ekf = Ekf::with_config(model, 2, 1, EkfConfig::new(1.0, 0.0, 1.0)).unwrap();

    // P⁻ = F I Fᵀ = [[1 + dt², dt], [dt, 1]]
    // S = 1 + dt² + 1 = 2.25, G = [1.25 / 2.25, 0.5 / 2.25]
    let x = ekf.step(&[3.0]).unwrap();
    let s = 2.25;
    assert_abs_diff_eq!(x[0], 1.25 / s * 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(x[1], 0.5 / s * 3.0, epsilon = 1e-12);

    let p = ekf.covariance();
    // P = P⁻ − G H P⁻
    assert_abs_diff_eq!(p[(0, 0)], 1.25 - 1.25 * 1.25 / s, epsilon = 1e-12);
    assert_abs_diff_eq!(p[(0, 1)], 0.5 - 1.25 * 0.5 / s, epsilon = 1e-12);
    assert_abs_diff_eq!(p[(1, 1)], 1.0 - 0.5 * 0.5 / s, epsilon = 1e-12);
    assert_symmetric(p);
}

#[test]
fn identity_model_converges_and_uncertainty_shrinks() {
    let truth = [1.5, -2.0, 0.25];
    let config = EkfConfig::new(1.0, 1e-6, 1e-2);
    let mut ekf = Ekf::with_config(Identity { n: 3 }, 3, 3, config).unwrap();

    let mut prev_diag = ekf.covariance().diag();
    for _ in 0..30 {
        ekf.step(&truth).unwrap();
        let diag = ekf.covariance().diag();
        for i in 0..3 {
            assert!(
                diag[i] <= prev_diag[i],
                "P[{i}][{i}] grew: {} -> {}",
                prev_diag[i],
                diag[i]
            );
        }
        prev_diag = diag;
    }
    for i in 0..3 {
        assert_abs_diff_eq!(ekf.state()[i], truth[i], epsilon = 1e-3);
    }
}

#[test]
fn shapes_invariant_across_steps() {
    let mut ekf = Ekf::new(Pendulum { dt: 0.01 }, 2, 1).unwrap();
    for k in 0..50 {
        let z = (0.3 * (k as f64 * 0.1).cos()).sin();
        let x = ekf.step(&[z]).unwrap();
        assert_eq!(x.len(), 2);
        assert_eq!(ekf.covariance().shape(), (2, 2));
        assert_eq!(ekf.prior_covariance().unwrap().shape(), (2, 2));
        assert_eq!(ekf.kalman_gain().unwrap().shape(), (2, 1));
        assert_eq!(ekf.innovation().unwrap().len(), 1);
        assert_eq!(ekf.state_dim(), 2);
        assert_eq!(ekf.observation_dim(), 1);
    }
}

#[test]
fn covariance_stays_symmetric() {
    for refresh in [JacobianRefresh::Construction, JacobianRefresh::EveryStep] {
        let config = EkfConfig::new(0.5, 1e-3, 0.05).with_jacobians(refresh);
        let mut ekf = Ekf::with_config(Pendulum { dt: 0.02 }, 2, 1, config).unwrap();
        ekf.set_state(&[0.2, 0.0]).unwrap();
        for k in 0..200 {
            let t = k as f64 * 0.02;
            let z = (0.3 * (3.13 * t).cos()).sin();
            ekf.step(&[z]).unwrap();
            assert_symmetric(ekf.covariance());
        }
    }
}

#[test]
fn returned_state_is_a_snapshot() {
    let mut ekf = Ekf::with_config(Identity { n: 1 }, 1, 1, EkfConfig::new(1.0, 1e-4, 0.1)).unwrap();
    let first = ekf.step(&[5.0]).unwrap();
    let kept = first.clone();
    let second = ekf.step(&[5.0]).unwrap();
    assert_eq!(first, kept);
    assert_ne!(first, second);
    assert_eq!(*ekf.state(), second);
}

// ── Failure leaves state unchanged ──────────────────────────────────

#[test]
fn wrong_observation_length_rejected() {
    let mut ekf = Ekf::new(Pendulum { dt: 0.01 }, 2, 1).unwrap();
    ekf.step(&[0.1]).unwrap();
    let before = ekf.clone();

    for z in [&[][..], &[0.1, 0.2][..]] {
        let err = ekf.step(z).unwrap_err();
        assert!(err.is_dimension_mismatch());
        match err {
            EkfError::DimensionMismatch(e) => {
                assert_eq!(e.context, "observation");
                assert_eq!(e.expected, (1, 1));
                assert_eq!(e.got, (z.len(), 1));
            }
            other => panic!("expected dimension mismatch, got {:?}", other),
        }
    }

    assert_eq!(ekf.state(), before.state());
    assert_eq!(ekf.covariance(), before.covariance());
    assert_eq!(ekf.prior_covariance(), before.prior_covariance());
    assert_eq!(ekf.steps(), before.steps());
}

#[test]
fn misbehaving_model_rejected() {
    // f returns the wrong length
    let bad_f = FnModel::new(
        |_x: &DynVector<f64>| DynVector::zeros(3),
        |_x: &DynVector<f64>| DynMatrix::eye(2),
        |x: &DynVector<f64>| DynVector::from_slice(&[x[0]]),
        |_x: &DynVector<f64>| DynMatrix::from_rows(1, 2, &[1.0, 0.0]),
    );
    let mut ekf = Ekf::new(bad_f, 2, 1).unwrap();
    let err = ekf.step(&[1.0]).unwrap_err();
    assert!(matches!(err, EkfError::DimensionMismatch(e) if e.context == "state transition"));
    assert_eq!(ekf.state().as_slice(), &[0.0, 0.0]);

    // h returns the wrong length
    let bad_h = FnModel::new(
        |x: &DynVector<f64>| x.clone(),
        |_x: &DynVector<f64>| DynMatrix::eye(2),
        |_x: &DynVector<f64>| DynVector::zeros(2),
        |_x: &DynVector<f64>| DynMatrix::from_rows(1, 2, &[1.0, 0.0]),
    );
    let mut ekf = Ekf::new(bad_h, 2, 1).unwrap();
    let p_before = ekf.covariance().clone();
    let err = ekf.step(&[1.0]).unwrap_err();
    assert!(matches!(err, EkfError::DimensionMismatch(e) if e.context == "observation function"));
    assert_eq!(*ekf.covariance(), p_before);
    assert!(ekf.prior_covariance().is_none());
    assert_eq!(ekf.steps(), 0);
}

/// Output length depends on where the model is evaluated.
struct ShapeShifting;

impl Model<f64> for ShapeShifting {
    fn transition(&self, x: &DynVector<f64>) -> DynVector<f64> {
        if x[0] == 0.0 {
            x.clone()
        } else {
            DynVector::zeros(3)
        }
    }

    fn observe(&self, x: &DynVector<f64>) -> DynVector<f64> {
        if x[1] == 0.0 {
            DynVector::from_slice(&[x[0]])
        } else {
            DynVector::zeros(2)
        }
    }
}

#[test]
fn unstable_output_length_rejected_by_default_jacobians() {
    let x = DynVector::zeros(2);
    let e = fd_jacobian(|x| ShapeShifting.transition(x), &x).unwrap_err();
    assert_eq!(e.context, "finite-difference Jacobian");
    assert_eq!(e.expected, (2, 1));
    assert_eq!(e.got, (3, 1));
    assert_eq!(ShapeShifting.state_jacobian(&x).shape(), (0, 0));
    assert_eq!(ShapeShifting.observation_jacobian(&x).shape(), (0, 0));

    match Ekf::new(ShapeShifting, 2, 1) {
        Err(EkfError::DimensionMismatch(e)) => {
            assert_eq!(e.context, "state Jacobian");
            assert_eq!(e.expected, (2, 2));
            assert_eq!(e.got, (0, 0));
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn singular_innovation_detected() {
    // H = 0 and R = 0 make H P Hᵀ + R the zero matrix
    let model = FnModel::new(
        |x: &DynVector<f64>| x.clone(),
        |_x: &DynVector<f64>| DynMatrix::eye(2),
        |_x: &DynVector<f64>| DynVector::zeros(2),
        |_x: &DynVector<f64>| DynMatrix::zeros(2, 2),
    );
    let config = EkfConfig::new(0.1, 1e-4, 0.0);
    let mut ekf = Ekf::with_config(model, 2, 2, config).unwrap();
    ekf.set_state(&[1.0, 2.0]).unwrap();

    let err = ekf.step(&[1.0, 1.0]).unwrap_err();
    assert_eq!(err, EkfError::SingularMatrix);
    assert!(!err.is_dimension_mismatch());

    assert_eq!(ekf.state().as_slice(), &[1.0, 2.0]);
    assert_eq!(*ekf.covariance(), DynMatrix::eye(2).scale(0.1));
    assert!(ekf.prior_covariance().is_none());
    assert!(ekf.state().as_matrix().is_finite());
    assert_eq!(ekf.steps(), 0);

    // the application can still predict through the gap
    let x = ekf.predict().unwrap();
    assert_eq!(x.as_slice(), &[1.0, 2.0]);
    assert_abs_diff_eq!(ekf.covariance()[(0, 0)], 0.1 + 1e-4, epsilon = 1e-15);
}

#[test]
fn small_variances_are_not_singular() {
    let config = EkfConfig::new(1e-17, 1e-19, 1e-17);
    let mut ekf = Ekf::with_config(Identity { n: 1 }, 1, 1, config).unwrap();
    let x = ekf.step(&[1e-9]).unwrap();

    let p_pre = 1e-17 + 1e-19;
    let g = p_pre / (p_pre + 1e-17);
    assert_abs_diff_eq!(x[0] / 1e-9, g, epsilon = 1e-12);
    assert!(ekf.covariance()[(0, 0)] > 0.0);

    // f32 at a realistic angular variance, (1e-4 rad)²
    let model = FnModel::new(
        |x: &DynVector<f32>| x.clone(),
        |_x: &DynVector<f32>| DynMatrix::eye(2),
        |x: &DynVector<f32>| x.clone(),
        |_x: &DynVector<f32>| DynMatrix::eye(2),
    );
    let mut ekf = Ekf::with_config(model, 2, 2, EkfConfig::new(1e-8_f32, 1e-10, 1e-8)).unwrap();
    let x = ekf.step(&[2e-4, -1e-4]).unwrap();
    assert!(x[0] > 0.0 && x[1] < 0.0);
}

// ── Predict-only, refresh, set_state ────────────────────────────────

#[test]
fn predict_only_grows_uncertainty() {
    let mut ekf = Ekf::new(Pendulum { dt: 0.1 }, 2, 1).unwrap();
    ekf.set_state(&[0.0, 1.0]).unwrap();
    ekf.step(&[0.1]).unwrap();
    assert!(ekf.kalman_gain().is_some());

    let trace_before = ekf.covariance().trace();
    let x_before = ekf.state().clone();
    let x = ekf.predict().unwrap();

    let expected = Pendulum { dt: 0.1 }.transition(&x_before);
    assert_eq!(x, expected);
    assert!(ekf.covariance().trace() > trace_before);
    assert_eq!(ekf.prior_covariance(), Some(ekf.covariance()));
    assert!(ekf.kalman_gain().is_none());
    assert!(ekf.innovation().is_none());
    assert_eq!(ekf.steps(), 1);
}

#[test]
fn every_step_refresh_tracks_state() {
    let counting = Counting::new();
    let config = EkfConfig::new(1.0, 1e-4, 0.1).with_jacobians(JacobianRefresh::EveryStep);
    let mut ekf = Ekf::with_config(&counting, 1, 1, config).unwrap();
    assert_eq!(counting.f_calls.get(), 1);

    let x = ekf.step(&[2.0]).unwrap();
    // one evaluation at construction, one per step
    assert_eq!(counting.f_calls.get(), 2);
    assert_eq!(counting.h_calls.get(), 2);
    // F was evaluated at the previous posterior (zero)
    assert_eq!(ekf.state_jacobian()[(0, 0)], 1.0);

    ekf.step(&[2.0]).unwrap();
    assert_abs_diff_eq!(ekf.state_jacobian()[(0, 0)], 1.0 + x[0], epsilon = 1e-15);
}

#[test]
fn explicit_refresh() {
    let counting = Counting::new();
    let mut ekf = Ekf::new(&counting, 1, 1).unwrap();
    ekf.set_state(&[3.0]).unwrap();
    assert_eq!(ekf.state_jacobian()[(0, 0)], 1.0);

    ekf.refresh_jacobians().unwrap();
    assert_eq!(ekf.state_jacobian()[(0, 0)], 4.0);
    assert_eq!(counting.f_calls.get(), 2);
    assert_eq!(counting.h_calls.get(), 2);
}

#[test]
fn set_state_checks_length() {
    let mut ekf = Ekf::new(Identity { n: 2 }, 2, 2).unwrap();
    let err = ekf.set_state(&[1.0]).unwrap_err();
    assert!(err.is_dimension_mismatch());
    assert_eq!(ekf.state().as_slice(), &[0.0, 0.0]);
    ekf.set_state(&[1.0, 2.0]).unwrap();
    assert_eq!(ekf.state().as_slice(), &[1.0, 2.0]);
}

// ── Finite-difference Jacobians ─────────────────────────────────────

/// Same dynamics as `Pendulum`, Jacobians left to the defaults.
struct PendulumFd {
    dt: f64,
}

impl Model<f64> for PendulumFd {
    fn transition(&self, x: &DynVector<f64>) -> DynVector<f64> {
        Pendulum { dt: self.dt }.transition(x)
    }

    fn observe(&self, x: &DynVector<f64>) -> DynVector<f64> {
        Pendulum { dt: self.dt }.observe(x)
    }
}

#[test]
fn default_jacobians_match_analytic() {
    let config = EkfConfig::new(0.5, 1e-3, 0.05).with_jacobians(JacobianRefresh::EveryStep);
    let mut analytic = Ekf::with_config(Pendulum { dt: 0.05 }, 2, 1, config).unwrap();
    let mut fd = Ekf::with_config(PendulumFd { dt: 0.05 }, 2, 1, config).unwrap();

    for k in 0..40 {
        let z = (0.4 * (k as f64 * 0.15).cos()).sin();
        let xa = analytic.step(&[z]).unwrap();
        let xf = fd.step(&[z]).unwrap();
        for i in 0..2 {
            assert_abs_diff_eq!(xa[i], xf[i], epsilon = 1e-5);
        }
    }
    let diff = analytic.covariance().max_abs_diff(fd.covariance()).unwrap();
    assert!(diff < 1e-5, "diff = {diff}");
}

// ── Misc ────────────────────────────────────────────────────────────

#[test]
fn error_display() {
    use alloc::string::ToString;

    assert_eq!(
        EkfError::SingularMatrix.to_string(),
        "innovation covariance is singular"
    );
    assert_eq!(
        EkfError::ZeroDimension { n: 0, m: 2 }.to_string(),
        "state and observation dimensions must be positive (n = 0, m = 2)"
    );
}

#[test]
fn f32_filter() {
    let model = FnModel::new(
        |x: &DynVector<f32>| x.clone(),
        |_x: &DynVector<f32>| DynMatrix::eye(1),
        |x: &DynVector<f32>| x.clone(),
        |_x: &DynVector<f32>| DynMatrix::eye(1),
    );
    let mut ekf = Ekf::with_config(model, 1, 1, EkfConfig::new(1.0_f32, 1e-4, 0.1)).unwrap();
    for _ in 0..60 {
        ekf.step(&[5.0]).unwrap();
    }
    assert!((ekf.state()[0] - 5.0).abs() < 0.01);
}

#[test]
fn filter_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Ekf<f64, Pendulum>>();
}
