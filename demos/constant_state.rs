// Estimate a constant scalar from noisy readings.
//
// Run with `RUST_LOG=trace` to see each filter step.

use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tinyekf::{DynMatrix, DynVector, Ekf, EkfConfig, EkfError, FnModel};

const TRUTH: f64 = 5.0;
const STEPS: usize = 60;

fn main() -> Result<(), EkfError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let model = FnModel::new(
        |x: &DynVector<f64>| x.clone(),
        |_x: &DynVector<f64>| DynMatrix::eye(1),
        |x: &DynVector<f64>| x.clone(),
        |_x: &DynVector<f64>| DynMatrix::eye(1),
    );
    let mut ekf = Ekf::with_config(model, 1, 1, EkfConfig::new(1.0, 1e-4, 0.1))?;
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    for k in 1..=STEPS {
        let z = TRUTH + rng.gen_range(-0.3..0.3);
        let x = ekf.step(&[z])?;
        if k % 10 == 0 {
            info!(
                "step {:>3}: z = {:.4}, x = {:.4}, P = {:.6}",
                k,
                z,
                x[0],
                ekf.covariance()[(0, 0)]
            );
        }
    }

    let err = (ekf.state()[0] - TRUTH).abs();
    if err > 0.1 {
        warn!("estimate {:.4} is {:.4} from truth", ekf.state()[0], err);
    }
    println!("truth = {TRUTH}, estimate = {}", ekf.state());
    Ok(())
}
