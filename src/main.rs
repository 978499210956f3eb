//! Perceptron training harness.
//!
//! Trains a 2-2-1 perceptron (bias enabled, steep sigmoid) to recognise
//! near-diagonal points: f([x, y]) = 1 iff (x − y)² < 0.01 on normalised
//! inputs. Batch training with the adaptive learning-rate criterion, then a
//! generalisation check on fresh samples.
//!
//! Positional arguments (all optional):
//!
//! ```text
//! loops alpha sigma learn_rate verbose rng_seed
//! ```
//!
//! Exit code 0 iff the network both learned the training set (final
//! squared error ≤ sigma) and generalised at or above `learn_rate`.

use std::env;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use neurograph::{
    AdaptiveRate, Dataset, Features, Logistic, Perceptron, Result, UniformWeights,
    RAND_WEIGHT_MAX, RAND_WEIGHT_MIN,
};

const INPUT_D: usize = 2;

/// The learned function: 1 iff the point is close to the diagonal.
fn f(x: &[f64]) -> Vec<f64> {
    let d = x[0] - x[1];
    vec![if d * d < 0.01 { 1.0 } else { 0.0 }]
}

/// Scales a vector by the reciprocal of its squared norm.
fn normalise(x: &mut [f64]) {
    let sum_sq: f64 = x.iter().map(|&v| v * v).sum();
    for v in x.iter_mut() {
        *v /= sum_sq;
    }
}

fn sample(rng: &mut UniformWeights) -> Vec<f64> {
    let mut x: Vec<f64> = (0..INPUT_D).map(|_| rng.sample()).collect();
    normalise(&mut x);
    x
}

fn run(
    loops: usize,
    alpha: f64,
    sigma: f64,
    learn_rate: f64,
    verbose: bool,
    rng_seed: u64,
) -> Result<bool> {
    println!("Initial learning factor: {alpha}");
    println!("Acceptable error: {sigma}");
    println!("Acceptable learn rate: {learn_rate}");

    let mut weights = UniformWeights::seeded(RAND_WEIGHT_MIN, RAND_WEIGHT_MAX, rng_seed)?;
    let mut nn = Perceptron::with_layers(
        &[INPUT_D, 2, 1],
        || weights.sample(),
        Features::BIAS,
        Logistic::steep(15.0),
    )?;

    // Equal seeds would replay the weight generator's step sequence,
    // merely rescaled; the sample stream needs its own seed.
    let mut rng = UniformWeights::seeded(-10.0, 10.0, rng_seed ^ 0x9E37_79B9_7F4A_7C15)?;

    // Generate the training set.
    let mut inputs = Vec::with_capacity(100);
    let mut targets = Vec::with_capacity(100);
    for _ in 0..100 {
        let x = sample(&mut rng);
        let y = f(&x);

        if verbose {
            println!("f[{},{}] == [{}]", x[0], x[1], y[0]);
        }

        inputs.push(x);
        targets.push(y);
    }
    let set = Dataset::from_rows(&inputs, &targets)?;

    // Train.
    let mut training = nn.training();
    let mut criterion = AdaptiveRate::new(sigma, alpha);

    let mut en2 = 0.0;
    let mut en2_order = -1.0;
    for i in 0..loops {
        en2 = training.train_batch(nn.topology_mut(), &set, &mut criterion)?;

        // Print each order-of-magnitude improvement or regression.
        let en2_fraction = en2 / en2_order;
        if verbose || !(0.1..10.0).contains(&en2_fraction) {
            println!("Loop {}: |err|^2 == {en2}", i + 1);
            en2_order = en2;
        }

        // Batch training: once there was no update, there will never be
        // another one for the same set.
        if !criterion.updated() {
            break;
        }
    }

    let mut learned = true;
    if en2 > sigma {
        println!("Failed to learn");
        learned = false;
    }

    // Test generalisation on fresh samples.
    let mut function = nn.function()?;

    println!(
        "Test samples{}:",
        if verbose { "" } else { " (only failed)" }
    );

    let test_cnt = 500;
    let mut fail_cnt = 0;
    for _ in 0..test_cnt {
        let x = sample(&mut rng);
        let y = f(&x);
        let nn_y = function.call(&x)?;

        let err = nn_y[0] - y[0];
        let err_rounded = if nn_y[0] < 0.5 { 0.0 } else { 1.0 } - y[0];
        let err_n2 = err * err;
        let err_rn2 = err_rounded * err_rounded;

        let failed = err_rn2 > sigma * 10.0;

        if verbose || failed {
            println!("x == [{},{}]", x[0], x[1]);
            println!("f(x) == [{}]", y[0]);
            println!("net_f(x) == [{}]", nn_y[0]);
            println!("|err|^2 == {err_n2}");
            println!("Rounded output |err|^2 == {err_rn2}");
        }

        if failed {
            println!("Failed to generalise");
            fail_cnt += 1;
        }
    }

    let success_rate = 1.0 - fail_cnt as f64 / f64::from(test_cnt);
    println!("Successful on {} % of test samples", success_rate * 100.0);

    Ok(learned && success_rate >= learn_rate)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let loops = args
        .first()
        .and_then(|a| a.parse().ok())
        .unwrap_or(1000_usize);
    let alpha = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(0.1);
    let sigma = args.get(2).and_then(|a| a.parse().ok()).unwrap_or(1e-10);
    let learn_rate = args.get(3).and_then(|a| a.parse().ok()).unwrap_or(0.95);
    let verbose = args.get(4).map(String::as_str) == Some("verbose");
    let rng_seed = args.get(5).and_then(|a| a.parse().ok()).unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    });

    eprintln!("RNG seeded with {rng_seed}");

    match run(loops, alpha, sigma, learn_rate, verbose, rng_seed) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(64),
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(128)
        }
    }
}
