//! Seeded series generators shared by the unit tests.
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use rand_distr::Normal;

pub fn gaussian_noise(n: usize, sd: f64, seed: u64) -> Vec<f64> {
  let dist = Normal::new(0.0, sd).unwrap();
  let mut rng = StdRng::seed_from_u64(seed);
  (0..n).map(|_| dist.sample(&mut rng)).collect()
}

pub fn simulate_ar1(phi: f64, n: usize, seed: u64) -> Vec<f64> {
  let innovations = gaussian_noise(n, 1.0, seed);
  let mut x = vec![0.0; n];
  for t in 1..n {
    x[t] = phi * x[t - 1] + innovations[t];
  }
  x
}

pub fn simulate_random_walk(n: usize, seed: u64) -> Vec<f64> {
  simulate_ar1(1.0, n, seed)
}

/// `low` up to index `at - 1`, `high` from `at` on, plus noise.
pub fn level_shift(n: usize, at: usize, low: f64, high: f64, sd: f64, seed: u64) -> Vec<f64> {
  gaussian_noise(n, sd, seed)
    .into_iter()
    .enumerate()
    .map(|(t, e)| if t < at { low + e } else { high + e })
    .collect()
}
