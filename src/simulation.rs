//! Deterministic simulation of linear systems for tests and benchmarks.
//!
//! [`SimpleRng`] is a seeded Xorshift64 generator so that simulated runs are
//! reproducible across platforms. [`simulate`] propagates a linear system
//! with Gaussian process noise and produces noisy measurements, optionally
//! dropping every n-th one.

use nalgebra::{DMatrix, DVector};

use crate::types::Measurement;

/// Random number generator trait for deterministic testing.
pub trait Rng {
    /// Generate the next uint64 value
    fn next_u64(&mut self) -> u64;

    /// Generate a random f64 in [0, 1)
    fn rand(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a random f64 from standard normal distribution N(0, 1)
    /// Using Box-Muller transform
    fn randn(&mut self) -> f64 {
        // 1 - u keeps the logarithm finite
        let u1 = 1.0 - self.rand();
        let u2 = self.rand();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// Simple deterministic random number generator using Xorshift64.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new SimpleRng with the given seed.
    /// If seed is 0, uses 1 instead to avoid degenerate state.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }
}

impl Rng for SimpleRng {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

// Implement rand::RngCore to enable use with rand::Rng trait bound
impl rand::RngCore for SimpleRng {
    fn next_u32(&mut self) -> u32 {
        (Rng::next_u64(self) >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        Rng::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = Rng::next_u64(self).to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// A linear system driven by white Gaussian noise.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    /// State transition matrix F
    pub transition: DMatrix<f64>,
    /// Measurement matrix H
    pub observation: DMatrix<f64>,
    /// Standard deviation of the noise added to every state component per step
    pub process_noise_std: f64,
    /// Standard deviation of the noise added to every measurement component
    pub measurement_noise_std: f64,
}

/// Output of [`simulate`]
#[derive(Debug, Clone)]
pub struct SimulatedRun {
    /// True state at each step
    pub states: Vec<DVector<f64>>,
    /// Observation at each step
    pub measurements: Vec<Measurement>,
}

/// Simulate a linear system.
///
/// At each step the true state is advanced (`x ← F·x + w`) and then observed
/// (`z = H·x + v`).
///
/// # Arguments
/// * `rng` - Random number generator
/// * `system` - System matrices and noise levels
/// * `x0` - Initial true state
/// * `steps` - Number of steps to simulate
/// * `missing_every` - If `Some(n)`, every n-th measurement is [`Measurement::Missing`]
pub fn simulate<R: Rng>(
    rng: &mut R,
    system: &LinearSystem,
    x0: &DVector<f64>,
    steps: usize,
    missing_every: Option<usize>,
) -> SimulatedRun {
    let nx = system.transition.nrows();
    let nz = system.observation.nrows();

    let mut x = x0.clone();
    let mut states = Vec::with_capacity(steps);
    let mut measurements = Vec::with_capacity(steps);

    for k in 0..steps {
        let w = DVector::from_fn(nx, |_, _| system.process_noise_std * rng.randn());
        x = &system.transition * &x + w;

        let dropped = matches!(missing_every, Some(n) if n > 0 && (k + 1) % n == 0);
        let measurement = if dropped {
            Measurement::Missing
        } else {
            let v = DVector::from_fn(nz, |_, _| system.measurement_noise_std * rng.randn());
            Measurement::Present(&system.observation * &x + v)
        };

        states.push(x.clone());
        measurements.push(measurement);
    }

    SimulatedRun {
        states,
        measurements,
    }
}
