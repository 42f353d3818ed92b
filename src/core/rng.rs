// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f};

const PCG32_DEFAULT_STATE: u64 = 0x853c49e6748fea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e39cb94b95bdb;
const PCG32_MULT: u64 = 0x5851f42d4c957f2d;

/// PCG32 (XSH-RR) generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Default for Pcg32 {
    fn default() -> Self {
        Self { state: PCG32_DEFAULT_STATE, inc: PCG32_DEFAULT_STREAM }
    }
}

impl Pcg32 {
    pub fn new(init_state: u64, init_seq: u64) -> Self {
        let mut rng = Self::default();
        rng.seed(init_state, init_seq);
        rng
    }

    pub fn seed(&mut self, init_state: u64, init_seq: u64) {
        self.state = 0;
        self.inc = (init_seq << 1) | 1;
        self.next_u32();
        self.state = self.state.wrapping_add(init_state);
        self.next_u32();
    }

    pub fn next_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);
        let xorshifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform in `[0, 1)`, built from the top 23 bits as a float mantissa.
    pub fn next_f32(&mut self) -> Float {
        let bits = (self.next_u32() >> 9) | 0x3f80_0000;
        f32::from_bits(bits) - 1.0
    }
}

/// One independent stream, owned by exactly one worker thread.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomSampler {
    rng: Pcg32,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        Self { rng: Pcg32::new(seed, 1) }
    }

    /// Seeds a worker stream from its thread index and the scene generation.
    pub fn for_worker(thread_index: usize, generation: u64) -> Self {
        Self { rng: Pcg32::new(thread_index as u64, generation.wrapping_add(1)) }
    }

    pub fn next_1d(&mut self) -> Float {
        self.rng.next_f32()
    }

    pub fn next_2d(&mut self) -> Vector2f {
        let x = self.rng.next_f32();
        let y = self.rng.next_f32();
        Vector2f::new(x, y)
    }

    pub fn next_3d(&mut self) -> Vector3f {
        let x = self.rng.next_f32();
        let y = self.rng.next_f32();
        let z = self.rng.next_f32();
        Vector3f::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcg32_reference_sequence() {
        // Reference output of pcg32_random_r seeded with (42, 54).
        let mut rng = Pcg32::new(42, 54);
        let expected: [u32; 6] = [0xa15c02b7, 0x7b47f409, 0xba1d3330,
                                  0x83d2f293, 0xbfa4784b, 0xcbed606e];
        for e in expected.iter() {
            assert_eq!(rng.next_u32(), *e);
        }
    }

    #[test]
    fn test_floats_in_unit_interval() {
        let mut rng = Pcg32::new(1, 1);
        let mut sum = 0.0f64;
        let n = 10000;
        for _ in 0..n {
            let u = rng.next_f32();
            assert!(u >= 0.0 && u < 1.0);
            sum += u as f64;
        }
        assert!((sum / n as f64 - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_worker_streams_are_deterministic_and_distinct() {
        let mut a = RandomSampler::for_worker(0, 3);
        let mut b = RandomSampler::for_worker(0, 3);
        let mut c = RandomSampler::for_worker(1, 3);
        let mut d = RandomSampler::for_worker(0, 4);
        let xa = a.next_3d();
        assert_eq!(xa, b.next_3d());
        assert_ne!(xa, c.next_3d());
        assert_ne!(xa, d.next_3d());
    }
}
