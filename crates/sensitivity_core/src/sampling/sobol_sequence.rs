//! Sobol low-discrepancy sequence
//!
//! Gray-code generator over 32-bit direction numbers built from the Joe and Kuo
//! primitive polynomial table. The first point of the sequence is the origin.

use crate::error::{AnalysisError, Result};

const BITS: usize = 32;

/// `(degree, polynomial coefficients, initial direction numbers)` for
/// dimensions 2 and up. Dimension 1 uses the identity direction numbers.
const DIRECTIONS: &[(u32, u32, &[u32])] = &[
    (1, 0, &[1]),
    (2, 1, &[1, 3]),
    (3, 1, &[1, 3, 1]),
    (3, 2, &[1, 1, 1]),
    (4, 1, &[1, 1, 3, 3]),
    (4, 4, &[1, 3, 5, 13]),
    (5, 2, &[1, 1, 5, 5, 17]),
    (5, 4, &[1, 1, 5, 5, 5]),
    (5, 7, &[1, 1, 7, 11, 19]),
    (5, 11, &[1, 1, 5, 1, 1]),
    (5, 13, &[1, 1, 1, 3, 11]),
    (5, 14, &[1, 3, 5, 5, 31]),
    (6, 1, &[1, 3, 3, 9, 7, 49]),
    (6, 13, &[1, 1, 1, 15, 21, 21]),
    (6, 16, &[1, 3, 1, 13, 27, 49]),
    (6, 19, &[1, 1, 1, 15, 7, 5]),
    (6, 22, &[1, 3, 1, 15, 13, 25]),
    (6, 25, &[1, 1, 5, 5, 19, 61]),
    (7, 1, &[1, 3, 7, 11, 23, 15, 103]),
    (7, 4, &[1, 3, 7, 13, 13, 15, 69]),
    (7, 7, &[1, 1, 3, 13, 7, 35, 63]),
    (7, 8, &[1, 3, 5, 9, 1, 25, 53]),
    (7, 14, &[1, 3, 1, 13, 9, 35, 107]),
    (7, 19, &[1, 3, 1, 5, 27, 61, 31]),
    (7, 21, &[1, 1, 5, 11, 19, 41, 61]),
    (7, 28, &[1, 3, 5, 3, 3, 13, 69]),
    (7, 31, &[1, 1, 7, 13, 1, 19, 1]),
    (7, 32, &[1, 3, 7, 5, 13, 19, 59]),
    (7, 37, &[1, 1, 3, 9, 25, 29, 41]),
    (7, 41, &[1, 3, 5, 13, 23, 1, 55]),
    (7, 42, &[1, 3, 7, 3, 13, 59, 17]),
    (7, 50, &[1, 3, 1, 3, 5, 53, 69]),
    (7, 55, &[1, 1, 5, 5, 23, 33, 13]),
    (7, 56, &[1, 1, 7, 7, 1, 61, 123]),
    (7, 59, &[1, 1, 7, 9, 13, 61, 49]),
    (7, 62, &[1, 1, 3, 5, 3, 55, 33]),
];

/// Largest dimension the direction table supports
pub const MAX_DIMENSIONS: usize = DIRECTIONS.len() + 1;

/// Iterator over points of the unit hypercube
#[derive(Debug, Clone)]
pub struct SobolSequence {
    directions: Vec<[u32; BITS]>,
    state: Vec<u32>,
    index: u64,
}

impl SobolSequence {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 || dimensions > MAX_DIMENSIONS {
            return Err(AnalysisError::Config(format!(
                "Sobol sequence supports 1 to {MAX_DIMENSIONS} dimensions, got {dimensions}"
            )));
        }

        let mut directions = Vec::with_capacity(dimensions);
        directions.push(std::array::from_fn(|i| 1u32 << (BITS - 1 - i)));
        for &(degree, coeffs, initial) in &DIRECTIONS[..dimensions - 1] {
            directions.push(direction_numbers(degree as usize, coeffs, initial));
        }

        Ok(Self {
            directions,
            state: vec![0; dimensions],
            index: 0,
        })
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.directions.len()
    }

    /// Skip ahead `count` points
    pub fn skip_points(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn advance(&mut self) {
        // Gray code: flip the bit at the lowest zero of the current index
        let bit = (self.index.trailing_ones() as usize).min(BITS - 1);
        for (x, v) in self.state.iter_mut().zip(&self.directions) {
            *x ^= v[bit];
        }
        self.index += 1;
    }

    fn current(&self) -> Vec<f64> {
        const SCALE: f64 = (1u64 << BITS) as f64;
        self.state.iter().map(|&x| f64::from(x) / SCALE).collect()
    }
}

impl Iterator for SobolSequence {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Vec<f64>> {
        let point = self.current();
        self.advance();
        Some(point)
    }
}

fn direction_numbers(degree: usize, coeffs: u32, initial: &[u32]) -> [u32; BITS] {
    let mut v = [0u32; BITS];
    for (i, &m) in initial.iter().enumerate() {
        v[i] = m << (BITS - 1 - i);
    }
    for i in degree..BITS {
        let mut value = v[i - degree] ^ (v[i - degree] >> degree);
        for k in 1..degree {
            if (coeffs >> (degree - 1 - k)) & 1 == 1 {
                value ^= v[i - k];
            }
        }
        v[i] = value;
    }
    v
}
