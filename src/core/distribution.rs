// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f};

// Floor applied to every weight so all-zero inputs still normalise.
const MIN_WEIGHT: Float = 1e-6;

/// Piecewise-constant distribution over `n` bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution1D {
    cdf: Vec<Float>,
}

impl Distribution1D {
    pub fn new(weights: &[Float]) -> Self {
        if weights.is_empty() {
            return Self { cdf: vec![1.0] };
        }

        let mut cdf = Vec::with_capacity(weights.len());
        let mut running = 0.0f64;
        for w in weights {
            let w = if w.is_finite() { w.max(0.0) } else { 0.0 };
            running += w.max(MIN_WEIGHT) as f64;
            cdf.push(running);
        }

        let total = running;
        let mut cdf: Vec<Float> = cdf.into_iter().map(|c| (c / total) as Float).collect();
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        Self { cdf }
    }

    pub fn len(&self) -> usize {
        self.cdf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cdf.is_empty()
    }

    /// Draws a bin; returns `(index, probability mass of that bin)`.
    pub fn sample(&self, u: Float) -> (usize, Float) {
        // Lower bound: first bin whose cumulative value exceeds `u`.
        let idx = self.cdf.partition_point(|&c| c <= u).min(self.cdf.len() - 1);
        (idx, self.pdf(idx))
    }

    pub fn pdf(&self, index: usize) -> Float {
        match index {
            i if i >= self.cdf.len() => 0.0,
            0 => self.cdf[0],
            i => self.cdf[i] - self.cdf[i - 1],
        }
    }
}

/// Row-major 2D distribution: marginal over rows, conditional over columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution2D {
    width: usize,
    height: usize,
    marginal: Distribution1D,
    conditionals: Vec<Distribution1D>,
}

impl Distribution2D {
    pub fn new(weights: &[Float], width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let mut conditionals = Vec::with_capacity(height);
        let mut row_sums = Vec::with_capacity(height);
        for y in 0..height {
            let row: Vec<Float> = (0..width)
                .map(|x| weights.get(y * width + x).cloned().unwrap_or(0.0))
                .map(|w| if w.is_finite() { w.max(MIN_WEIGHT) } else { MIN_WEIGHT })
                .collect();
            row_sums.push(row.iter().sum::<Float>());
            conditionals.push(Distribution1D::new(&row));
        }

        Self { width, height, marginal: Distribution1D::new(&row_sums), conditionals }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns `((column, row), pdf)` with the pdf in per-bin units.
    pub fn sample(&self, u: &Vector2f) -> ((usize, usize), Float) {
        let (y, pdf_row) = self.marginal.sample(u.y);
        let (x, pdf_col) = self.conditionals[y].sample(u.x);
        ((x, y), pdf_row * pdf_col)
    }

    pub fn pdf(&self, x: usize, y: usize) -> Float {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.marginal.pdf(y) * self.conditionals[y].pdf(x)
    }
}
