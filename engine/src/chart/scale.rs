// Linear value-to-pixel mapping for one chart panel.

#[derive(Debug, Clone, Copy)]
pub(crate) struct LinearScale {
    min: f64,
    max: f64,
    top: f64,
    height: f64,
}

impl LinearScale {
    /// Pads the value range by `padding` (a fraction of the span) on both
    /// sides. A degenerate range is widened so the scale never divides by zero.
    pub(crate) fn padded(min: f64, max: f64, padding: f64, top: f64, height: f64) -> Self {
        let (mut min, mut max) = if min <= max { (min, max) } else { (max, min) };
        let span = max - min;
        if span > 0.0 {
            min -= span * padding;
            max += span * padding;
        } else {
            let pad = if min.abs() > 0.0 { min.abs() * 0.01 } else { 1.0 };
            min -= pad;
            max += pad;
        }
        Self { min, max, top, height }
    }

    /// Scale anchored at zero, for volumes.
    pub(crate) fn from_zero(max: f64, top: f64, height: f64) -> Self {
        let max = if max > 0.0 { max } else { 1.0 };
        Self { min: 0.0, max, top, height }
    }

    pub(crate) fn to_y(&self, value: f64) -> f64 {
        self.top + (self.max - value) * (self.height / (self.max - self.min))
    }

    /// `count` evenly spaced values from min to max inclusive.
    pub(crate) fn ticks(&self, count: usize) -> Vec<f64> {
        if count < 2 {
            return vec![self.min];
        }
        let step = (self.max - self.min) / (count - 1) as f64;
        (0..count).map(|i| self.min + step * i as f64).collect()
    }
}
