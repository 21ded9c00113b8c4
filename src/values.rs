use anyhow::{ensure, Result};

/// A single source observation: a possibly-undefined value and its weight
/// (length for line features, cell area for raster cells).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueSample {
    pub value: Option<f64>,
    pub weight: f64,
}

impl ValueSample {
    pub fn new(value: Option<f64>, weight: f64) -> Self { Self { value, weight } }

    /// A sample counts only if its value is defined and finite and its weight is positive.
    #[inline]
    fn usable(&self) -> Option<(f64, f64)> {
        match self.value {
            Some(v) if v.is_finite() && self.weight.is_finite() && self.weight > 0.0 => Some((v, self.weight)),
            _ => None,
        }
    }
}

/// Nullable values with parallel weights, always scoped to a single zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueArray {
    values: Vec<Option<f64>>,
    weights: Vec<f64>,
}

impl ValueArray {
    /// Build from parallel value/weight columns.
    pub fn new(values: Vec<Option<f64>>, weights: Vec<f64>) -> Result<Self> {
        ensure!(values.len() == weights.len(),
            "[values] {} values but {} weights", values.len(), weights.len());
        Ok(Self { values, weights })
    }

    /// Build from raster cells sharing one implicit cell area. NaN cells are undefined.
    pub fn from_cells(cells: impl IntoIterator<Item = f64>, cell_area: f64) -> Self {
        let values = cells.into_iter()
            .map(|v| (!v.is_nan()).then_some(v))
            .collect::<Vec<_>>();
        let weights = vec![cell_area; values.len()];
        Self { values, weights }
    }

    /// Append one observation.
    pub fn push(&mut self, sample: ValueSample) {
        self.values.push(sample.value);
        self.weights.push(sample.weight);
    }

    /// Number of observations, including undefined ones.
    #[inline] pub fn len(&self) -> usize { self.values.len() }

    /// True if there are no observations at all.
    #[inline] pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Iterate over all observations.
    pub fn iter(&self) -> impl Iterator<Item = ValueSample> + '_ {
        self.values.iter().zip(&self.weights)
            .map(|(&value, &weight)| ValueSample { value, weight })
    }

    /// Iterate over `(value, weight)` pairs that take part in statistics.
    pub fn defined(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.iter().filter_map(|s| s.usable())
    }

    /// Number of observations that take part in statistics.
    pub fn defined_len(&self) -> usize { self.defined().count() }

    /// True if no observation takes part in statistics.
    pub fn has_no_data(&self) -> bool { self.defined().next().is_none() }
}

impl FromIterator<ValueSample> for ValueArray {
    fn from_iter<I: IntoIterator<Item = ValueSample>>(iter: I) -> Self {
        let mut array = Self::default();
        for sample in iter { array.push(sample) }
        array
    }
}

impl Extend<ValueSample> for ValueArray {
    fn extend<I: IntoIterator<Item = ValueSample>>(&mut self, iter: I) {
        for sample in iter { self.push(sample) }
    }
}
