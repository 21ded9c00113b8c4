/// Round to two decimal places, the precision of every reported statistic.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Neumaier compensated summation.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    #[inline]
    pub(crate) fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    #[inline] pub(crate) fn total(&self) -> f64 { self.sum + self.compensation }
}

impl FromIterator<f64> for CompensatedSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::default();
        for x in iter { acc.add(x) }
        acc
    }
}

/// Sum an iterator of f64 with compensation.
#[inline]
pub(crate) fn exact_sum(iter: impl IntoIterator<Item = f64>) -> f64 {
    iter.into_iter().collect::<CompensatedSum>().total()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round2(1.625), 1.63);
        assert_eq!(round2(-0.004), -0.0);
        assert_eq!(round2(33.333333), 33.33);
    }

    #[test]
    fn compensated_sum_recovers_small_terms() {
        let values = [1e16, 1.0, -1e16, 1.0];
        assert_eq!(exact_sum(values), 2.0);
    }
}
