use num::Float;

/// Evenly spaced samples, computed as `start + step * i` so that no rounding
/// error accumulates along the sequence.
pub struct Linspace<F> {
    start: F,
    step: F,
    index: usize,
    len: usize,
}

impl<F: Float> Linspace<F> {
    /// `n` samples from `min` to `max`, both included.
    pub fn new(min: F, max: F, n: usize) -> Self {
        let step = if n > 1 {
            let num_steps = F::from(n - 1).unwrap_or_else(F::one);
            (max - min) / num_steps
        } else {
            F::zero()
        };

        Self::with_step(min, step, n)
    }

    /// `n` samples starting at `start`, `step` apart.
    pub fn with_step(start: F, step: F, n: usize) -> Self {
        Linspace {
            start,
            step,
            index: 0,
            len: n,
        }
    }
}

impl<F: Float> Iterator for Linspace<F> {
    type Item = F;

    #[inline]
    fn next(&mut self) -> Option<F> {
        if self.index >= self.len {
            None
        } else {
            let i = F::from(self.index)?;
            self.index += 1;
            Some(self.start + self.step * i)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len - self.index;
        (n, Some(n))
    }
}

impl<F: Float> ExactSizeIterator for Linspace<F> {}

#[test]
fn test_linspace() {
    let samples: Vec<f64> = Linspace::new(-1., 1., 5).collect();

    assert_eq!(samples, vec![-1., -0.5, 0., 0.5, 1.]);

    let samples: Vec<f64> = Linspace::with_step(0., 0.25, 3).collect();

    assert_eq!(samples, vec![0., 0.25, 0.5]);
    assert_eq!(Linspace::new(2., 2., 1).collect::<Vec<f64>>(), vec![2.]);
    assert_eq!(Linspace::<f64>::new(0., 1., 0).len(), 0);
}
