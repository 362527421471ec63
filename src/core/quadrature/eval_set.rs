/// Memoized evaluations of a function on the uniform grid
/// `origin, origin + step, origin + 2 step, ...`.
///
/// Values are appended strictly in index order. Asking for an index beyond
/// the next unevaluated one is a caller bug and panics.
#[derive(Debug, Clone)]
pub struct EvalSet {
    origin: f64,
    step: f64,
    evaluations: Vec<f64>,
}

impl EvalSet {
    pub fn new(origin: f64, step: f64) -> Self {
        Self {
            origin,
            step,
            evaluations: Vec::new(),
        }
    }

    /// Value at `index`, evaluating `f` if this is the next grid point.
    pub fn get<F>(&mut self, index: usize, f: &F) -> f64
    where
        F: Fn(f64) -> f64,
    {
        if let Some(&y) = self.evaluations.get(index) {
            return y;
        }
        assert_eq!(
            index,
            self.evaluations.len(),
            "EvalSet accessed out of order: index {} requested with {} values stored",
            index,
            self.evaluations.len()
        );
        let y = f(self.x_at(index));
        self.evaluations.push(y);
        y
    }

    /// The argument that produced (or will produce) the value at `index`.
    pub fn x_at(&self, index: usize) -> f64 {
        self.origin + index as f64 * self.step
    }

    /// Number of stored evaluations.
    pub(crate) fn len(&self) -> usize {
        self.evaluations.len()
    }
}
