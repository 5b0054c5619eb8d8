/// Square matrix of association weights that grows one symbol at a time.
///
/// Rows live in a flat buffer addressed as `row * stride + column`.
/// `stride` is the row capacity; when the matrix outgrows it every row is
/// copied into a buffer with twice the stride.
///
/// # Invariants
/// - `size <= stride` and `weights.len() == stride * stride`
/// - Only the leading `size x size` block is meaningful
#[derive(Clone, Debug, Default)]
pub(crate) struct WeightMatrix {
	weights: Vec<f64>,
	stride: usize,
	size: usize,
}

impl WeightMatrix {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn size(&self) -> usize {
		self.size
	}

	pub(crate) fn row(&self, row: usize) -> &[f64] {
		let start = row * self.stride;
		&self.weights[start..start + self.size]
	}

	pub(crate) fn row_mut(&mut self, row: usize) -> &mut [f64] {
		let start = row * self.stride;
		&mut self.weights[start..start + self.size]
	}

	/// Adds one row and one column.
	///
	/// The new row is filled with `initial`. Every existing row gets a new
	/// column holding its own minimum before the append.
	pub(crate) fn grow(&mut self, initial: f64) {
		if self.size == self.stride {
			self.restride((self.stride * 2).max(1));
		}

		let column = self.size;
		for row in 0..self.size {
			let start = row * self.stride;
			let floor = row_min(&self.weights[start..start + self.size]);
			self.weights[start + column] = floor;
		}

		self.size += 1;
		self.row_mut(column).fill(initial);
	}

	fn restride(&mut self, stride: usize) {
		let mut weights = vec![0.0; stride * stride];
		for row in 0..self.size {
			let from = row * self.stride;
			let to = row * stride;
			weights[to..to + self.size].copy_from_slice(&self.weights[from..from + self.size]);
		}
		tracing::trace!(from = self.stride, to = stride, "restride weight matrix");
		self.weights = weights;
		self.stride = stride;
	}
}

/// Smallest weight of a row. Rows are never empty once they exist.
pub(crate) fn row_min(row: &[f64]) -> f64 {
	row.iter().copied().fold(f64::INFINITY, f64::min)
}
