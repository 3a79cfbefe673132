//! Normalized embedding vectors for visual similarity

/// Tolerance used when checking that a vector has unit length
pub const UNIT_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
	/// Create normalized embedding from raw data
	pub fn new(data: Vec<f32>) -> Self {
		let mut data = data;
		normalize_in_place(&mut data);
		Self(data)
	}

	pub fn as_slice(&self) -> &[f32] {
		&self.0
	}

	pub fn into_vec(self) -> Vec<f32> {
		self.0
	}

	pub fn dim(&self) -> usize {
		self.0.len()
	}

	pub fn is_unit(&self) -> bool {
		is_unit(&self.0)
	}
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f32]) -> f32 {
	v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale to unit length. Zero vectors are left untouched.
pub fn normalize_in_place(v: &mut [f32]) {
	let norm = l2_norm(v);
	if norm > 0.0 {
		v.iter_mut().for_each(|x| *x /= norm);
	}
}

/// Normalize every vector of a batch (idempotent for unit vectors)
pub fn normalize_all(vectors: &mut [Vec<f32>]) {
	for v in vectors.iter_mut() {
		normalize_in_place(v);
	}
}

pub fn is_unit(v: &[f32]) -> bool {
	(l2_norm(v) - 1.0).abs() <= UNIT_TOLERANCE
}
