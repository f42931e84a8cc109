/// Uniform (boxcar) averaging kernel.
///
/// Conventions:
/// - `len = 2*radius + 1`.
/// - every weight is `1/len`, so `sum(weights) == 1`.
/// - `radius = 0` is the identity kernel.
#[derive(Debug, Clone)]
pub struct BoxcarKernel1D {
    pub radius: usize,
    pub weights: Vec<f64>,
}

impl BoxcarKernel1D {
    pub fn new(radius: usize) -> Self {
        let len = 2 * radius + 1;
        let w = 1.0 / len as f64;
        Self {
            radius,
            weights: vec![w; len],
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
