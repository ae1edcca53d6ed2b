//! Typed payloads carried by hub entries.
//!
//! Each variant belongs to exactly one [`Category`]. Payloads are plain owned
//! data, so `Clone` is a full structural copy and nothing a reader does to a
//! returned value can reach the copy held by the store.

use serde::{Deserialize, Serialize};

use super::category::Category;

/// A complex number as exchanged between the complex-plane and quantum tabs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexValue {
    pub re: f64,
    pub im: f64,
}

impl ComplexValue {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn magnitude(&self) -> f64 {
        self.re.hypot(self.im)
    }
}

/// Training samples: one input row and one output row per sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub inputs: Vec<Vec<f64>>,
    pub outputs: Vec<Vec<f64>>,
}

impl Dataset {
    pub fn new(inputs: Vec<Vec<f64>>, outputs: Vec<Vec<f64>>) -> Self {
        Self { inputs, outputs }
    }

    /// Number of samples, counted on the input side
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Data published by a producer tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Payload {
    /// Row-major 2D matrix
    Matrix(Vec<Vec<f64>>),
    Array(Vec<f64>),
    Scalar(f64),
    /// Function expression in the calculus tab's syntax, e.g. `"sin(x) * x^2"`
    Function(String),
    Complex(ComplexValue),
    Dataset(Dataset),
    Vector(Vec<f64>),
}

impl Payload {
    /// The only category this payload may be stored under
    pub fn category(&self) -> Category {
        match self {
            Payload::Matrix(_) => Category::Matrices,
            Payload::Array(_) => Category::Arrays,
            Payload::Scalar(_) => Category::Scalars,
            Payload::Function(_) => Category::Functions,
            Payload::Complex(_) => Category::Complex,
            Payload::Dataset(_) => Category::Datasets,
            Payload::Vector(_) => Category::Vectors,
        }
    }

    /// `(rows, cols)` for payloads with a tabular shape
    ///
    /// Arrays and vectors are reported as a single column. A dataset reports
    /// its sample count and input width. Matrix width is taken from the first
    /// row; ragged rows are not checked.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        match self {
            Payload::Matrix(rows) => Some((rows.len(), rows.first().map_or(0, Vec::len))),
            Payload::Array(values) | Payload::Vector(values) => Some((values.len(), 1)),
            Payload::Dataset(dataset) => Some((
                dataset.len(),
                dataset.inputs.first().map_or(0, Vec::len),
            )),
            Payload::Scalar(_) | Payload::Function(_) | Payload::Complex(_) => None,
        }
    }

    /// `false` if any number is NaN or infinite
    ///
    /// JSON has no representation for those values, so the hub refuses them.
    pub fn is_finite(&self) -> bool {
        let all_finite = |values: &[f64]| values.iter().all(|value| value.is_finite());
        match self {
            Payload::Matrix(rows) => rows.iter().all(|row| all_finite(row)),
            Payload::Array(values) | Payload::Vector(values) => all_finite(values),
            Payload::Scalar(value) => value.is_finite(),
            Payload::Function(_) => true,
            Payload::Complex(value) => value.re.is_finite() && value.im.is_finite(),
            Payload::Dataset(dataset) => dataset
                .inputs
                .iter()
                .chain(&dataset.outputs)
                .all(|row| all_finite(row)),
        }
    }

    pub fn as_matrix(&self) -> Option<&[Vec<f64>]> {
        match self {
            Payload::Matrix(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Payload::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<ComplexValue> {
        match self {
            Payload::Complex(value) => Some(*value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_finite() {
        assert!(Payload::Matrix(vec![vec![1.0, -2.5]]).is_finite());
        assert!(Payload::Function("1/x".to_string()).is_finite());
        assert!(!Payload::Scalar(f64::NAN).is_finite());
        assert!(!Payload::Array(vec![0.0, f64::INFINITY]).is_finite());
        assert!(!Payload::Matrix(vec![vec![1.0], vec![f64::NEG_INFINITY]]).is_finite());
        assert!(!Payload::Complex(ComplexValue::new(0.0, f64::NAN)).is_finite());
        assert!(!Payload::Dataset(Dataset::new(vec![vec![0.0]], vec![vec![f64::NAN]])).is_finite());
    }

    #[test]
    fn test_payload_categories() {
        assert_eq!(Payload::Matrix(vec![]).category(), Category::Matrices);
        assert_eq!(Payload::Array(vec![]).category(), Category::Arrays);
        assert_eq!(Payload::Scalar(1.5).category(), Category::Scalars);
        assert_eq!(
            Payload::Function("x^2".to_string()).category(),
            Category::Functions
        );
        assert_eq!(
            Payload::Complex(ComplexValue::new(0.0, 1.0)).category(),
            Category::Complex
        );
        assert_eq!(
            Payload::Dataset(Dataset::default()).category(),
            Category::Datasets
        );
        assert_eq!(Payload::Vector(vec![1.0]).category(), Category::Vectors);
    }

    #[test]
    fn test_dimensions() {
        let matrix = Payload::Matrix(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(matrix.dimensions(), Some((2, 3)));
        assert_eq!(Payload::Matrix(vec![]).dimensions(), Some((0, 0)));
        assert_eq!(Payload::Vector(vec![1.0, 2.0]).dimensions(), Some((2, 1)));
        assert_eq!(Payload::Scalar(3.0).dimensions(), None);

        let xor = Dataset::new(
            vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
            vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
        );
        assert_eq!(Payload::Dataset(xor).dimensions(), Some((4, 2)));
    }

    #[test]
    fn test_tagged_json_shape() {
        let json = serde_json::to_value(Payload::Complex(ComplexValue::new(1.0, -2.0))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "complex", "data": { "re": 1.0, "im": -2.0 } })
        );
    }

    #[test]
    fn test_complex_magnitude() {
        assert_eq!(ComplexValue::new(3.0, 4.0).magnitude(), 5.0);
    }
}
