//! Integer token tensors as exchanged with the benchmark loop

use serde::{Deserialize, Serialize};

/// A 1-D or rectangular 2-D tensor of token IDs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenTensor {
    /// One sequence
    Single(Vec<i64>),
    /// A right-padded batch of sequences
    Batch(Vec<Vec<i64>>),
}

impl TokenTensor {
    /// Number of dimensions: 1 for a single sequence, 2 for a batch
    #[must_use]
    pub fn dim(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(_) => 2,
        }
    }

    /// `(rows, columns)`; a single sequence counts as one row
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::Single(ids) => (1, ids.len()),
            Self::Batch(rows) => (rows.len(), rows.first().map_or(0, Vec::len)),
        }
    }

    /// Every sequence with `pad_token_id` entries removed
    #[must_use]
    pub fn unpadded(&self, pad_token_id: i64) -> Vec<Vec<i64>> {
        match self {
            Self::Single(ids) => vec![strip_padding(ids, pad_token_id)],
            Self::Batch(rows) => rows
                .iter()
                .map(|row| strip_padding(row, pad_token_id))
                .collect(),
        }
    }

    /// Rows of the tensor, a single sequence being one row
    #[must_use]
    pub fn rows(&self) -> Vec<&[i64]> {
        match self {
            Self::Single(ids) => vec![ids.as_slice()],
            Self::Batch(rows) => rows.iter().map(Vec::as_slice).collect(),
        }
    }
}

/// Remove every occurrence of `pad_token_id`
#[must_use]
pub fn strip_padding(ids: &[i64], pad_token_id: i64) -> Vec<i64> {
    ids.iter()
        .copied()
        .filter(|&id| id != pad_token_id)
        .collect()
}

/// Right-pad every sequence to the longest one
#[must_use]
pub fn pad_sequences(sequences: Vec<Vec<i64>>, pad_token_id: i64) -> Vec<Vec<i64>> {
    let max_len = sequences.iter().map(Vec::len).max().unwrap_or(0);
    sequences
        .into_iter()
        .map(|mut seq| {
            seq.resize(max_len, pad_token_id);
            seq
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_sequences() {
        let padded = pad_sequences(vec![vec![1, 2, 3], vec![4], vec![]], -1);
        assert_eq!(padded, vec![vec![1, 2, 3], vec![4, -1, -1], vec![-1, -1, -1]]);
        assert!(pad_sequences(Vec::new(), 0).is_empty());
    }

    #[test]
    fn test_unpadded_removes_interior_padding_too() {
        let tensor = TokenTensor::Batch(vec![vec![5, 0, 6, 0], vec![7, 8, 9, 10]]);
        assert_eq!(tensor.unpadded(0), vec![vec![5, 6], vec![7, 8, 9, 10]]);

        let single = TokenTensor::Single(vec![0, 1, 0]);
        assert_eq!(single.unpadded(0), vec![vec![1]]);
    }

    #[test]
    fn test_shape_and_dim() {
        let batch = TokenTensor::Batch(vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(batch.dim(), 2);
        assert_eq!(batch.shape(), (2, 2));
        assert!(matches!(batch, TokenTensor::Batch(_)));

        let single = TokenTensor::Single(vec![1, 2, 3]);
        assert_eq!(single.dim(), 1);
        assert_eq!(single.shape(), (1, 3));
        assert_eq!(single.rows(), vec![&[1, 2, 3][..]]);
    }

    #[test]
    fn test_serde_shape() {
        let batch: TokenTensor = serde_json::from_str("[[1, 2], [3, -1]]").unwrap();
        assert!(matches!(batch, TokenTensor::Batch(_)));
        let single: TokenTensor = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(single, TokenTensor::Single(vec![1, 2]));
    }
}
