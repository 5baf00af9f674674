//! Extended data squares and availability headers.
//!
//! Erasure coding is a pluggable [`SquareCodec`]; this module only defines the
//! shapes the pipeline passes around, plus [`XorSquareCodec`], a reference
//! codec for local networks and tests.

use alloy_primitives::B256;
use dalc_types::Share;
use rs_merkle::{algorithms::Sha256, Hasher, MerkleTree};
use serde::{Deserialize, Serialize};

use crate::{DaError, Result};

/// Erasure-coded expansion of a block's `k x k` original shares to `2k x 2k`.
///
/// Shares are stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedDataSquare {
    width: usize,
    shares: Vec<Vec<u8>>,
}

impl ExtendedDataSquare {
    /// Build a square from `width * width` row-major shares.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::Consistency`] if the share count does not match.
    pub fn new(width: usize, shares: Vec<Vec<u8>>) -> Result<Self> {
        if width == 0 || shares.len() != width * width {
            return Err(DaError::Consistency(format!(
                "extended square of width {width} needs {} shares, got {}",
                width * width,
                shares.len()
            )));
        }
        Ok(Self { width, shares })
    }

    /// Side length of the extended square.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Share at `(row, col)`.
    #[must_use]
    pub fn share(&self, row: usize, col: usize) -> &[u8] {
        &self.shares[row * self.width + col]
    }

    /// Shares of row `row`.
    #[must_use]
    pub fn row(&self, row: usize) -> &[Vec<u8>] {
        &self.shares[row * self.width..(row + 1) * self.width]
    }

    /// Shares of column `col`.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &[u8]> {
        (0..self.width).map(move |row| self.share(row, col))
    }
}

/// Row and column commitment roots over an extended data square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityHeader {
    /// One root per extended row.
    pub row_roots: Vec<B256>,
    /// One root per extended column.
    pub column_roots: Vec<B256>,
}

impl AvailabilityHeader {
    /// Side length of the extended square the header commits to.
    #[must_use]
    pub fn width(&self) -> usize {
        self.row_roots.len()
    }

    /// Single hash committing to all row and column roots.
    #[must_use]
    pub fn hash(&self) -> B256 {
        let roots = self.row_roots.iter().chain(&self.column_roots);
        B256::from(merkle_root(roots.map(|r| r.as_slice())))
    }
}

/// Erasure coding used to derive availability headers.
///
/// Implementations are pure: the same inputs always yield the same square.
pub trait SquareCodec: Send + Sync {
    /// Extend `square_size * square_size` original shares to double width.
    ///
    /// # Errors
    ///
    /// Returns an error if the shares do not form a square of `square_size`.
    fn extend_shares(&self, square_size: usize, shares: &[Share]) -> Result<ExtendedDataSquare>;

    /// Derive the row and column roots of an extended square.
    fn compute_header(&self, eds: &ExtendedDataSquare) -> AvailabilityHeader {
        let row_roots = (0..eds.width())
            .map(|r| B256::from(merkle_root(eds.row(r).iter().map(Vec::as_slice))))
            .collect();
        let column_roots = (0..eds.width())
            .map(|c| B256::from(merkle_root(eds.column(c))))
            .collect();
        AvailabilityHeader {
            row_roots,
            column_roots,
        }
    }
}

/// Reference codec extending rows and columns with XOR parity.
///
/// Parity share `j` of a row is `row[j] ^ row[(j + 1) % k]`; columns are
/// extended the same way. It recovers from far fewer erasures than the
/// Reed-Solomon codes production networks use; plug those in through
/// [`SquareCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct XorSquareCodec;

impl SquareCodec for XorSquareCodec {
    fn extend_shares(&self, square_size: usize, shares: &[Share]) -> Result<ExtendedDataSquare> {
        let k = square_size;
        if k == 0 || shares.len() != k * k {
            return Err(DaError::Consistency(format!(
                "square of size {k} needs {} shares, got {}",
                k * k,
                shares.len()
            )));
        }

        let width = 2 * k;
        let mut eds = vec![Vec::new(); width * width];

        for row in 0..k {
            for col in 0..k {
                eds[row * width + col] = shares[row * k + col].as_bytes().to_vec();
            }
        }
        // Column parity for the bottom-left quadrant.
        for row in 0..k {
            for col in 0..k {
                eds[(k + row) * width + col] =
                    xor(&eds[row * width + col], &eds[((row + 1) % k) * width + col]);
            }
        }
        // Row parity for the right half, top and bottom.
        for row in 0..width {
            for col in 0..k {
                eds[row * width + k + col] =
                    xor(&eds[row * width + col], &eds[row * width + (col + 1) % k]);
            }
        }

        ExtendedDataSquare::new(width, eds)
    }
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

/// SHA-256 merkle root over the hashes of `leaves`. Empty input yields zeros.
pub(crate) fn merkle_root<'a>(leaves: impl IntoIterator<Item = &'a [u8]>) -> [u8; 32] {
    let hashes: Vec<[u8; 32]> = leaves.into_iter().map(Sha256::hash).collect();
    MerkleTree::<Sha256>::from_leaves(&hashes)
        .root()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dalc_types::NamespaceId;

    fn shares(n: usize) -> Vec<Share> {
        (0..n)
            .map(|i| Share::new(NamespaceId::new([i as u8; 8]), &[i as u8; 16]).unwrap())
            .collect()
    }

    #[test]
    fn test_extend_doubles_width_and_keeps_original_quadrant() {
        let original = shares(4);
        let eds = XorSquareCodec.extend_shares(2, &original).unwrap();

        assert_eq!(eds.width(), 4);
        assert_eq!(eds.share(0, 0), original[0].as_bytes());
        assert_eq!(eds.share(1, 1), original[3].as_bytes());
        assert_eq!(eds.share(0, 2), xor(original[0].as_bytes(), original[1].as_bytes()));
    }

    #[test]
    fn test_extend_rejects_wrong_count() {
        let err = XorSquareCodec.extend_shares(2, &shares(3)).unwrap_err();
        assert!(matches!(err, DaError::Consistency(_)));
    }

    #[test]
    fn test_header_is_deterministic() {
        let eds = XorSquareCodec.extend_shares(2, &shares(4)).unwrap();
        let a = XorSquareCodec.compute_header(&eds);
        let b = XorSquareCodec.compute_header(&eds);

        assert_eq!(a, b);
        assert_eq!(a.width(), 4);
        assert_eq!(a.column_roots.len(), 4);
        assert_ne!(a.row_roots[0], a.row_roots[1]);
        assert_eq!(a.hash(), b.hash());
    }
}
