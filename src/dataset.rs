use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{Result, UtilError};

/// A finite, ordered collection of samples.
///
/// A `Dataset` is responsible only for *providing access* to samples; how
/// they are batched or interpreted is up to the consumer.
pub trait Dataset {
    /// Sample type produced by this dataset.
    type Sample;

    /// Returns the total number of samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetches a sample by index.
    ///
    /// # Errors
    /// Returns `UtilError::OutOfBounds` if `index` is invalid.
    fn get(&self, index: usize) -> Result<Self::Sample>;
}

/// A view over a subset of another dataset's indices.
///
/// Both halves of a split share the base dataset; the subset only remaps
/// indices, it never copies or mutates samples.
pub struct Subset<D> {
    dataset: Arc<D>,
    indices: Vec<usize>,
}

impl<D> Subset<D> {
    pub fn new(dataset: Arc<D>, indices: Vec<usize>) -> Self {
        Self { dataset, indices }
    }

    /// The base-dataset indices this subset exposes, in order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl<D: Dataset> Dataset for Subset<D> {
    type Sample = D::Sample;

    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Result<Self::Sample> {
        let base = *self.indices.get(index).ok_or(UtilError::OutOfBounds {
            index,
            len: self.indices.len(),
        })?;

        self.dataset.get(base)
    }
}

/// Splits a dataset into disjoint training and validation subsets.
///
/// The validation subset receives `floor(val_split * len)` samples and the
/// training subset the rest; assignment is a shuffle without replacement, so
/// every sample lands in exactly one subset. Uses process entropy; seed
/// through [`split_dataset_with`] when the split must be reproducible.
///
/// # Arguments
/// * `dataset` - The dataset to partition.
/// * `val_split` - The validation fraction, in `[0, 1]`.
///
/// # Returns
/// The `(train, validation)` pair, or an error for an out-of-range fraction.
pub fn split_dataset<D: Dataset>(dataset: D, val_split: f64) -> Result<(Subset<D>, Subset<D>)> {
    split_dataset_with(dataset, val_split, &mut rand::rng())
}

/// Same as [`split_dataset`] with a caller-supplied random source.
pub fn split_dataset_with<D, R>(
    dataset: D,
    val_split: f64,
    rng: &mut R,
) -> Result<(Subset<D>, Subset<D>)>
where
    D: Dataset,
    R: Rng + ?Sized,
{
    if !(0.0..=1.0).contains(&val_split) {
        return Err(UtilError::InvalidInput("val_split must be in [0, 1]"));
    }

    let len = dataset.len();
    let val_size = (val_split * len as f64) as usize;
    let train_size = len - val_size;

    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    let val_indices = indices.split_off(train_size);

    let dataset = Arc::new(dataset);
    let train = Subset::new(Arc::clone(&dataset), indices);
    let val = Subset::new(dataset, val_indices);

    Ok((train, val))
}
