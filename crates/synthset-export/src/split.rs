use std::collections::BTreeSet;

use rand::{rngs::StdRng, seq::index::sample, Rng, SeedableRng};
use synthset_io::record::TrainTestSplit;

use crate::ExportError;

/// Partition view indices into a train and a test set.
///
/// `round(fraction · n)` indices are drawn uniformly without replacement for
/// training; the rest are the test set.
///
/// # Arguments
///
/// * `indices` - The view indices to split.
/// * `fraction` - The train fraction, strictly between 0 and 1.
/// * `seed` - Seed for a reproducible split, or `None` for the thread rng.
///
/// Example:
///
/// ```
/// use synthset_export::split::train_test_split;
///
/// let split = train_test_split(&[0, 1, 2, 3], 0.5, Some(7))?;
/// assert_eq!(split.train.len(), 2);
/// assert!(split.train.is_disjoint(&split.test));
/// # Ok::<(), synthset_export::ExportError>(())
/// ```
pub fn train_test_split(
    indices: &[u32],
    fraction: f64,
    seed: Option<u64>,
) -> Result<TrainTestSplit, ExportError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(ExportError::InvalidSplit(fraction));
    }

    let split = match seed {
        Some(seed) => split_with_rng(indices, fraction, &mut StdRng::seed_from_u64(seed)),
        None => split_with_rng(indices, fraction, &mut rand::rng()),
    };

    log::info!(
        "train/test split at {fraction}: {} train, {} test",
        split.train.len(),
        split.test.len()
    );

    Ok(split)
}

fn split_with_rng<R: Rng + ?Sized>(indices: &[u32], fraction: f64, rng: &mut R) -> TrainTestSplit {
    let n_train = ((fraction * indices.len() as f64).round() as usize).min(indices.len());

    let train = sample(rng, indices.len(), n_train)
        .into_iter()
        .map(|i| indices[i])
        .collect::<BTreeSet<_>>();
    let test = indices
        .iter()
        .copied()
        .filter(|i| !train.contains(i))
        .collect();

    TrainTestSplit {
        fraction,
        train,
        test,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_counts() -> Result<(), ExportError> {
        let indices = (0..10).collect::<Vec<u32>>();
        let split = train_test_split(&indices, 0.7, None)?;
        assert_eq!(split.train.len(), 7);
        assert_eq!(split.test.len(), 3);
        assert!(split.train.is_disjoint(&split.test));
        assert_eq!(
            split.train.union(&split.test).copied().collect::<Vec<_>>(),
            indices
        );
        Ok(())
    }

    #[test]
    fn test_split_seeded() -> Result<(), ExportError> {
        let indices = (0..20).map(|i| i * 2).collect::<Vec<u32>>();
        let a = train_test_split(&indices, 0.25, Some(42))?;
        let b = train_test_split(&indices, 0.25, Some(42))?;
        assert_eq!(a, b);
        assert_eq!(a.train.len(), 5);
        assert!(a.train.iter().all(|i| i % 2 == 0));
        Ok(())
    }

    #[test]
    fn test_split_invalid_fraction() {
        for fraction in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                train_test_split(&[0, 1], fraction, Some(0)),
                Err(ExportError::InvalidSplit(_))
            ));
        }
    }

    #[test]
    fn test_split_empty() -> Result<(), ExportError> {
        let split = train_test_split(&[], 0.5, Some(0))?;
        assert!(split.train.is_empty());
        assert!(split.test.is_empty());
        Ok(())
    }
}
