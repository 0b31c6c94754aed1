use std::path::Path;

use mirabest_data::DataError;
use mirabest_transforms::RawImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::DatasetResult;
use crate::format::{write_batch, RawBatch};
use crate::source::{test_file_name, train_file_names};

/// Seeded random single-channel pool of `n` square images.
///
/// Each image holds a bright elliptical blob on a noisy background; the blob
/// elongation grows with the label so classes are visually distinct. Labels
/// cycle through `0..n_classes`.
pub fn synthetic_pool(
    n: usize,
    side: usize,
    n_classes: usize,
    seed: u64,
) -> DatasetResult<RawBatch> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_classes = n_classes.max(1);
    let mut images = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);

    let center = side.saturating_sub(1) as f64 / 2.0;
    let scale = (side as f64 / 6.0).max(1.0);
    for i in 0..n {
        let label = i % n_classes;
        let stretch = 1.0 + label as f64;
        let angle: f64 = rng.gen_range(0.0..std::f64::consts::PI);
        let (sin, cos) = angle.sin_cos();

        let mut pixels = Vec::with_capacity(side * side);
        for row in 0..side {
            for col in 0..side {
                let dx = col as f64 - center;
                let dy = row as f64 - center;
                let along = (cos * dx + sin * dy) / (scale * stretch);
                let across = (-sin * dx + cos * dy) / scale;
                let blob = 220.0 * (-(along * along + across * across)).exp();
                let noise: f64 = rng.gen_range(0.0..20.0);
                pixels.push((blob + noise).min(255.0) as u8);
            }
        }
        images.push(RawImage::grayscale(pixels, side, side).map_err(DataError::from)?);
        labels.push(label as u8);
    }
    Ok(RawBatch { images, labels })
}

/// Write a complete mirror: `train_batches` train files of `per_batch` records
/// each and one test file of `test_len` records, all drawn from `n_classes`
/// raw classes.
pub fn write_synthetic_mirror(
    dir: &Path,
    train_batches: usize,
    per_batch: usize,
    test_len: usize,
    side: usize,
    n_classes: usize,
    seed: u64,
) -> DatasetResult<()> {
    for (i, name) in train_file_names(train_batches).iter().enumerate() {
        let batch = synthetic_pool(per_batch, side, n_classes, seed.wrapping_add(i as u64))?;
        write_batch(&dir.join(name), &batch.images, &batch.labels)?;
    }
    let test = synthetic_pool(test_len, side, n_classes, seed.wrapping_add(train_batches as u64))?;
    write_batch(&dir.join(test_file_name()), &test.images, &test.labels)?;
    log::info!(
        "wrote synthetic mirror to {} ({} train batches of {}, {} test)",
        dir.display(),
        train_batches,
        per_batch,
        test_len
    );
    Ok(())
}
