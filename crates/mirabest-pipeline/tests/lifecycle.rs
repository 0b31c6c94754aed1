use std::collections::HashSet;
use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;
use mirabest_data::Dataset;
use mirabest_datasets::{write_synthetic_mirror, PoolKind};
use mirabest_io::{load_config, Config};
use mirabest_pipeline::{DataModule, Error, MiraBestDataModule};
use tempfile::tempdir;

const SIDE: usize = 16;

fn write_config(root: &Path, body: &str) -> Config {
    let path = root.join("config.json");
    fs::write(&path, body).unwrap();
    let mut config = load_config(&path).unwrap();
    config.paths.root = root.to_path_buf();
    config
}

fn project(fraction: f64, split: f64) -> (tempfile::TempDir, Config) {
    let root = tempdir().unwrap();
    // Raw labels 0..=9, so the default no-hybrids scheme drops 20%.
    write_synthetic_mirror(&root.path().join("mirror"), 7, 20, 30, SIDE, 10, 11).unwrap();
    let body = format!(
        r#"{{
            "data": {{"fraction": {}, "split": {}, "batch_size": 16, "seed": 5, "image_size": {}}},
            "paths": {{"data": "cache", "mirror": "mirror"}}
        }}"#,
        fraction, split, SIDE
    );
    let config = write_config(root.path(), &body);
    (root, config)
}

#[test]
fn test_full_lifecycle_from_config() {
    let (root, config) = project(0.8, 0.5);
    let mut module = MiraBestDataModule::from_config(&config).unwrap();
    module.prepare_data().unwrap();
    assert!(root.path().join("cache/MiraBest/data_batch_7.bin").is_file());
    assert!(root.path().join("cache/MiraBest/test_batch.bin").is_file());

    module.setup().unwrap();
    let summary = module.summary().unwrap();
    assert_eq!(summary.train_pool, 112);
    assert_eq!(summary.test_pool, 24);
    assert_eq!(summary.labeled + summary.unlabeled, 89);
    assert_eq!(summary.labeled, 44);
    assert_eq!(summary.discarded, 112 - 89);

    let labeled: HashSet<usize> = module.partition().unwrap().labeled().iter().copied().collect();
    let mut sizes = Vec::new();
    for batch in module.train_dataloader().unwrap() {
        let batch = batch.unwrap();
        assert_eq!(batch.images.shape_vec()[1..], [1, SIDE, SIDE]);
        assert!(batch.labels.iter().all(|&l| l < 2));
        sizes.push(batch.len());
    }
    assert_eq!(sizes, vec![16, 16, 12]);
    assert_eq!(sizes.iter().sum::<usize>(), labeled.len());

    let mut val = module.val_dataloaders().unwrap();
    let step = val.next().unwrap().unwrap();
    assert_eq!(step["u"].len(), 45);
    assert_eq!(step["test"].len(), 24);
    assert!(val.next().is_none());
}

#[test]
fn test_same_seed_same_partition_across_setups() {
    let (_root, config) = project(0.5, 0.3);
    let mut a = MiraBestDataModule::from_config(&config).unwrap();
    a.prepare_data().unwrap();
    a.setup().unwrap();
    let mut b = MiraBestDataModule::from_config(&config).unwrap();
    b.setup().unwrap();
    assert_eq!(a.partition().unwrap(), b.partition().unwrap());

    // Re-running setup on the same module recomputes the same partition.
    let first = a.partition().unwrap().clone();
    a.setup().unwrap();
    assert_eq!(a.partition().unwrap(), &first);
}

#[test]
fn test_test_pool_is_masked_not_rotated() {
    let (_root, config) = project(1.0, 0.5);
    let mut module = MiraBestDataModule::from_config(&config).unwrap();
    module.prepare_data().unwrap();
    module.setup().unwrap();

    let pool = module.test_pool().unwrap();
    let (raw, _) = pool.raw(0).unwrap();
    let center = SIDE / 2;
    let expected = raw.pixel(center, center, 0) as f32 / 255.0;

    let batch = module.test_loader(pool.len()).unwrap().next().unwrap().unwrap();
    let first = &batch.images.data()[..SIDE * SIDE];
    assert_abs_diff_eq!(first[center * SIDE + center], expected, epsilon = 1e-6);
    assert_eq!(first[0], 0.0);
    assert_eq!(first[SIDE * SIDE - 1], 0.0);
}

#[test]
fn test_missing_cache_without_mirror() {
    let root = tempdir().unwrap();
    let config = write_config(root.path(), r#"{"paths": {"data": "cache"}}"#);
    let mut module = MiraBestDataModule::from_config(&config).unwrap();
    assert!(matches!(
        module.setup(),
        Err(Error::Dataset(mirabest_datasets::DatasetError::MissingFile { .. }))
    ));
    assert!(matches!(
        module.prepare(PoolKind::Test),
        Err(Error::Dataset(mirabest_datasets::DatasetError::Download { .. }))
    ));
    assert!(!module.source().is_cached(PoolKind::Test));
    assert!(module.test_pool().is_err());
    assert_eq!(module.config().batch_size, 50);
}
