use std::sync::Arc;

use mirabest_data::{
    accumulate, sample_with_replacement, Accumulated, ConcatDataset, DataLoader, Dataset,
    ImagePool, Subset,
};
use mirabest_datasets::{Fetcher, MiraBest, PoolKind};
use mirabest_transforms::Compose;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::datamodule::PoolView;
use crate::error::PipelineResult;

/// General-purpose holder of a train and a test pool sharing one transform.
///
/// Hands out shuffled loaders, thins the train view by bootstrap sampling and
/// gathers fixed-size sample sets from both pools.
pub struct DataAgent {
    train: PoolView,
    test: PoolView,
    batch_size: usize,
    rng: StdRng,
    accumulated: Option<Accumulated>,
}

impl DataAgent {
    pub fn new(train: ImagePool, test: ImagePool, batch_size: usize, seed: u64) -> Self {
        DataAgent {
            train: Subset::full(Arc::new(train)),
            test: Subset::full(Arc::new(test)),
            batch_size,
            rng: StdRng::seed_from_u64(seed),
            accumulated: None,
        }
    }

    /// Agent over a MiraBest cache, optionally fetching missing files first.
    /// `transform` builds the pipeline attached to each pool.
    pub fn from_source<F: Fetcher>(
        source: &MiraBest<F>,
        transform: impl Fn() -> Compose,
        batch_size: usize,
        seed: u64,
        download: bool,
    ) -> PipelineResult<Self> {
        if download {
            source.prepare(PoolKind::Train)?;
            source.prepare(PoolKind::Test)?;
        }
        let train = source.load(PoolKind::Train, transform())?;
        let test = source.load(PoolKind::Test, transform())?;
        Ok(Self::new(train, test, batch_size, seed))
    }

    pub fn train(&self) -> &PoolView {
        &self.train
    }

    pub fn test(&self) -> &PoolView {
        &self.test
    }

    pub fn n_test(&self) -> usize {
        self.test.len()
    }

    /// Shuffled train and test loaders with the agent's batch size.
    pub fn load(&mut self) -> PipelineResult<(DataLoader<PoolView>, DataLoader<PoolView>)> {
        let train = DataLoader::new(self.train.clone(), self.batch_size, true, self.rng.gen())?;
        let test = DataLoader::new(self.test.clone(), self.batch_size, true, self.rng.gen())?;
        Ok((train, test))
    }

    /// Replace the train view with `floor(fraction * n)` of its samples drawn
    /// with replacement. The backing pool is left as is.
    pub fn subsample(&mut self, fraction: f64) -> PipelineResult<()> {
        let picks = sample_with_replacement(self.train.len(), fraction, &mut self.rng)?;
        let current = self.train.indices();
        let indices = picks.into_iter().map(|i| current[i]).collect();
        let view = Subset::new(Arc::clone(self.train.dataset()), indices)?;
        log::info!(
            "subsampled train view: {} -> {} samples",
            self.train.len(),
            view.len()
        );
        self.train = view;
        Ok(())
    }

    /// Gather at least `size` samples from train followed by test and keep
    /// them on the agent.
    pub fn accumulate(&mut self, size: usize) -> PipelineResult<&Accumulated> {
        let all = ConcatDataset::new(vec![self.train.clone(), self.test.clone()]);
        let gathered = accumulate(all, size, self.rng.gen())?;
        Ok(self.accumulated.insert(gathered))
    }

    pub fn accumulated(&self) -> Option<&Accumulated> {
        self.accumulated.as_ref()
    }
}
