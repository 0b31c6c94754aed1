use std::cell::RefCell;
use std::sync::Arc;

use mirabest_data::{
    require_non_empty, CombinedLoader, DataLoader, Dataset, ImagePool, Partition, SplitFractions,
    Subset,
};
use mirabest_datasets::{Fetcher, MiraBest, MirrorFetcher, NoFetch, PoolKind};
use mirabest_io::{Config, DataConfig, PathResolver};
use mirabest_transforms::Compose;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, PipelineResult};

/// A view into one of the loaded pools.
pub type PoolView = Subset<ImagePool>;

/// Lifecycle of the data side of a training run.
///
/// `prepare_data` materializes the cache, `setup` loads and partitions the
/// pools, and the loader methods hand out fresh batch producers.
///
/// Out-of-range fractions or a zero batch or image size are rejected when the
/// module is constructed, so `setup` only reports cache and decode failures.
pub trait DataModule {
    fn prepare_data(&self) -> PipelineResult<()>;
    fn setup(&mut self) -> PipelineResult<()>;
    fn train_dataloader(&self) -> PipelineResult<DataLoader<PoolView>>;
    fn val_dataloaders(&self) -> PipelineResult<CombinedLoader<PoolView>>;
    fn test_dataloader(&self) -> PipelineResult<DataLoader<PoolView>>;
}

// Offsets mixed into the configured seed so each producer draws its own stream.
const LABELED_STREAM: u64 = 1;
const VAL_STREAM: u64 = 2;
const TEST_STREAM: u64 = 3;

/// Partition sizes after `setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupSummary {
    pub train_pool: usize,
    pub test_pool: usize,
    pub labeled: usize,
    pub unlabeled: usize,
    pub discarded: usize,
    pub train_batches: usize,
}

struct Prepared {
    train: Arc<ImagePool>,
    test: Arc<ImagePool>,
    partition: Partition,
    labeled: PoolView,
    unlabeled: PoolView,
    test_view: PoolView,
    // Reseeded by every `setup`; each labeled loader draws its seed from it.
    epochs: RefCell<StdRng>,
}

/// Semi-supervised data module over the MiraBest pools.
///
/// The train pool is optionally thinned to `fraction` and then split into
/// labeled and unlabeled parts by `split`; the test pool is used whole.
pub struct MiraBestDataModule<F: Fetcher> {
    config: DataConfig,
    fractions: SplitFractions,
    source: MiraBest<F>,
    state: Option<Prepared>,
}

impl<F: Fetcher> MiraBestDataModule<F> {
    /// Validates the fractions and sizes up front; the source's scheme and
    /// image size are taken from `config`.
    pub fn new(config: DataConfig, source: MiraBest<F>) -> PipelineResult<Self> {
        let fractions = SplitFractions::new(config.fraction, config.split)?;
        config.validate()?;
        let source = source
            .with_scheme(config.scheme)
            .with_image_size(config.image_size);
        Ok(MiraBestDataModule {
            config,
            fractions,
            source,
            state: None,
        })
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    pub fn source(&self) -> &MiraBest<F> {
        &self.source
    }

    pub fn is_set_up(&self) -> bool {
        self.state.is_some()
    }

    /// Fetch the cache files of one pool if absent.
    pub fn prepare(&self, kind: PoolKind) -> PipelineResult<()> {
        Ok(self.source.prepare(kind)?)
    }

    fn train_transform(&self) -> Compose {
        Compose::train()
    }

    fn test_transform(&self) -> Compose {
        if self.config.augment_test {
            Compose::train()
        } else {
            Compose::eval()
        }
    }

    fn state(&self, what: &'static str) -> PipelineResult<&Prepared> {
        self.state.as_ref().ok_or(Error::NotSetUp(what))
    }

    pub fn partition(&self) -> PipelineResult<&Partition> {
        Ok(&self.state("the partition")?.partition)
    }

    pub fn train_pool(&self) -> PipelineResult<&Arc<ImagePool>> {
        Ok(&self.state("the train pool")?.train)
    }

    pub fn test_pool(&self) -> PipelineResult<&Arc<ImagePool>> {
        Ok(&self.state("the test pool")?.test)
    }

    pub fn summary(&self) -> PipelineResult<SetupSummary> {
        let state = self.state("a summary")?;
        Ok(SetupSummary {
            train_pool: state.train.len(),
            test_pool: state.test.len(),
            labeled: state.labeled.len(),
            unlabeled: state.unlabeled.len(),
            discarded: state.partition.discarded().len(),
            train_batches: state.labeled.len().div_ceil(self.config.batch_size),
        })
    }

    /// Shuffled producer over the labeled subset. Every call starts a new
    /// epoch with its own order and rotation angles; the sequence of epochs
    /// restarts on each `setup`.
    pub fn labeled_loader(&self, batch_size: usize) -> PipelineResult<DataLoader<PoolView>> {
        let state = self.state("the labeled loader")?;
        require_non_empty(&state.labeled, "labeled")?;
        let seed = state.epochs.borrow_mut().gen();
        Ok(DataLoader::new(state.labeled.clone(), batch_size, true, seed)?)
    }

    /// Single-batch producers over the unlabeled subset (`"u"`) and the
    /// test pool (`"test"`), consumed in lockstep.
    pub fn validation_loaders(&self) -> PipelineResult<CombinedLoader<PoolView>> {
        let state = self.state("the validation loaders")?;
        require_non_empty(&state.unlabeled, "u")?;
        require_non_empty(&state.test_view, "test")?;
        let seed = self.config.seed.wrapping_add(VAL_STREAM);
        Ok(CombinedLoader::new()
            .add("u", DataLoader::full(state.unlabeled.clone(), false, seed)?)
            .add("test", DataLoader::full(state.test_view.clone(), false, seed)?))
    }

    /// Producer over the whole test pool.
    pub fn test_loader(&self, batch_size: usize) -> PipelineResult<DataLoader<PoolView>> {
        let state = self.state("the test loader")?;
        require_non_empty(&state.test_view, "test")?;
        Ok(DataLoader::new(
            state.test_view.clone(),
            batch_size,
            false,
            self.config.seed.wrapping_add(TEST_STREAM),
        )?)
    }
}

/// MiraBest source wired from a configuration document: the cache lives
/// under the resolved data directory and is fetched from `paths.mirror` if set.
pub fn source_from_config(config: &Config) -> PipelineResult<MiraBest<Box<dyn Fetcher>>> {
    config.validate()?;
    let paths = PathResolver::new(&config.paths);
    let fetcher: Box<dyn Fetcher> = match paths.mirror_dir() {
        Some(dir) => Box::new(MirrorFetcher::new(dir)),
        None => Box::new(NoFetch),
    };
    Ok(MiraBest::new(paths.data_dir()?, fetcher)
        .with_scheme(config.data.scheme)
        .with_image_size(config.data.image_size))
}

impl MiraBestDataModule<Box<dyn Fetcher>> {
    pub fn from_config(config: &Config) -> PipelineResult<Self> {
        Self::new(config.data.clone(), source_from_config(config)?)
    }
}

impl<F: Fetcher> DataModule for MiraBestDataModule<F> {
    fn prepare_data(&self) -> PipelineResult<()> {
        self.prepare(PoolKind::Train)?;
        self.prepare(PoolKind::Test)
    }

    fn setup(&mut self) -> PipelineResult<()> {
        let train = Arc::new(self.source.load(PoolKind::Train, self.train_transform())?);
        let test = Arc::new(self.source.load(PoolKind::Test, self.test_transform())?);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let partition = Partition::new(train.len(), self.fractions, &mut rng);
        if !partition.discarded().is_empty() {
            log::warn!(
                "fraction {} discards {} of {} train samples",
                self.fractions.fraction(),
                partition.discarded().len(),
                train.len()
            );
        }

        let labeled = Subset::new(Arc::clone(&train), partition.labeled().to_vec())?;
        let unlabeled = Subset::new(Arc::clone(&train), partition.unlabeled().to_vec())?;
        let test_view = Subset::full(Arc::clone(&test));
        log::info!(
            "setup done: {} labeled, {} unlabeled, {} test (seed {})",
            labeled.len(),
            unlabeled.len(),
            test_view.len(),
            self.config.seed
        );

        self.state = Some(Prepared {
            train,
            test,
            partition,
            labeled,
            unlabeled,
            test_view,
            epochs: RefCell::new(StdRng::seed_from_u64(
                self.config.seed.wrapping_add(LABELED_STREAM),
            )),
        });
        Ok(())
    }

    fn train_dataloader(&self) -> PipelineResult<DataLoader<PoolView>> {
        self.labeled_loader(self.config.batch_size)
    }

    fn val_dataloaders(&self) -> PipelineResult<CombinedLoader<PoolView>> {
        self.validation_loaders()
    }

    fn test_dataloader(&self) -> PipelineResult<DataLoader<PoolView>> {
        self.test_loader(self.config.batch_size)
    }
}
