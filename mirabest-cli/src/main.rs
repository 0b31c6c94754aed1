use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use log::info;

use mirabest::datasets::{write_synthetic_mirror, RAW_CLASSES, TRAIN_BATCHES};
use mirabest::io::{load_config, Config};
use mirabest::pipeline::{source_from_config, DataAgent, DataModule, Error, MiraBestDataModule};
use mirabest::transforms::Compose;

#[derive(Parser, Debug)]
#[command(name = "mirabest", version, about = "MiraBest data preparation", long_about = None)]
struct Cli {
    /// JSON config document.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root that relative paths resolve against.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Override data.split.
    #[arg(long, global = true)]
    split: Option<f64>,

    /// Override data.fraction.
    #[arg(long, global = true)]
    fraction: Option<f64>,

    /// Override data.seed.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch missing train and test cache files.
    Prepare,
    /// Run setup and print pool, partition and batch counts.
    Summary,
    /// Gather at least SIZE samples from train and test.
    Accumulate {
        #[arg(long)]
        size: usize,
    },
    /// Write a synthetic mirror directory in the cache record format.
    ExportSynthetic {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 100)]
        per_batch: usize,
        #[arg(long, default_value_t = 50)]
        test_len: usize,
    },
}

fn resolve_config(cli: &Cli) -> Result<Config, Error> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    if let Some(root) = &cli.root {
        config.paths.root = root.clone();
    }
    if let Some(split) = cli.split {
        config.data.split = split;
    }
    if let Some(fraction) = cli.fraction {
        config.data.fraction = fraction;
    }
    if let Some(seed) = cli.seed {
        config.data.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn row(name: &str, value: usize) {
    println!("  {} {}", format!("{:<12}", name).cyan(), value.to_string().bold());
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Prepare => {
            let module = MiraBestDataModule::from_config(&config)?;
            module.prepare_data()?;
            println!(
                "{} {}",
                "cache ready:".green(),
                module.source().cache_dir().display()
            );
        }
        Command::Summary => {
            let mut module = MiraBestDataModule::from_config(&config)?;
            module.setup()?;
            let s = module.summary()?;
            println!(
                "{} (fraction {}, split {}, seed {})",
                "MiraBest partition".bold(),
                config.data.fraction,
                config.data.split,
                config.data.seed
            );
            row("train pool", s.train_pool);
            row("test pool", s.test_pool);
            row("labeled", s.labeled);
            row("unlabeled", s.unlabeled);
            row("discarded", s.discarded);
            row("batches", s.train_batches);
        }
        Command::Accumulate { size } => {
            let source = source_from_config(&config)?;
            let mut agent = DataAgent::from_source(
                &source,
                Compose::new,
                config.data.batch_size,
                config.data.seed,
                false,
            )?;
            let acc = agent.accumulate(size)?;
            info!("accumulated tensor shape {:?}", acc.images.shape_vec());
            row("requested", size);
            row("cycles", acc.cycles);
            row("samples", acc.len());
        }
        Command::ExportSynthetic {
            out,
            per_batch,
            test_len,
        } => {
            write_synthetic_mirror(
                &out,
                TRAIN_BATCHES,
                per_batch,
                test_len,
                config.data.image_size,
                RAW_CLASSES,
                config.data.seed,
            )?;
            println!("{} {}", "mirror written:".green(), out.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mirabest").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_config_file() {
        let config = resolve_config(&cli(&["summary"])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.data.batch_size, 50);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"data": {"split": 0.5, "fraction": 0.8, "seed": 3, "batch_size": 16}}"#,
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let config = resolve_config(&cli(&[
            "--config", path, "summary", "--split", "0.25", "--seed", "9", "--root", "/srv/run",
        ]))
        .unwrap();
        assert_eq!(config.data.split, 0.25);
        assert_eq!(config.data.seed, 9);
        assert_eq!(config.data.fraction, 0.8);
        assert_eq!(config.data.batch_size, 16);
        assert_eq!(config.paths.root, PathBuf::from("/srv/run"));

        let untouched = resolve_config(&cli(&["--config", path, "prepare"])).unwrap();
        assert_eq!(untouched.data.split, 0.5);
        assert_eq!(untouched.data.seed, 3);
    }

    #[test]
    fn test_overrides_are_validated() {
        assert!(matches!(
            resolve_config(&cli(&["--fraction", "1.5", "prepare"])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            resolve_config(&cli(&["--split", "0", "summary"])),
            Err(Error::Config(_))
        ));
    }
}
