use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use mirabest_transforms::RawImage;

use crate::error::{io_error, DatasetError, DatasetResult};

/// Raw records of one batch file: images with their raw label bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatch {
    pub images: Vec<RawImage>,
    pub labels: Vec<u8>,
}

/// Bytes per record: one label byte followed by `side * side * channels` pixels.
pub fn record_len(side: usize, channels: usize) -> usize {
    1 + side * side * channels
}

/// Read a batch file of `side x side x channels` records.
pub fn read_batch(path: &Path, side: usize, channels: usize) -> DatasetResult<RawBatch> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    let record = record_len(side, channels);
    if bytes.len() % record != 0 {
        return Err(DatasetError::InvalidFormat {
            path: path.to_path_buf(),
            msg: format!(
                "{} bytes is not a multiple of the {}-byte record",
                bytes.len(),
                record
            ),
        });
    }

    let n = bytes.len() / record;
    let mut images = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for chunk in bytes.chunks_exact(record) {
        labels.push(chunk[0]);
        let image = RawImage::new(chunk[1..].to_vec(), side, side, channels).map_err(|e| {
            DatasetError::InvalidFormat {
                path: path.to_path_buf(),
                msg: e.to_string(),
            }
        })?;
        images.push(image);
    }
    log::debug!("read {} records from {}", n, path.display());
    Ok(RawBatch { images, labels })
}

/// Write `images` and `labels` as consecutive records.
///
/// All images must share one square geometry.
pub fn write_batch(path: &Path, images: &[RawImage], labels: &[u8]) -> DatasetResult<()> {
    if images.len() != labels.len() {
        return Err(DatasetError::InvalidFormat {
            path: path.to_path_buf(),
            msg: format!("{} images but {} labels", images.len(), labels.len()),
        });
    }
    if let Some(first) = images.first() {
        let geometry = (first.height(), first.width(), first.channels());
        if geometry.0 != geometry.1 {
            return Err(DatasetError::InvalidFormat {
                path: path.to_path_buf(),
                msg: format!("images must be square, got {}x{}", geometry.0, geometry.1),
            });
        }
        if let Some(odd) = images
            .iter()
            .find(|img| (img.height(), img.width(), img.channels()) != geometry)
        {
            return Err(DatasetError::InvalidFormat {
                path: path.to_path_buf(),
                msg: format!(
                    "mixed geometry: {:?} vs {:?}",
                    geometry,
                    (odd.height(), odd.width(), odd.channels())
                ),
            });
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let file = File::create(path).map_err(io_error(path))?;
    let mut out = BufWriter::new(file);
    for (image, &label) in images.iter().zip(labels) {
        out.write_all(&[label]).map_err(io_error(path))?;
        out.write_all(image.pixels()).map_err(io_error(path))?;
    }
    out.flush().map_err(io_error(path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn image(side: usize, value: u8) -> RawImage {
        RawImage::grayscale(vec![value; side * side], side, side).unwrap()
    }

    #[test]
    fn test_write_then_read_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data_batch_1.bin");
        let images = vec![image(3, 10), image(3, 200)];
        write_batch(&path, &images, &[4, 9]).unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 2 * 10);
        let batch = read_batch(&path, 3, 1).unwrap();
        assert_eq!(batch.labels, vec![4, 9]);
        assert_eq!(batch.images, images);
    }

    #[test]
    fn test_truncated_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_batch.bin");
        fs::write(&path, vec![0u8; 15]).unwrap();
        assert!(matches!(
            read_batch(&path, 3, 1),
            Err(DatasetError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_empty_file_is_empty_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        write_batch(&path, &[], &[]).unwrap();
        let batch = read_batch(&path, 150, 1).unwrap();
        assert!(batch.images.is_empty());
    }

    #[test]
    fn test_write_rejects_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        assert!(write_batch(&path, &[image(2, 0)], &[]).is_err());
        assert!(write_batch(&path, &[image(2, 0), image(3, 0)], &[0, 0]).is_err());
        let wide = RawImage::grayscale(vec![0; 6], 2, 3).unwrap();
        assert!(write_batch(&path, &[wide], &[0]).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_batch(&dir.path().join("nope.bin"), 2, 1),
            Err(DatasetError::Io { .. })
        ));
    }
}
