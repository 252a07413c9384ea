//! Several JSONL files read as one concatenated sequence.

use std::path::PathBuf;

use serde_json::Value;

use crate::config::{CacheConfig, ReaderOptions, StalenessPolicy};
use crate::error::{Error, InconsistencyKind, Result};

use super::single::Reader;
use super::source::{RecordSource, Records};

/// Composition of independent [`Reader`]s.
///
/// Each file keeps its own cache. Position `i` of the composed sequence maps
/// to the first reader whose cumulative length exceeds `i`. The same path may
/// be listed more than once.
#[derive(Debug, Clone)]
pub struct MultiReader {
    paths: Vec<PathBuf>,
    cache_paths: Vec<Option<PathBuf>>,
    config: CacheConfig,
    readers: Vec<Reader>,
    /// `cumulative[k]` is the total length of readers `0..=k`.
    cumulative: Vec<usize>,
}

impl MultiReader {
    /// Open every path with default options and the naming strategy from
    /// `FAST_JSONL_DIR_METHOD`.
    pub fn open<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Result<Self> {
        Self::open_with(paths, None, StalenessPolicy::default(), CacheConfig::from_env()?)
    }

    /// Open every path with explicit per-file cache paths and shared policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `cache_paths` is given with a
    /// length different from `paths`, and propagates the first reader error.
    pub fn open_with<P: Into<PathBuf>>(
        paths: impl IntoIterator<Item = P>,
        cache_paths: Option<Vec<Option<PathBuf>>>,
        policy: StalenessPolicy,
        config: CacheConfig,
    ) -> Result<Self> {
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        let mut reader = Self {
            cache_paths: vec![None; paths.len()],
            paths,
            config,
            readers: Vec::new(),
            cumulative: Vec::new(),
        };
        reader.recache(cache_paths, policy)?;
        Ok(reader)
    }

    /// Rebuild every sub-reader and the position table.
    ///
    /// A given `cache_paths` list replaces the remembered one entry for entry
    /// (`None` entries fall back to derived paths). On error the previous
    /// readers stay in place.
    pub fn recache(
        &mut self,
        cache_paths: Option<Vec<Option<PathBuf>>>,
        policy: StalenessPolicy,
    ) -> Result<()> {
        if let Some(cache_paths) = &cache_paths {
            if cache_paths.len() != self.paths.len() {
                return Err(Error::InvalidConfig(format!(
                    "expected {} cache paths, got {}",
                    self.paths.len(),
                    cache_paths.len()
                )));
            }
        }
        let cache_paths = cache_paths.unwrap_or_else(|| self.cache_paths.clone());

        let readers = self
            .paths
            .iter()
            .zip(&cache_paths)
            .map(|(path, cache_path)| {
                let options = ReaderOptions {
                    cache_path: cache_path.clone(),
                    policy,
                    config: self.config.clone(),
                };
                Reader::open_with(path.clone(), options)
            })
            .collect::<Result<Vec<_>>>()?;

        self.cumulative = readers
            .iter()
            .scan(0usize, |total, reader| {
                *total += reader.len();
                Some(*total)
            })
            .collect();
        self.readers = readers;
        self.cache_paths = cache_paths;

        tracing::debug!(
            files = self.readers.len(),
            records = self.len(),
            "Rebuilt multi-file JSONL reader"
        );

        Ok(())
    }

    /// [`recache`](Self::recache) with `force_cache` set.
    pub fn force_recache(&mut self, cache_paths: Option<Vec<Option<PathBuf>>>) -> Result<()> {
        self.recache(cache_paths, StalenessPolicy::forced())
    }

    /// Map a composed position to `(reader index, local position)`.
    pub fn locate(&self, position: usize) -> Option<(usize, usize)> {
        let reader_index = self.cumulative.partition_point(|&total| total <= position);
        if reader_index >= self.readers.len() {
            return None;
        }
        let floor = match reader_index {
            0 => 0,
            k => self.cumulative[k - 1],
        };
        Some((reader_index, position - floor))
    }

    /// The sub-readers in order.
    pub fn readers(&self) -> &[Reader] {
        &self.readers
    }
}

impl RecordSource for MultiReader {
    fn len(&self) -> usize {
        self.cumulative.last().copied().unwrap_or(0)
    }

    fn get(&self, position: usize) -> Result<Value> {
        let (reader_index, local) = self.locate(position).ok_or_else(|| {
            Error::inconsistent(position, InconsistencyKind::OutOfRange { len: self.len() })
        })?;
        self.readers[reader_index].get(local).map_err(|e| match e {
            // Report the composed position rather than the local one.
            Error::Inconsistent { kind, .. } => Error::inconsistent(position, kind),
            other => other,
        })
    }
}

impl<'a> IntoIterator for &'a MultiReader {
    type Item = Result<Value>;
    type IntoIter = Records<'a, MultiReader>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
