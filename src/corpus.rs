//! Benchmark corpus: test images paired with optional ground-truth masks

use crate::error::{BenchmarkError, Result};
use image::{DynamicImage, GenericImageView};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Image extensions accepted for corpus inputs, in order of preference when
/// one name exists with several extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Extensions probed, in order, when looking for a ground-truth mask
const MASK_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// One corpus entry
#[derive(Debug, Clone)]
pub struct TestImage {
    pub name: String,
    pub image: DynamicImage,
    pub ground_truth: Option<DynamicImage>,
}

impl TestImage {
    #[must_use]
    pub fn new(name: impl Into<String>, image: DynamicImage, ground_truth: Option<DynamicImage>) -> Self {
        Self {
            name: name.into(),
            image,
            ground_truth,
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[must_use]
    pub fn has_ground_truth(&self) -> bool {
        self.ground_truth.is_some()
    }
}

/// Supplies the ordered test corpus for a run
pub trait CorpusLoader {
    /// Load every test image in benchmark order
    ///
    /// # Errors
    /// Loader-specific failures such as a missing corpus directory
    fn load(&self) -> Result<Vec<TestImage>>;
}

/// Corpus already held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    images: Vec<TestImage>,
}

impl InMemoryCorpus {
    #[must_use]
    pub fn new(images: Vec<TestImage>) -> Self {
        Self { images }
    }

    pub fn push(&mut self, image: TestImage) {
        self.images.push(image);
    }
}

impl CorpusLoader for InMemoryCorpus {
    fn load(&self) -> Result<Vec<TestImage>> {
        Ok(self.images.clone())
    }
}

/// Discovers `img{NN}` files in a directory and pairs them with `mask{NN}`.
///
/// Inputs are ordered by name and each name is used once; when several
/// extensions share a name the first in `jpg`, `jpeg`, `png` order wins.
/// A missing or undecodable mask leaves the
/// entry without ground truth; an undecodable input is skipped.
#[derive(Debug, Clone)]
pub struct DirectoryCorpusLoader {
    directory: PathBuf,
    image_prefix: String,
    mask_prefix: String,
}

impl DirectoryCorpusLoader {
    #[must_use]
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            image_prefix: "img".to_string(),
            mask_prefix: "mask".to_string(),
        }
    }

    /// Override the file name prefixes used to pair inputs with masks
    #[must_use]
    pub fn with_prefixes(mut self, image_prefix: &str, mask_prefix: &str) -> Self {
        self.image_prefix = image_prefix.to_string();
        self.mask_prefix = mask_prefix.to_string();
        self
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Input image paths in benchmark order
    ///
    /// # Errors
    /// - `Io` when the directory does not exist or cannot be read
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.directory.is_dir() {
            return Err(BenchmarkError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Corpus directory does not exist: {}", self.directory.display()),
            )));
        }

        // stem -> (extension rank, path); one input per stem keeps names unique
        let mut by_stem: BTreeMap<String, (usize, PathBuf)> = BTreeMap::new();
        for entry in WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                BenchmarkError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to read {}: {}", self.directory.display(), e),
                ))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some((stem, rank)) = self.input_image_key(path) else {
                continue;
            };

            match by_stem.entry(stem) {
                Entry::Vacant(slot) => {
                    slot.insert((rank, path.to_path_buf()));
                },
                Entry::Occupied(mut slot) => {
                    let candidate = (rank, path.to_path_buf());
                    let skipped = if candidate.0 < slot.get().0 {
                        slot.insert(candidate).1
                    } else {
                        candidate.1
                    };
                    warn!(
                        kept = %slot.get().1.display(),
                        skipped = %skipped.display(),
                        "Duplicate corpus image name, skipping file"
                    );
                },
            }
        }
        Ok(by_stem.into_values().map(|(_, path)| path).collect())
    }

    /// Stem and extension preference of an input image, `None` for other files
    fn input_image_key(&self, path: &Path) -> Option<(String, usize)> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let rank = IMAGE_EXTENSIONS.iter().position(|ext| *ext == extension)?;
        let stem = path.file_stem()?.to_str()?;
        stem.starts_with(&self.image_prefix)
            .then(|| (stem.to_string(), rank))
    }

    fn mask_stem(&self, image_stem: &str) -> String {
        format!(
            "{}{}",
            self.mask_prefix,
            image_stem
                .strip_prefix(&self.image_prefix)
                .unwrap_or(image_stem)
        )
    }

    fn load_ground_truth(&self, image_stem: &str) -> Option<DynamicImage> {
        let mask_stem = self.mask_stem(image_stem);
        let path = MASK_EXTENSIONS
            .iter()
            .map(|ext| self.directory.join(format!("{}.{}", mask_stem, ext)))
            .find(|candidate| candidate.is_file())?;

        match image::open(&path) {
            Ok(mask) => Some(mask),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ground truth not decodable, scoring skipped");
                None
            },
        }
    }
}

impl CorpusLoader for DirectoryCorpusLoader {
    fn load(&self) -> Result<Vec<TestImage>> {
        let mut corpus = Vec::new();

        for path in self.discover()? {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let image = match image::open(&path) {
                Ok(image) => image,
                Err(e) => {
                    let err = BenchmarkError::image_load_error(&path, &e);
                    warn!(error = %err, "Skipping corpus image");
                    continue;
                },
            };

            let ground_truth = self.load_ground_truth(&stem);
            debug!(
                image = %stem,
                width = image.width(),
                height = image.height(),
                ground_truth = ground_truth.is_some(),
                "Loaded corpus image"
            );
            corpus.push(TestImage::new(stem, image, ground_truth));
        }

        Ok(corpus)
    }
}
