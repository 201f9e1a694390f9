//! Built-in Movielens datasets, prepared for implicit-feedback
//! experiments.
//!
//! Archives are downloaded on first use and cached under `~/.ifrec/`.
//! Preparation reindexes the raw identifiers over the full ratings file,
//! binarizes the ratings, and carves out deterministic train/validation/
//! test matrices sharing the full dataset's dimensions.
use std::env;
use std::fs::{create_dir_all, rename, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv;
use failure;
use rand::{SeedableRng, XorShiftRng};
use reqwest;
use zip;

use super::Timestamp;
use data::{train_test_split, Interactions, RawId, RawInteraction, SparseMatrix};

/// Seed of the shuffling split; fixed so that repeated preparations of the
/// same ratings file produce identical matrices.
const SPLIT_SEED: [u8; 16] = [123; 16];

/// Fraction of the filtered interactions carved off as the test set.
const TEST_FRACTION: f32 = 0.1;

/// Fraction of the remaining interactions carved off as the validation set.
const VALIDATION_FRACTION: f32 = 0.1;

/// Dataset error types.
#[derive(Debug, Fail)]
pub enum DatasetError {
    /// Can't find the home directory.
    #[fail(display = "Cannot find home directory.")]
    NoHomeDir,
    /// The requested Movielens variant does not exist.
    #[fail(display = "Unknown Movielens variant '{}': expected 'ml-100k' or 'ml-1m'.", _0)]
    UnknownVariant(String),
    /// A ratings line did not contain the four expected columns.
    #[fail(display = "Malformed ratings line: '{}'.", _0)]
    MalformedLine(String),
}

/// The Movielens dataset variants this crate can prepare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovielensVariant {
    /// The 100,000-rating dataset: `u.data`, tab-separated.
    Ml100K,
    /// The 1,000,000-rating dataset: `ratings.dat`, `::`-separated.
    Ml1M,
}

impl MovielensVariant {
    /// The canonical directory name of the variant; the archive file and
    /// download URL are derived from it.
    pub fn dir_name(&self) -> &'static str {
        match *self {
            MovielensVariant::Ml100K => "ml-100k",
            MovielensVariant::Ml1M => "ml-1m",
        }
    }

    fn ratings_file(&self) -> &'static str {
        match *self {
            MovielensVariant::Ml100K => "u.data",
            MovielensVariant::Ml1M => "ratings.dat",
        }
    }

    fn archive_url(&self) -> String {
        format!(
            "http://files.grouplens.org/datasets/movielens/{}.zip",
            self.dir_name()
        )
    }
}

impl FromStr for MovielensVariant {
    type Err = DatasetError;

    /// Parses a variant name, failing fast on anything other than
    /// `ml-100k` or `ml-1m`. No I/O happens here.
    fn from_str(name: &str) -> Result<Self, DatasetError> {
        match name {
            "ml-100k" => Ok(MovielensVariant::Ml100K),
            "ml-1m" => Ok(MovielensVariant::Ml1M),
            _ => Err(DatasetError::UnknownVariant(name.to_owned())),
        }
    }
}

fn create_data_dir() -> Result<PathBuf, failure::Error> {
    let path = env::home_dir()
        .ok_or_else(|| DatasetError::NoHomeDir)?
        .join(".ifrec");

    if !path.exists() {
        create_dir_all(&path)?;
    }

    Ok(path)
}

fn download(url: &str, dest_path: &Path) -> Result<(), failure::Error> {
    println!("{:?} does not exist, downloading from {}", dest_path, url);

    let temp_path = dest_path.with_extension("zip.part");

    let file = File::create(&temp_path)?;
    let mut writer = BufWriter::new(file);

    let mut response = reqwest::blocking::get(url)?;
    response.copy_to(&mut writer)?;
    writer.flush()?;

    rename(temp_path, dest_path)?;

    Ok(())
}

/// Ensures the variant's ratings file is present under the data directory,
/// downloading and extracting the archive when necessary, and returns its
/// path. Network and filesystem errors propagate as-is; there is no retry.
fn acquire(variant: MovielensVariant) -> Result<PathBuf, failure::Error> {
    let data_dir = create_data_dir()?;
    let dataset_dir = data_dir.join(variant.dir_name());

    if !dataset_dir.exists() {
        let archive_path = data_dir.join(format!("{}.zip", variant.dir_name()));

        if !archive_path.exists() {
            download(&variant.archive_url(), &archive_path)?;
        }

        let archive = File::open(&archive_path)?;
        let mut archive = zip::ZipArchive::new(archive)?;
        archive.extract(&data_dir)?;
    }

    Ok(dataset_dir.join(variant.ratings_file()))
}

fn parse_double_colon_line(line: &str) -> Result<RawInteraction, DatasetError> {
    let fields: Vec<&str> = line.split("::").collect();

    if fields.len() != 4 {
        return Err(DatasetError::MalformedLine(line.to_owned()));
    }

    let user = fields[0].parse::<RawId>();
    let item = fields[1].parse::<RawId>();
    let rating = fields[2].parse::<f32>();
    let timestamp = fields[3].parse::<Timestamp>();

    match (user, item, rating, timestamp) {
        (Ok(user), Ok(item), Ok(rating), Ok(timestamp)) => Ok(RawInteraction {
            user: user,
            item: item,
            rating: rating,
            timestamp: timestamp,
        }),
        _ => Err(DatasetError::MalformedLine(line.to_owned())),
    }
}

/// Parses a ratings stream in the variant's format into raw records.
///
/// `ml-100k` is tab-separated and read through the csv crate; `ml-1m`
/// separates columns with `::`, which is wider than a byte and therefore
/// parsed with a plain line splitter. Neither format carries a header.
pub fn parse_ratings<R: Read>(
    variant: MovielensVariant,
    reader: R,
) -> Result<Vec<RawInteraction>, failure::Error> {
    match variant {
        MovielensVariant::Ml100K => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .delimiter(b'\t')
                .from_reader(reader);

            let records = reader
                .deserialize()
                .collect::<Result<Vec<RawInteraction>, _>>()?;

            Ok(records)
        }
        MovielensVariant::Ml1M => {
            let mut records = Vec::new();

            for line in BufReader::new(reader).lines() {
                let line = line?;

                if line.is_empty() {
                    continue;
                }

                records.push(parse_double_colon_line(&line)?);
            }

            Ok(records)
        }
    }
}

/// A Movielens ratings dataset prepared as binary train/validation/test
/// interaction matrices.
///
/// All three matrices share the `(num_users, num_items)` shape of the
/// full, unfiltered dataset; a user or item can therefore be absent from
/// any individual split. The matrices are built once during construction
/// and immutable afterwards.
pub struct Movielens {
    variant: MovielensVariant,
    min_rating: f32,
    num_users: usize,
    num_items: usize,
    train: SparseMatrix,
    valid: SparseMatrix,
    test: SparseMatrix,
}

impl Movielens {
    /// Downloads (if necessary) and prepares a Movielens dataset.
    ///
    /// Interactions with a rating below `min_rating` are dropped; the rest
    /// become positive feedback with value 1. The download blocks until it
    /// completes and any network, archive, or parse error propagates to
    /// the caller untouched.
    pub fn load(variant: MovielensVariant, min_rating: f32) -> Result<Self, failure::Error> {
        let ratings_path = acquire(variant)?;

        println!("loading {}...", variant.dir_name());

        let file = File::open(&ratings_path)?;
        let raw = parse_ratings(variant, file)?;

        Ok(Self::from_records(variant, min_rating, &raw))
    }

    /// Prepares a dataset from already-parsed records.
    ///
    /// This is the whole pipeline minus the I/O: reindex both identifier
    /// columns over the full record set, binarize with `min_rating`, split
    /// deterministically (10% test, then 10% of the remainder as
    /// validation), and materialize each split as a sparse matrix.
    pub fn from_records(
        variant: MovielensVariant,
        min_rating: f32,
        raw: &[RawInteraction],
    ) -> Self {
        let (interactions, _, _) = Interactions::from_raw(raw);

        let mut filtered = interactions.binarize(min_rating);

        let mut rng = XorShiftRng::from_seed(SPLIT_SEED);
        let (mut rest, test) = train_test_split(&mut filtered, &mut rng, TEST_FRACTION);
        let (train, valid) = train_test_split(&mut rest, &mut rng, VALIDATION_FRACTION);

        Movielens {
            variant: variant,
            min_rating: min_rating,
            num_users: interactions.num_users(),
            num_items: interactions.num_items(),
            train: train.to_matrix(),
            valid: valid.to_matrix(),
            test: test.to_matrix(),
        }
    }

    /// The variant this dataset was prepared from.
    pub fn variant(&self) -> MovielensVariant {
        self.variant
    }

    /// The rating threshold used for binarization.
    pub fn min_rating(&self) -> f32 {
        self.min_rating
    }

    /// The training matrix.
    pub fn train(&self) -> &SparseMatrix {
        &self.train
    }

    /// The validation matrix.
    pub fn valid(&self) -> &SparseMatrix {
        &self.valid
    }

    /// The test matrix.
    pub fn test(&self) -> &SparseMatrix {
        &self.test
    }

    /// Number of nonzero entries in the training matrix.
    pub fn train_size(&self) -> usize {
        self.train.nnz()
    }

    /// Number of nonzero entries in the validation matrix.
    pub fn valid_size(&self) -> usize {
        self.valid.nnz()
    }

    /// Number of nonzero entries in the test matrix.
    pub fn test_size(&self) -> usize {
        self.test.nnz()
    }

    /// Number of distinct users in the full, unfiltered dataset.
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Number of distinct items in the full, unfiltered dataset.
    pub fn num_items(&self) -> usize {
        self.num_items
    }
}
