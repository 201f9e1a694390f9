//! Interaction records and the transformations that turn raw rating files
//! into binary train/validation/test matrices: identifier reindexing,
//! rating binarization, shuffled splits, and sparse materialization.
use fnv::FnvHashMap;
use rand::Rng;

use super::{ItemId, Timestamp, UserId};

/// Alias for identifier values as they appear in the input files.
pub type RawId = u64;

/// A single rating record as read from a ratings file, before reindexing.
#[derive(Clone, Debug, Deserialize)]
pub struct RawInteraction {
    /// Original user identifier.
    pub user: RawId,
    /// Original item identifier.
    pub item: RawId,
    /// Explicit rating value.
    pub rating: f32,
    /// Interaction timestamp.
    pub timestamp: Timestamp,
}

/// A bijection from original identifier values to dense indices in
/// `[0, num_distinct)`.
///
/// Indices are assigned in first-appearance order, so the mapping is
/// deterministic for a given input file. It is built once over the full
/// dataset and never changes afterwards.
#[derive(Clone, Debug)]
pub struct IdIndex {
    indices: FnvHashMap<RawId, usize>,
}

impl IdIndex {
    /// Builds an index over `values`, assigning a new dense index whenever
    /// a value is seen for the first time.
    pub fn from_values<I: Iterator<Item = RawId>>(values: I) -> Self {
        let mut indices: FnvHashMap<RawId, usize> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());

        for value in values {
            let next_index = indices.len();
            indices.entry(value).or_insert(next_index);
        }

        IdIndex { indices: indices }
    }

    /// The dense index assigned to `value`, if the value was present in the
    /// input.
    pub fn get(&self, value: RawId) -> Option<usize> {
        self.indices.get(&value).cloned()
    }

    /// Number of distinct values indexed.
    pub fn len(&self) -> usize {
        self.indices.len()
    }
}

/// A single interaction with reindexed identifiers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Interaction {
    user_id: UserId,
    item_id: ItemId,
    rating: f32,
    timestamp: Timestamp,
}

impl Interaction {
    /// Creates a new interaction.
    pub fn new(user_id: UserId, item_id: ItemId, rating: f32, timestamp: Timestamp) -> Self {
        Interaction {
            user_id: user_id,
            item_id: item_id,
            rating: rating,
            timestamp: timestamp,
        }
    }

    /// The dense user index.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The dense item index.
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// The rating value; `1.0` once the dataset has been binarized.
    pub fn rating(&self) -> f32 {
        self.rating
    }

    /// The interaction timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Splits interactions into a `(rest, held_out)` pair.
///
/// The collection is shuffled with `rng`, then the first
/// `(test_fraction * len) as usize` rows are carved off as the held-out
/// set. Given the same input and the same seeded generator the result is
/// identical across runs.
pub fn train_test_split<R: Rng>(
    interactions: &mut Interactions,
    rng: &mut R,
    test_fraction: f32,
) -> (Interactions, Interactions) {
    interactions.shuffle(rng);

    let (test, train) = interactions.split_at((test_fraction * interactions.len() as f32) as usize);

    (train, test)
}

/// A collection of reindexed interactions, carrying the user/item counts of
/// the full dataset it was derived from.
///
/// The counts are shared by every subset split off this collection, so
/// matrices built from different splits always agree on their shape.
#[derive(Clone, Debug)]
pub struct Interactions {
    num_users: usize,
    num_items: usize,
    interactions: Vec<Interaction>,
}

impl Interactions {
    /// Reindexes raw records into dense user and item indices.
    ///
    /// Both identifier columns are indexed independently over the full
    /// input, in first-appearance order; the resulting distinct counts
    /// become the dimensions of every matrix later built from this
    /// collection. The indices used are returned alongside so that callers
    /// can translate back to original identifiers.
    pub fn from_raw(raw: &[RawInteraction]) -> (Self, IdIndex, IdIndex) {
        let user_index = IdIndex::from_values(raw.iter().map(|x| x.user));
        let item_index = IdIndex::from_values(raw.iter().map(|x| x.item));

        let interactions = raw.iter()
            .map(|x| {
                Interaction::new(
                    user_index.get(x.user).unwrap(),
                    item_index.get(x.item).unwrap(),
                    x.rating,
                    x.timestamp,
                )
            })
            .collect();

        let interactions = Interactions {
            num_users: user_index.len(),
            num_items: item_index.len(),
            interactions: interactions,
        };

        (interactions, user_index, item_index)
    }

    /// The interactions themselves.
    pub fn data(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Number of interactions in the collection.
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Shuffle the interactions in place.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        rng.shuffle(&mut self.interactions);
    }

    /// Split the collection into `(head, tail)` at `idx`. Both halves keep
    /// the full-dataset dimensions.
    pub fn split_at(&self, idx: usize) -> (Self, Self) {
        let head = Interactions {
            num_users: self.num_users,
            num_items: self.num_items,
            interactions: self.interactions[..idx].to_owned(),
        };
        let tail = Interactions {
            num_users: self.num_users,
            num_items: self.num_items,
            interactions: self.interactions[idx..].to_owned(),
        };

        (head, tail)
    }

    /// Drops interactions with a rating below `min_rating` and overwrites
    /// the ratings of the survivors with `1.0`, turning explicit ratings
    /// into implicit positive feedback. Dimensions are unchanged: they
    /// always describe the unfiltered dataset.
    pub fn binarize(&self, min_rating: f32) -> Self {
        let interactions = self.interactions
            .iter()
            .filter(|x| x.rating() >= min_rating)
            .map(|x| Interaction::new(x.user_id(), x.item_id(), 1.0, x.timestamp()))
            .collect();

        Interactions {
            num_users: self.num_users,
            num_items: self.num_items,
            interactions: interactions,
        }
    }

    /// Materialize the collection as a sparse binary matrix.
    pub fn to_matrix(&self) -> SparseMatrix {
        SparseMatrix::from(self)
    }

    /// Number of distinct users in the full dataset.
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Number of distinct items in the full dataset.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// The `(num_users, num_items)` pair.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_users, self.num_items)
    }
}

/// A binary `(num_users, num_items)` interaction matrix in compressed
/// sparse row form.
///
/// Only nonzero entries are stored; every stored entry has the implicit
/// value `1.0`. Duplicate `(user, item)` pairs in the input collapse to a
/// single entry, so `nnz` always equals the number of stored coordinates.
/// The matrix is built once and immutable afterwards.
#[derive(Clone, Debug)]
pub struct SparseMatrix {
    num_users: usize,
    num_items: usize,
    user_pointers: Vec<usize>,
    item_ids: Vec<ItemId>,
}

impl<'a> From<&'a Interactions> for SparseMatrix {
    fn from(interactions: &Interactions) -> SparseMatrix {
        let mut pairs: Vec<(UserId, ItemId)> = interactions
            .data()
            .iter()
            .map(|x| (x.user_id(), x.item_id()))
            .collect();

        pairs.sort_unstable();
        pairs.dedup();

        let mut user_pointers = vec![0; interactions.num_users() + 1];
        let mut item_ids = Vec::with_capacity(pairs.len());

        for &(user_id, item_id) in &pairs {
            user_pointers[user_id + 1] += 1;
            item_ids.push(item_id);
        }

        for idx in 1..user_pointers.len() {
            user_pointers[idx] += user_pointers[idx - 1];
        }

        SparseMatrix {
            num_users: interactions.num_users(),
            num_items: interactions.num_items(),
            user_pointers: user_pointers,
            item_ids: item_ids,
        }
    }
}

impl SparseMatrix {
    /// Number of user rows.
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Number of item columns.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// The `(num_users, num_items)` pair.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_users, self.num_items)
    }

    /// Number of nonzero entries.
    pub fn nnz(&self) -> usize {
        self.item_ids.len()
    }

    /// The item indices of `user_id`'s row, sorted ascending.
    pub fn get_user(&self, user_id: UserId) -> Option<&[ItemId]> {
        if user_id >= self.num_users {
            return None;
        }

        let start = self.user_pointers[user_id];
        let stop = self.user_pointers[user_id + 1];

        Some(&self.item_ids[start..stop])
    }

    /// Iterate over all user rows, including empty ones.
    pub fn iter_users(&self) -> SparseMatrixUserIterator {
        SparseMatrixUserIterator {
            matrix: &self,
            idx: 0,
        }
    }
}

/// Iterator over the rows of a [`SparseMatrix`](struct.SparseMatrix.html).
pub struct SparseMatrixUserIterator<'a> {
    matrix: &'a SparseMatrix,
    idx: usize,
}

/// A single user's row of a sparse matrix.
#[derive(Debug)]
pub struct UserRow<'a> {
    /// The dense user index of this row.
    pub user_id: UserId,
    /// The item indices the user interacted with, sorted ascending.
    pub item_ids: &'a [ItemId],
}

impl<'a> Iterator for SparseMatrixUserIterator<'a> {
    type Item = UserRow<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        let value = if self.idx >= self.matrix.num_users {
            None
        } else {
            let start = self.matrix.user_pointers[self.idx];
            let stop = self.matrix.user_pointers[self.idx + 1];

            Some(UserRow {
                user_id: self.idx,
                item_ids: &self.matrix.item_ids[start..stop],
            })
        };

        self.idx += 1;

        value
    }
}

#[cfg(test)]
mod tests {

    use rand::{SeedableRng, XorShiftRng};

    use super::*;

    const SEED: [u8; 16] = [42; 16];

    fn synthetic_raw() -> Vec<RawInteraction> {
        // 100 records over 13 users and 8 items; all (user, item) pairs
        // are distinct, identifiers are sparse and non-contiguous.
        (0..100usize)
            .map(|idx| RawInteraction {
                user: 1000 + (idx as RawId % 13) * 7,
                item: 500 + (idx as RawId / 13) * 3,
                rating: (idx % 5 + 1) as f32,
                timestamp: idx,
            })
            .collect()
    }

    #[test]
    fn reindexing_is_a_bijection() {
        let raw = synthetic_raw();
        let (interactions, user_index, item_index) = Interactions::from_raw(&raw);

        assert_eq!(user_index.len(), 13);
        assert_eq!(item_index.len(), 8);
        assert_eq!(interactions.shape(), (13, 8));

        let mut user_ids: Vec<UserId> = raw.iter()
            .map(|x| user_index.get(x.user).unwrap())
            .collect();
        user_ids.sort();
        user_ids.dedup();

        assert_eq!(user_ids, (0..13).collect::<Vec<_>>());

        let mut item_ids: Vec<ItemId> = raw.iter()
            .map(|x| item_index.get(x.item).unwrap())
            .collect();
        item_ids.sort();
        item_ids.dedup();

        assert_eq!(item_ids, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn reindexing_uses_first_appearance_order() {
        let index = IdIndex::from_values(vec![30, 10, 30, 20, 10].into_iter());

        assert_eq!(index.len(), 3);
        assert_eq!(index.get(30), Some(0));
        assert_eq!(index.get(10), Some(1));
        assert_eq!(index.get(20), Some(2));
        assert_eq!(index.get(99), None);
    }

    #[test]
    fn binarize_drops_low_ratings_and_rewrites_the_rest() {
        let (interactions, _, _) = Interactions::from_raw(&synthetic_raw());
        let binarized = interactions.binarize(4.0);

        // Ratings cycle through 1..=5, so 2 in 5 rows survive.
        assert_eq!(binarized.len(), 40);
        assert!(binarized.data().iter().all(|x| x.rating() == 1.0));

        let retained: Vec<(UserId, ItemId)> = binarized
            .data()
            .iter()
            .map(|x| (x.user_id(), x.item_id()))
            .collect();
        for x in interactions.data() {
            let kept = retained.contains(&(x.user_id(), x.item_id()));
            assert_eq!(kept, x.rating() >= 4.0);
        }
    }

    #[test]
    fn binarize_preserves_dimensions() {
        let (interactions, _, _) = Interactions::from_raw(&synthetic_raw());

        assert_eq!(interactions.binarize(4.0).shape(), interactions.shape());
        assert_eq!(interactions.binarize(100.0).shape(), interactions.shape());
    }

    #[test]
    fn split_is_deterministic_for_a_fixed_seed() {
        let triples = |interactions: &Interactions| -> Vec<(UserId, ItemId)> {
            interactions
                .data()
                .iter()
                .map(|x| (x.user_id(), x.item_id()))
                .collect()
        };

        let (mut first, _, _) = Interactions::from_raw(&synthetic_raw());
        let (mut second, _, _) = Interactions::from_raw(&synthetic_raw());

        let mut rng = XorShiftRng::from_seed(SEED);
        let (rest_a, test_a) = train_test_split(&mut first, &mut rng, 0.1);

        let mut rng = XorShiftRng::from_seed(SEED);
        let (rest_b, test_b) = train_test_split(&mut second, &mut rng, 0.1);

        assert_eq!(triples(&test_a), triples(&test_b));
        assert_eq!(triples(&rest_a), triples(&rest_b));
    }

    #[test]
    fn split_partitions_all_interactions() {
        let (mut interactions, _, _) = Interactions::from_raw(&synthetic_raw());
        let total = interactions.len();

        let mut rng = XorShiftRng::from_seed(SEED);
        let (rest, test) = train_test_split(&mut interactions, &mut rng, 0.1);

        assert_eq!(test.len(), 10);
        assert_eq!(rest.len() + test.len(), total);

        let mut pairs: Vec<(UserId, ItemId)> = rest.data()
            .iter()
            .chain(test.data().iter())
            .map(|x| (x.user_id(), x.item_id()))
            .collect();
        pairs.sort();
        pairs.dedup();

        // All pairs are distinct in the synthetic data, so the dedup is a
        // no-op unless the splits overlap.
        assert_eq!(pairs.len(), total);
    }

    #[test]
    fn duplicate_pairs_collapse_to_a_single_entry() {
        let raw = vec![
            RawInteraction {
                user: 1,
                item: 2,
                rating: 5.0,
                timestamp: 0,
            },
            RawInteraction {
                user: 1,
                item: 2,
                rating: 3.0,
                timestamp: 1,
            },
            RawInteraction {
                user: 1,
                item: 7,
                rating: 4.0,
                timestamp: 2,
            },
        ];

        let (interactions, _, _) = Interactions::from_raw(&raw);
        let matrix = interactions.to_matrix();

        assert_eq!(matrix.shape(), (1, 2));
        assert_eq!(matrix.nnz(), 2);
        assert_eq!(matrix.get_user(0), Some(&[0, 1][..]));
    }

    #[test]
    fn matrix_rows_are_sorted_and_cover_all_interactions() {
        let (interactions, _, _) = Interactions::from_raw(&synthetic_raw());
        let matrix = interactions.to_matrix();

        assert_eq!(matrix.shape(), interactions.shape());
        assert_eq!(matrix.nnz(), interactions.len());
        assert!(matrix.get_user(13).is_none());

        let mut seen = 0;
        for row in matrix.iter_users() {
            assert!(row.item_ids.windows(2).all(|w| w[0] < w[1]));
            seen += row.item_ids.len();
        }
        assert_eq!(seen, matrix.nnz());
    }
}
