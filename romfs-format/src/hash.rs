/// Initial value XORed with the parent offset before hashing a name.
pub const HASH_SEED: u32 = 0x075B_CD15;

/// Hash a name, given as UTF-16 code units, under the directory at `parent`.
///
/// The result selects a bucket in the directory or file hash table
/// (`hash % bucket_count`). Case-sensitive, no normalisation.
#[inline]
pub fn hash_path(name: &[u16], parent: u32) -> u32 {
    name.iter()
        .fold(parent ^ HASH_SEED, |hash, &unit| {
            hash.rotate_right(5) ^ u32::from(unit)
        })
}
