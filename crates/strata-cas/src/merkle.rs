//! Binary Merkle tree over chunk leaf hashes.
//!
//! Leaves are `hash(chunk_hash_hex)` — one extra hash of each chunk's
//! content hash, so a chunk's storage identity and its tree-leaf identity
//! stay decoupled. Internal nodes hash the UTF-8 concatenation of their
//! children's hex digests; an odd level is completed by duplicating its
//! last node. Proof verification replays the same rules, so a proof is
//! valid iff it was generated against the same leaf set.

use strata_types::ContentHash;

use crate::hasher::ContentHasher;

/// A built tree: root plus one sibling-path proof per leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// Tree root. For zero leaves this is the hash of the empty byte string.
    pub root: ContentHash,
    /// `proofs[i]` holds the ordered sibling hashes for leaf `i`, leaf to
    /// root. Empty for a single-leaf tree.
    pub proofs: Vec<Vec<ContentHash>>,
}

/// Derive a tree leaf from a chunk's content hash.
pub fn leaf_hash(hasher: &dyn ContentHasher, chunk_hash: &ContentHash) -> ContentHash {
    hasher.hash_utf8(&chunk_hash.to_hex())
}

fn combine(hasher: &dyn ContentHasher, left: &ContentHash, right: &ContentHash) -> ContentHash {
    hasher.hash_utf8(&format!("{left}{right}"))
}

/// Build the tree over `leaves` and generate a proof for every leaf.
pub fn build_merkle(hasher: &dyn ContentHasher, leaves: &[ContentHash]) -> MerkleTree {
    if leaves.is_empty() {
        return MerkleTree {
            root: hasher.hash(&[]),
            proofs: Vec::new(),
        };
    }

    let mut proofs = vec![Vec::new(); leaves.len()];
    // Each leaf's current position as we walk up the levels.
    let mut positions: Vec<usize> = (0..leaves.len()).collect();
    let mut level: Vec<ContentHash> = leaves.to_vec();

    while level.len() > 1 {
        for (leaf, pos) in positions.iter_mut().enumerate() {
            let sibling = *pos ^ 1;
            // Duplicate-on-odd: the last node of an odd level pairs with itself.
            let sibling = if sibling < level.len() { sibling } else { *pos };
            proofs[leaf].push(level[sibling]);
            *pos /= 2;
        }

        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = if pair.len() == 2 { &pair[1] } else { &pair[0] };
            next.push(combine(hasher, left, right));
        }
        level = next;
    }

    MerkleTree {
        root: level[0],
        proofs,
    }
}

/// Replay a sibling-path proof and compare against `root`.
pub fn verify_proof(
    hasher: &dyn ContentHasher,
    leaf: &ContentHash,
    leaf_index: u64,
    proof: &[ContentHash],
    root: &ContentHash,
) -> bool {
    let mut acc = *leaf;
    let mut index = leaf_index;
    for sibling in proof {
        acc = if index % 2 == 0 {
            combine(hasher, &acc, sibling)
        } else {
            combine(hasher, sibling, &acc)
        };
        index /= 2;
    }
    acc == *root
}
