// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Item hashing shared by full and folded Bloom filters.

/// Seed used when a filter is built without an explicit seed.
pub const DEFAULT_UPDATE_SEED: u32 = 9001;

/// Hashes an item once with MurmurHash3 x64/128.
///
/// The two 64-bit halves feed double hashing, so `k` bit positions cost a
/// single hash computation.
pub(crate) fn hash_item(item: &[u8], seed: u32) -> (u64, u64) {
    mur3::murmurhash3_x64_128(item, seed)
}

/// Computes bit index `i` out of `capacity_bits` using double hashing
/// (Kirsch-Mitzenmacher): `(h1 + i * h2) mod capacity_bits`.
#[inline]
pub(crate) fn bit_index(h1: u64, h2: u64, i: u16, capacity_bits: u64) -> u64 {
    h1.wrapping_add(u64::from(i).wrapping_mul(h2)) % capacity_bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = hash_item(b"GO:0008150", DEFAULT_UPDATE_SEED);
        let b = hash_item(b"GO:0008150", DEFAULT_UPDATE_SEED);
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_changes_hash() {
        let a = hash_item(b"GO:0008150", 1);
        let b = hash_item(b"GO:0008150", 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_bit_index_in_range() {
        let (h1, h2) = hash_item(b"apple", DEFAULT_UPDATE_SEED);
        for i in 0..32 {
            assert!(bit_index(h1, h2, i, 1000) < 1000);
        }
    }

    #[test]
    fn test_bit_index_wraps() {
        assert_eq!(bit_index(u64::MAX, 1, 1, 10), 0);
        assert_eq!(bit_index(3, 5, 2, 100), 13);
    }
}
