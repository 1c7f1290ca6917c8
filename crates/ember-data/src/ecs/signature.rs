// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Implements the fixed-width bitset recording which components an entity owns.

use std::fmt;

/// The number of distinct component types a world can register.
pub const MAX_COMPONENTS: usize = 128;

const WORDS: usize = MAX_COMPONENTS / 64;

/// A fixed-size bitset indexed by component registration order.
///
/// Bit *i* is set when the entity owns the component registered at index *i*.
/// The same type describes a system's required components, so matching an
/// entity is a word-wise AND.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    words: [u64; WORDS],
}

impl Signature {
    /// The signature with no bit set.
    pub const EMPTY: Self = Self { words: [0; WORDS] };

    /// Creates a new, empty signature.
    pub fn new() -> Self {
        Self::EMPTY
    }

    /// Builds a signature with the given bits set.
    pub fn from_bits(bits: impl IntoIterator<Item = usize>) -> Self {
        let mut signature = Self::EMPTY;
        for bit in bits {
            signature.set(bit);
        }
        signature
    }

    /// Sets the bit at the specified index to 1.
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < MAX_COMPONENTS, "component bit {index} out of range");
        if let Some(word) = self.words.get_mut(index / 64) {
            *word |= 1u64 << (index % 64);
        }
    }

    /// Clears the bit at the specified index to 0.
    pub fn clear(&mut self, index: usize) {
        if let Some(word) = self.words.get_mut(index / 64) {
            *word &= !(1u64 << (index % 64));
        }
    }

    /// Returns true if the bit at the specified index is set.
    pub fn is_set(&self, index: usize) -> bool {
        self.words
            .get(index / 64)
            .is_some_and(|word| *word & (1u64 << (index % 64)) != 0)
    }

    /// Clears every bit.
    pub fn reset(&mut self) {
        self.words = [0; WORDS];
    }

    /// Returns true if every bit of `required` is also set here.
    pub fn contains_all(&self, required: &Signature) -> bool {
        self.words
            .iter()
            .zip(required.words.iter())
            .all(|(have, need)| have & need == *need)
    }

    /// Bits set in either signature.
    pub fn union(&self, other: &Signature) -> Signature {
        self.zip_with(other, |a, b| a | b)
    }

    /// Bits set in both signatures.
    pub fn intersection(&self, other: &Signature) -> Signature {
        self.zip_with(other, |a, b| a & b)
    }

    /// Bits set here but not in `other`.
    pub fn difference(&self, other: &Signature) -> Signature {
        self.zip_with(other, |a, b| a & !b)
    }

    /// Returns true if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// The number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Iterates over the indices of the set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(word_idx, &word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| word_idx * 64 + bit)
        })
    }

    fn zip_with(&self, other: &Signature, op: impl Fn(u64, u64) -> u64) -> Signature {
        let mut words = [0; WORDS];
        for (out, (a, b)) in words.iter_mut().zip(self.words.iter().zip(other.words.iter())) {
            *out = op(*a, *b);
        }
        Signature { words }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<usize> for Signature {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::from_bits(iter)
    }
}
