//! wordrank: count whitespace-delimited words and list them from most to
//! least frequent.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep every distinct token sorted by descending count at all
//!   times, so producing the final ranking is a plain list walk.
//! - Layers:
//!   - FrequencyIndex<S>: open-addressed slot table (triangular probing,
//!     power-of-two capacities) fused with a doubly linked list in
//!     non-increasing count order. Entries live in a `SlotMap` arena; the
//!     table and the list hold arena keys, never references.
//!   - Tokenizer: splits a byte stream on C-locale whitespace and folds
//!     ASCII case, reusing one growable token buffer.
//!   - tool: reads input in chunks, feeds the tokenizer into the index, and
//!     renders `"<token> <count>"` lines; maps failures to exit codes.
//!
//! Constraints
//! - Single-threaded, synchronous. No internal locking.
//! - No deletion of tokens; entries are freed when the index drops.
//! - `size <= 3/4 * capacity` after every operation; growth doubles the
//!   table before an insertion could break this.
//!
//! Order maintenance
//! - A new token is appended at the tail with count 1, which is never more
//!   than the tail's count.
//! - Incrementing a count can only break order against predecessors. The
//!   fix-up swaps the (key, count, slot) payload with each predecessor of
//!   strictly smaller count, walking toward the head. Node links never move.
//! - Each payload carries its slot index, and every swap re-points the two
//!   table slots, so a slot always refers to the node holding its key.
//!
//! Hashing
//! - Each entry stores its hash; growth re-seats entries without calling
//!   the hasher again. The default `BuildPolynomialHasher` is deterministic,
//!   so ties settle the same way on every run for a given input.
//!
//! Notes and non-goals
//! - Ties among equal counts are in whatever order insertion and promotion
//!   produced; they are not sorted by key.
//! - Allocation failure of the slot table or of a key is reported as
//!   `IndexError`; the index stays consistent but should be discarded.

pub mod error;
pub mod frequency_index;
mod frequency_index_proptest;
pub mod hash;
pub mod logging;
pub mod tokenizer;
pub mod tool;

// Public surface
pub use error::{IndexError, InvariantError};
pub use frequency_index::{FrequencyIndex, Iter};
pub use hash::{BuildPolynomialHasher, PolynomialHasher};
pub use tokenizer::{TokenizeError, Tokenizer};
