//! Program Image.
//!
//! The word-addressed program memory produced by the loader. An image is immutable
//! once built and owned by the simulator for the duration of a run.

use crate::common::constants::{PROGRAM_CAPACITY_WORDS, WORD_BYTES};
use crate::common::error::LoadError;

/// Loaded program memory.
///
/// The length is the extent of loaded words: one past the highest word any data record
/// wrote. Unwritten words below that read as `0x0000`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramImage {
    words: Vec<u16>,
}

impl ProgramImage {
    /// Builds an image from instruction words starting at address 0.
    ///
    /// # Errors
    ///
    /// [`LoadError::ImageTooLarge`] if `words` does not fit in program memory.
    pub fn from_words(words: impl Into<Vec<u16>>) -> Result<Self, LoadError> {
        let words = words.into();
        if words.len() > PROGRAM_CAPACITY_WORDS {
            return Err(LoadError::ImageTooLarge {
                words: words.len(),
                capacity: PROGRAM_CAPACITY_WORDS,
            });
        }
        Ok(Self { words })
    }

    /// Wraps words the loader has already bounds-checked.
    pub(crate) fn from_loaded(words: Vec<u16>) -> Self {
        Self { words }
    }

    /// Returns the word at word index `pc`, or `None` past the end of the image.
    #[inline]
    pub fn get(&self, pc: usize) -> Option<u16> {
        self.words.get(pc).copied()
    }

    /// Number of words in the image.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the image holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Size of the image in bytes.
    pub fn byte_len(&self) -> usize {
        self.words.len() * WORD_BYTES
    }

    /// All loaded words in address order.
    pub fn words(&self) -> &[u16] {
        &self.words
    }
}
