//! Overlapping fixed-size text chunker.
//!
//! Splits normalized document text into windows of `chunk_size`
//! characters, each overlapping the previous one by `overlap`
//! characters. The overlap preserves context across chunk boundaries for
//! downstream retrieval; a floor on trimmed length discards degenerate
//! trailing fragments.
//!
//! Lengths and offsets are counted in Unicode scalar values, so a window
//! boundary never splits a character.

use tracing::debug;

/// Default window width, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Default overlap between consecutive windows, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;
/// Windows whose trimmed length does not exceed this are dropped.
pub const MIN_CHUNK_CHARS: usize = 50;

/// Split `text` into overlapping windows, keeping only those whose
/// trimmed length exceeds [`MIN_CHUNK_CHARS`].
///
/// The cursor advances by `chunk_size - overlap` after every window,
/// kept or not, and stops once it reaches the end of the text. Callers
/// must guarantee `chunk_size > overlap > 0`; this is validated at
/// config load, not here — with `overlap >= chunk_size` the cursor
/// would never advance.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    debug_assert!(chunk_size > overlap && overlap > 0);

    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();

        if trimmed.chars().count() > MIN_CHUNK_CHARS {
            chunks.push(trimmed.to_string());
        }

        start += step;
    }

    debug!(
        text_chars = chars.len(),
        chunk_size,
        overlap,
        chunks = chunks.len(),
        "chunked text"
    );

    chunks
}
