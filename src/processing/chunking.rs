//! Word-bounded chunking of document text.
//!
//! Words are whitespace-separated tokens and are never split. Chunks are built greedily: a
//! word joins the running chunk unless that would push it past `max_words`, in which case the
//! running chunk is closed and the word starts the next one. Concatenating the chunks in order
//! reproduces the document's word sequence exactly.

use super::types::Chunk;

/// Partition `text` into chunks of at most `max_words` words.
///
/// - Empty or all-whitespace text yields no chunks.
/// - Text within the bound yields a single chunk (whitespace collapsed to single spaces).
/// - A `max_words` of zero is treated as one so every word still lands in some chunk.
pub fn chunk_text(text: &str, max_words: usize) -> Vec<Chunk> {
    let max_words = max_words.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::with_capacity(max_words.min(1024));

    for word in text.split_whitespace() {
        if current.len() + 1 > max_words {
            push_chunk(&mut chunks, &current);
            current.clear();
        }
        current.push(word);
    }

    if !current.is_empty() {
        push_chunk(&mut chunks, &current);
    }

    tracing::trace!(chunks = chunks.len(), max_words, "Chunked text");
    chunks
}

fn push_chunk(chunks: &mut Vec<Chunk>, words: &[&str]) {
    chunks.push(Chunk {
        index: chunks.len(),
        text: words.join(" "),
        word_count: words.len(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(count: usize) -> String {
        (0..count)
            .map(|idx| format!("w{idx}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn chunk_text_respects_word_bound() {
        let chunks = chunk_text("one two three four five", 2);
        let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["one two", "three four", "five"]);
        assert_eq!(
            chunks.iter().map(|chunk| chunk.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn chunk_text_handles_empty_input() {
        assert!(chunk_text("", 800).is_empty());
        assert!(chunk_text(" \n\t ", 800).is_empty());
    }

    #[test]
    fn text_within_bound_is_single_chunk() {
        for count in [1, 17, 799, 800] {
            let text = words(count);
            let chunks = chunk_text(&text, 800);
            assert_eq!(chunks.len(), 1, "word count {count}");
            assert_eq!(chunks[0].text, text);
            assert_eq!(chunks[0].word_count, count);
        }
    }

    #[test]
    fn single_chunk_collapses_whitespace() {
        let chunks = chunk_text("  Article 5\n\napplies   to\tall ", 800);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Article 5 applies to all");
    }

    #[test]
    fn chunks_reconstruct_word_sequence() {
        for (count, bound) in [(801, 800), (2_500, 800), (10, 3), (7, 1), (40, 40)] {
            let text = words(count);
            let chunks = chunk_text(&text, bound);
            let rebuilt: Vec<&str> = chunks
                .iter()
                .flat_map(|chunk| chunk.text.split_whitespace())
                .collect();
            let original: Vec<&str> = text.split_whitespace().collect();
            assert_eq!(rebuilt, original, "count {count} bound {bound}");
            assert!(chunks.iter().all(|chunk| chunk.word_count <= bound));
            assert_eq!(chunks.len(), count.div_ceil(bound));
        }
    }

    #[test]
    fn long_words_are_never_split() {
        let long_word = "x".repeat(5_000);
        let text = format!("short {long_word} tail");
        let chunks = chunk_text(&text, 1);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, long_word);
    }

    #[test]
    fn zero_bound_is_clamped_to_one_word() {
        let chunks = chunk_text("a b c", 0);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|chunk| chunk.word_count == 1));
    }
}
