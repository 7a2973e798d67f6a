/// Splits text into chunks of at most `max_chunk_size` characters, cutting only
/// at sentence terminals (`.`, `!`, `?`). A sentence longer than the limit is
/// emitted whole as its own chunk.
pub fn chunk_text(text: &str, max_chunk_size: usize) -> Vec<String> {
    let max_chunk_size = max_chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let candidate_len = if current.is_empty() {
            char_len(sentence)
        } else {
            char_len(&current) + 1 + char_len(sentence)
        };

        if candidate_len <= max_chunk_size {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        } else if current.is_empty() {
            chunks.push(sentence.to_string());
        } else {
            chunks.push(std::mem::take(&mut current));
            if char_len(sentence) > max_chunk_size {
                chunks.push(sentence.to_string());
            } else {
                current.push_str(sentence);
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Joins the first two chunks; anything beyond them is not sent to a backend.
pub fn combine_leading_chunks(chunks: &[String]) -> String {
    let kept = chunks.len().min(2);
    if chunks.len() > kept {
        tracing::warn!(
            total_chunks = chunks.len(),
            "Only the first {} chunks are used for generation",
            kept
        );
    }
    chunks[..kept].join("\n\n")
}

/// Sentences keep their terminal punctuation; surrounding whitespace is trimmed
/// and empty pieces are skipped.
fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn non_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn empty_or_blank_input_yields_no_chunks() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("   \n\t ", 100).is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_text("One. Two! Three?", 100);
        assert_eq!(chunks, vec!["One. Two! Three?".to_string()]);
    }

    #[test]
    fn sentences_are_packed_up_to_the_limit() {
        let chunks = chunk_text("Alpha beta. Gamma delta. Epsilon zeta.", 24);
        assert_eq!(
            chunks,
            vec!["Alpha beta. Gamma delta.".to_string(), "Epsilon zeta.".to_string()]
        );
        assert!(chunks.iter().all(|c| c.chars().count() <= 24));
    }

    #[test]
    fn oversized_sentence_is_emitted_whole() {
        let long = "x".repeat(50);
        let text = format!("Short. {}. Tail.", long);
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks[0], "Short.");
        assert_eq!(chunks[1], format!("{}.", long));
        assert_eq!(chunks[2], "Tail.");
    }

    #[test]
    fn text_without_terminal_punctuation_is_kept() {
        let chunks = chunk_text("no punctuation at all", 5);
        assert_eq!(chunks, vec!["no punctuation at all".to_string()]);
    }

    #[test]
    fn only_the_first_two_chunks_are_combined() {
        let chunks = vec!["a.".to_string(), "b.".to_string(), "c.".to_string()];
        assert_eq!(combine_leading_chunks(&chunks), "a.\n\nb.");
        assert_eq!(combine_leading_chunks(&chunks[..1]), "a.");
    }

    proptest! {
        #[test]
        fn chunking_preserves_all_content(text in "[a-zA-Z .!?\n]{0,400}", max in 1usize..120) {
            let chunks = chunk_text(&text, max);
            prop_assert_eq!(non_whitespace(&chunks.concat()), non_whitespace(&text));
            if !text.trim().is_empty() {
                prop_assert!(!chunks.is_empty());
            }
        }

        #[test]
        fn chunks_respect_the_limit_unless_one_sentence_is_longer(
            text in "[a-z ]{1,30}([.!?][a-z ]{1,30}){0,20}",
            max in 10usize..80,
        ) {
            for chunk in chunk_text(&text, max) {
                let len = chunk.chars().count();
                let single_sentence = chunk
                    .trim_end_matches(['.', '!', '?'])
                    .chars()
                    .all(|c| !matches!(c, '.' | '!' | '?'));
                prop_assert!(len <= max || single_sentence);
            }
        }
    }
}
