// Property tests for the word counter
use proptest::prelude::*;

use docstats::stats::words::{count_words, WordCounter, WordOptions};

fn unfiltered() -> WordCounter {
    WordCounter::new(WordOptions {
        min_word_length: 0,
        top_limit: 0,
        min_frequency: 1,
    })
}

proptest! {
    #[test]
    fn counting_is_deterministic(text in "\\PC{0,300}") {
        let counter = WordCounter::default();
        prop_assert_eq!(counter.count(&text), counter.count(&text));
        prop_assert_eq!(counter.sample(&text), counter.sample(&text));
    }

    #[test]
    fn ascii_case_does_not_change_counts(text in "[a-zA-Z' .,-]{0,200}") {
        let lower = count_words(&text.to_ascii_lowercase());
        let upper = count_words(&text.to_ascii_uppercase());
        prop_assert_eq!(lower, upper);
    }

    #[test]
    fn frequencies_never_exceed_total(text in "[a-z ]{0,200}") {
        let counted = unfiltered().count(&text);
        let sum: u64 = counted.frequencies.values().sum();
        prop_assert!(sum <= counted.total);
        prop_assert_eq!(counted.total as usize, text.split_whitespace().count());
    }

    #[test]
    fn sample_is_ordered_and_bounded(text in "[a-d ]{0,200}", limit in 1usize..5) {
        let (pairs, total) = unfiltered().top_words(&text, limit, 1);
        prop_assert!(pairs.len() <= limit);
        for pair in &pairs {
            prop_assert!(pair.count <= total);
        }
        for window in pairs.windows(2) {
            prop_assert!(
                window[0].count > window[1].count
                    || (window[0].count == window[1].count && window[0].word < window[1].word)
            );
        }
    }
}

#[test]
fn test_repeated_text_scales_counts() {
    let once = count_words("The quick brown fox jumps over the lazy dog.");
    let twice = count_words("The quick brown fox jumps over the lazy dog. The quick brown fox jumps over the lazy dog.");

    assert_eq!(twice.total, once.total * 2);
    for (word, count) in &once.frequencies {
        assert_eq!(twice.frequencies[word], count * 2);
    }
}
