//! Word counting
//!
//! Tokenizes exported document text into a word-frequency map and a total
//! word count. The rule is locale independent: a token is a run of Unicode
//! letters and digits plus backtick, apostrophe and hyphen; leading and
//! trailing non-letters are trimmed and the result is lowercased.

use std::collections::HashMap;

use super::WordPair;

/// Tuning for the word counter
#[derive(Debug, Clone, PartialEq)]
pub struct WordOptions {
    /// Tokens shorter than this (in chars) are counted in the total but kept
    /// out of the frequency map. `0` or `1` keeps every non-empty token.
    pub min_word_length: usize,
    /// How many words a revision sample keeps; `0` keeps all of them
    pub top_limit: usize,
    /// Words occurring fewer times than this are left out of the sample
    pub min_frequency: u64,
}

impl Default for WordOptions {
    fn default() -> Self {
        Self {
            min_word_length: 4,
            top_limit: 10,
            min_frequency: 3,
        }
    }
}

impl WordOptions {
    /// Validate option values
    pub fn validate(&self) -> Result<(), String> {
        if self.min_frequency == 0 {
            return Err("min-frequency must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Result of counting one text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordCount {
    pub frequencies: HashMap<String, u64>,
    /// Every extracted token, including those left out of `frequencies`
    pub total: u64,
}

/// Pure tokenizer and counter
#[derive(Debug, Clone, Default)]
pub struct WordCounter {
    options: WordOptions,
}

impl WordCounter {
    pub fn new(options: WordOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WordOptions {
        &self.options
    }

    /// Count words in `text`
    pub fn count(&self, text: &str) -> WordCount {
        let mut frequencies = HashMap::new();
        let mut total = 0u64;

        for token in text.split(is_separator).filter(|t| !t.is_empty()) {
            total += 1;

            let trimmed = token.trim_matches(|c: char| !c.is_alphabetic());
            if trimmed.is_empty() || trimmed.chars().count() < self.options.min_word_length {
                continue;
            }
            *frequencies.entry(trimmed.to_lowercase()).or_insert(0) += 1;
        }

        WordCount { frequencies, total }
    }

    /// Most frequent words of `text` and its total word count
    ///
    /// Pairs with a count below `min_frequency` are dropped; the rest are
    /// ordered by count descending, then word ascending, and truncated to
    /// `limit` when `limit > 0`.
    pub fn top_words(&self, text: &str, limit: usize, min_frequency: u64) -> (Vec<WordPair>, u64) {
        let counted = self.count(text);
        (top_pairs(&counted, limit, min_frequency), counted.total)
    }

    /// `top_words` with the configured limit and minimum frequency
    pub fn sample(&self, text: &str) -> (Vec<WordPair>, u64) {
        self.top_words(text, self.options.top_limit, self.options.min_frequency)
    }
}

fn is_separator(c: char) -> bool {
    !c.is_alphanumeric() && c != '`' && c != '\'' && c != '-'
}

fn top_pairs(counted: &WordCount, limit: usize, min_frequency: u64) -> Vec<WordPair> {
    let mut pairs: Vec<WordPair> = counted
        .frequencies
        .iter()
        .filter(|(_, &count)| count >= min_frequency)
        .map(|(word, &count)| WordPair::new(word.clone(), count, counted.total))
        .collect();

    pairs.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));

    if limit > 0 {
        pairs.truncate(limit);
    }
    pairs
}

/// Count with default options
pub fn count_words(text: &str) -> WordCount {
    WordCounter::default().count(text)
}

/// [`WordCounter::top_words`] with the default minimum word length
pub fn top_words(text: &str, limit: usize, min_frequency: u64) -> (Vec<WordPair>, u64) {
    WordCounter::default().top_words(text, limit, min_frequency)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unfiltered() -> WordCounter {
        WordCounter::new(WordOptions {
            min_word_length: 0,
            ..WordOptions::default()
        })
    }

    #[test]
    fn test_case_folding() {
        let counted = count_words("Hello hello HELLO");
        assert_eq!(counted.frequencies["hello"], 3);
        assert_eq!(counted.total, 3);
    }

    #[test]
    fn test_short_words_count_towards_total_only() {
        let counted = count_words("the cat sat upon the mat");
        assert_eq!(counted.total, 6);
        assert_eq!(counted.frequencies.len(), 1);
        assert_eq!(counted.frequencies["upon"], 1);
    }

    #[test]
    fn test_unique_and_total_counts() {
        let text = "I think I may do a bit too much soemtimes...got a half written Vulkan renderer in
              flight atm too.";
        let counted = unfiltered().count(text);
        assert_eq!(counted.total, 20);
        assert_eq!(counted.frequencies.len(), 17);
    }

    #[test]
    fn test_apostrophes_and_hyphens_stay_in_words() {
        let counted = unfiltered().count("garments' new-fangled men's don`t");
        assert_eq!(counted.total, 4);
        assert_eq!(counted.frequencies["garments"], 1);
        assert_eq!(counted.frequencies["new-fangled"], 1);
        assert_eq!(counted.frequencies["men's"], 1);
        assert_eq!(counted.frequencies["don`t"], 1);
    }

    #[test]
    fn test_numeric_runs_count_but_trim_to_nothing() {
        let counted = unfiltered().count("chapter 12 -- 2024 draft");
        // "--" is a token too: hyphen is a word character
        assert_eq!(counted.total, 5);
        assert_eq!(counted.frequencies.len(), 2);
        assert!(!counted.frequencies.contains_key(""));
    }

    #[test]
    fn test_unicode_letters() {
        let counted = count_words("Straße STRASSE Ünïcödé ünïcödé");
        assert_eq!(counted.total, 4);
        assert_eq!(counted.frequencies["straße"], 1);
        assert_eq!(counted.frequencies["strasse"], 1);
        assert_eq!(counted.frequencies["ünïcödé"], 2);
    }

    #[test]
    fn test_empty_text() {
        let counted = count_words("   \n\t ...  ");
        assert_eq!(counted.total, 0);
        assert!(counted.frequencies.is_empty());
    }

    #[test]
    fn test_top_words_order_and_limit() {
        let text = "river river river river stone stone stone cloud cloud cloud wind";
        let counter = WordCounter::default();

        let (pairs, total) = counter.top_words(text, 2, 3);
        assert_eq!(total, 11);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].word, "river");
        assert_eq!(pairs[0].count, 4);
        // cloud and stone tie on count; word order breaks the tie
        assert_eq!(pairs[1].word, "cloud");

        let (pairs, _) = counter.top_words(text, 0, 1);
        let words: Vec<&str> = pairs.iter().map(|p| p.word.as_str()).collect();
        assert_eq!(words, vec!["river", "cloud", "stone", "wind"]);
    }

    #[test]
    fn test_top_words_ratio() {
        let (pairs, total) = WordCounter::default().top_words("quill quill quill pens", 0, 1);
        assert_eq!(total, 4);
        assert!((pairs[0].ratio - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_sample_uses_configured_options() {
        let counter = WordCounter::new(WordOptions {
            min_word_length: 4,
            top_limit: 1,
            min_frequency: 2,
        });
        let (pairs, _) = counter.sample("lamp lamp desk desk desk chair");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].word, "desk");
    }

    #[test]
    fn test_options_validation() {
        assert!(WordOptions::default().validate().is_ok());
        let options = WordOptions {
            min_frequency: 0,
            ..WordOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_top_words_defaults_drop_short_words() {
        let (pairs, total) = top_words("the cat and the hat and the writer writes", 0, 1);
        assert_eq!(total, 9);
        let words: Vec<&str> = pairs.iter().map(|p| p.word.as_str()).collect();
        assert_eq!(words, vec!["writer", "writes"]);
    }
}
