//! Lexical text analysis: counts, word-list sentiment, keywords, pairwise
//! similarity, extractive summaries, keyword classification and a stop-word
//! language guess. Sentiment and keywords assume English.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};

use super::{OpError, Output, Params};

pub const OPERATIONS: &[&str] = &[
    "statistics",
    "sentiment",
    "keywords",
    "similarity",
    "summarize",
    "classify",
    "language_detect",
];

const WORDS_PER_MINUTE: f64 = 200.0;
const NEUTRAL_BAND: f64 = 0.1;
const DEFAULT_KEYWORDS: usize = 10;
const TOP_TERMS: usize = 5;
const DEFAULT_SUMMARY_SENTENCES: usize = 3;

/// Function words that identify a language without any model.
const LANGUAGE_PROFILES: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "is", "of", "to", "in", "that", "it", "with", "was", "for", "are", "this", "have"]),
    ("es", &["el", "la", "los", "las", "de", "que", "y", "en", "un", "una", "es", "por", "con", "para", "del"]),
    ("fr", &["le", "la", "les", "de", "des", "et", "est", "un", "une", "que", "dans", "pour", "pas", "sur", "du"]),
    ("de", &["der", "die", "das", "und", "ist", "nicht", "ein", "eine", "zu", "mit", "den", "von", "ich", "auf", "sie"]),
    ("it", &["il", "lo", "la", "di", "che", "e", "un", "una", "per", "con", "non", "sono", "gli", "della", "del"]),
    ("pt", &["o", "a", "os", "as", "de", "que", "e", "um", "uma", "para", "com", "não", "por", "mais", "do"]),
];

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "my", "no",
    "not", "of", "on", "or", "our", "out", "she", "so", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "this", "to", "up", "us", "was", "we", "were", "what",
    "when", "which", "who", "will", "with", "would", "you", "your",
];

const POSITIVE: &[&str] = &[
    "achieve", "achieved", "amazing", "awesome", "best", "better", "brilliant", "excellent",
    "enjoy", "enjoyed", "fantastic", "glad", "good", "great", "happy", "improved", "love",
    "loved", "nice", "outstanding", "perfect", "pleased", "positive", "success", "successful",
    "wonderful",
];

const NEGATIVE: &[&str] = &[
    "angry", "awful", "bad", "broken", "disappointed", "disappointing", "fail", "failed",
    "failure", "hate", "hated", "horrible", "poor", "problem", "sad", "slow", "terrible",
    "unhappy", "useless", "worse", "worst", "wrong",
];

const NEGATORS: &[&str] = &["not", "no", "never", "hardly"];

pub fn run(operation: &str, params: Params<'_>, source: Option<&[u8]>) -> Result<Output, OpError> {
    let text = match source {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => params.str_or("text", "").to_string(),
    };
    if text.trim().is_empty() {
        return Err(OpError::InvalidInput("text is empty".to_string()));
    }

    let report = match operation {
        "statistics" => statistics(&text),
        "sentiment" => sentiment(&text),
        "keywords" => json!({
            "keywords": keywords(&text, params.usize_or("num_keywords", DEFAULT_KEYWORDS)),
        }),
        "similarity" => {
            let other = params.str_or("other_text", "");
            if other.trim().is_empty() {
                return Err(OpError::InvalidInput(
                    "similarity requires non-empty 'other_text'".to_string(),
                ));
            }
            similarity(&text, other, params.str_or("method", "cosine"))
        }
        "summarize" => summarize(
            &text,
            params
                .usize_or("max_sentences", DEFAULT_SUMMARY_SENTENCES)
                .max(1),
        ),
        "classify" => {
            let categories = params.str_list("categories");
            if categories.is_empty() {
                return Err(OpError::InvalidInput(
                    "classify requires a non-empty 'categories' list".to_string(),
                ));
            }
            classify(&text, &categories)
        }
        "language_detect" => detect_language(&text),
        other => {
            return Err(OpError::Unsupported {
                family: super::Family::Text,
                operation: other.to_string(),
            })
        }
    };

    let mut output = Output::json(&report)?;
    output.metadata = json!({ "text_length": text.chars().count() });
    Ok(output)
}

/// Lowercased alphabetic tokens; apostrophes stay inside words.
fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| t.chars().any(char::is_alphabetic))
        .collect()
}

fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .count()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn statistics(text: &str) -> Value {
    let words = tokens(text);
    let word_count = words.len();
    let sentences = sentence_count(text);
    let paragraphs = text
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .count();
    let letters: usize = words.iter().map(|w| w.chars().count()).sum();

    let words_per_sentence = if sentences > 0 {
        word_count as f64 / sentences as f64
    } else {
        0.0
    };
    let avg_word_length = if word_count > 0 {
        letters as f64 / word_count as f64
    } else {
        0.0
    };
    let complexity = match words_per_sentence {
        w if w < 15.0 => "simple",
        w if w < 25.0 => "moderate",
        _ => "complex",
    };

    json!({
        "character_count": text.chars().count(),
        "word_count": word_count,
        "sentence_count": sentences,
        "paragraph_count": paragraphs,
        "avg_words_per_sentence": round2(words_per_sentence),
        "avg_word_length": round2(avg_word_length),
        "reading_time_minutes": (word_count as f64 / WORDS_PER_MINUTE * 10.0).round() / 10.0,
        "complexity": complexity,
        "top_terms": keywords(text, TOP_TERMS),
    })
}

/// Polarity in [-1, 1]: (positive − negative) / sentiment-bearing words.
/// A negator flips the next word.
fn sentiment(text: &str) -> Value {
    let words = tokens(text);
    let (mut positive, mut negative) = (0usize, 0usize);
    let mut negate = false;

    for word in &words {
        let word = word.as_str();
        if NEGATORS.contains(&word) || word.ends_with("n't") {
            negate = true;
            continue;
        }
        let polarity = if POSITIVE.contains(&word) {
            1
        } else if NEGATIVE.contains(&word) {
            -1
        } else {
            0
        };
        match (polarity, negate) {
            (1, false) | (-1, true) => positive += 1,
            (-1, false) | (1, true) => negative += 1,
            _ => {}
        }
        negate = false;
    }

    let scored = positive + negative;
    let polarity = if scored == 0 {
        0.0
    } else {
        (positive as f64 - negative as f64) / scored as f64
    };
    let label = if polarity > NEUTRAL_BAND {
        "positive"
    } else if polarity < -NEUTRAL_BAND {
        "negative"
    } else {
        "neutral"
    };

    json!({
        "polarity": round2(polarity),
        "label": label,
        "positive_words": positive,
        "negative_words": negative,
    })
}

/// Most frequent non-stop-words with relative frequency. Ties break alphabetically.
fn keywords(text: &str, limit: usize) -> Vec<Value> {
    let words: Vec<String> = tokens(text)
        .into_iter()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(&w.as_str()))
        .collect();
    let total = words.len();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        *counts.entry(word.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(word, count)| {
            json!({
                "keyword": word,
                "count": count,
                "score": round2(count as f64 / total as f64),
            })
        })
        .collect()
}

fn interpretation(score: f64) -> &'static str {
    match score {
        s if s >= 0.8 => "Very High Similarity",
        s if s >= 0.6 => "High Similarity",
        s if s >= 0.4 => "Moderate Similarity",
        s if s >= 0.2 => "Low Similarity",
        _ => "Very Low Similarity",
    }
}

/// `jaccard` compares whitespace-separated word sets; anything else is
/// TF-IDF cosine over the two texts.
fn similarity(text: &str, other: &str, method: &str) -> Value {
    let (method, score) = match method {
        "jaccard" => ("jaccard", jaccard(text, other)),
        _ => ("cosine", tfidf_cosine(text, other)),
    };
    json!({
        "similarity_score": (score * 10_000.0).round() / 10_000.0,
        "method": method,
        "interpretation": interpretation(score),
    })
}

fn jaccard(a: &str, b: &str) -> f64 {
    let words = |text: &str| -> HashSet<String> {
        text.split_whitespace().map(str::to_lowercase).collect()
    };
    let (a, b) = (words(a), words(b));
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Smoothed IDF (`ln((1 + n) / (1 + df)) + 1`) over the pair, L2-normalised.
fn tfidf_cosine(a: &str, b: &str) -> f64 {
    let terms = |text: &str| -> HashMap<String, f64> {
        let mut counts = HashMap::new();
        for token in tokens(text).into_iter().filter(|t| t.chars().count() > 1) {
            *counts.entry(token).or_insert(0.0) += 1.0;
        }
        counts
    };
    let (a, b) = (terms(a), terms(b));
    let idf = |term: &str| {
        let df = [&a, &b].iter().filter(|doc| doc.contains_key(term)).count() as f64;
        (3.0 / (1.0 + df)).ln() + 1.0
    };
    let weigh = |doc: &HashMap<String, f64>| -> HashMap<String, f64> {
        doc.iter()
            .map(|(term, tf)| (term.clone(), tf * idf(term.as_str())))
            .collect()
    };
    let (wa, wb) = (weigh(&a), weigh(&b));

    let norm = |w: &HashMap<String, f64>| w.values().map(|v| v * v).sum::<f64>().sqrt();
    let (na, nb) = (norm(&wa), norm(&wb));
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let dot: f64 = wa
        .iter()
        .filter_map(|(term, v)| wb.get(term).map(|w| v * w))
        .sum();
    (dot / (na * nb)).clamp(0.0, 1.0)
}

/// Sentences with their terminal punctuation, split after `.`, `!` or `?`.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if sentence.chars().any(char::is_alphanumeric) {
                out.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if tail.chars().any(char::is_alphanumeric) {
        out.push(tail);
    }
    out
}

/// Scores each sentence by length (words / 20) plus a position bonus for the
/// first and last, keeps the best `max_sentences` in their original order.
fn summarize(text: &str, max_sentences: usize) -> Value {
    let all = sentences(text);
    let summary = if all.len() <= max_sentences {
        text.trim().to_string()
    } else {
        let last = all.len() - 1;
        let mut scored: Vec<(usize, f64)> = all
            .iter()
            .enumerate()
            .map(|(i, sentence)| {
                let length = sentence.split_whitespace().count() as f64 / 20.0;
                let position = if i == 0 || i == last { 1.0 } else { 0.5 };
                (i, length + position)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        let mut chosen: Vec<usize> = scored.into_iter().take(max_sentences).map(|(i, _)| i).collect();
        chosen.sort_unstable();
        chosen
            .into_iter()
            .map(|i| all[i])
            .collect::<Vec<_>>()
            .join(" ")
    };

    let original_length = text.chars().count();
    let summary_length = summary.chars().count();
    json!({
        "original_length": original_length,
        "summary": summary,
        "summary_length": summary_length,
        "compression_ratio": round2(summary_length as f64 / original_length as f64),
        "method": "extractive",
    })
}

/// Counts occurrences of each category's words in the text and normalises
/// the counts into probabilities. No hits at all means a uniform spread.
fn classify(text: &str, categories: &[&str]) -> Value {
    let lowered = text.to_lowercase();
    let scores: Vec<usize> = categories
        .iter()
        .map(|category| {
            category
                .to_lowercase()
                .split_whitespace()
                .map(|keyword| lowered.matches(keyword).count())
                .sum()
        })
        .collect();
    let total: usize = scores.iter().sum();
    let probabilities: Vec<f64> = scores
        .iter()
        .map(|&score| {
            if total > 0 {
                score as f64 / total as f64
            } else {
                1.0 / categories.len() as f64
            }
        })
        .collect();

    let mut best = 0;
    for (i, p) in probabilities.iter().enumerate() {
        if *p > probabilities[best] {
            best = i;
        }
    }
    let all: serde_json::Map<String, Value> = categories
        .iter()
        .zip(&probabilities)
        .map(|(category, p)| (category.to_string(), json!(round3(*p))))
        .collect();

    json!({
        "predicted_category": categories[best],
        "confidence": round3(probabilities[best]),
        "all_probabilities": all,
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Picks the language whose function words appear most often. Confidence is
/// that language's share of all profile hits.
fn detect_language(text: &str) -> Value {
    let words = tokens(text);
    let hits: Vec<(&str, usize)> = LANGUAGE_PROFILES
        .iter()
        .map(|(code, profile)| {
            let count = words.iter().filter(|w| profile.contains(&w.as_str())).count();
            (*code, count)
        })
        .collect();
    let total: usize = hits.iter().map(|(_, count)| count).sum();

    let mut best: Option<(&str, usize)> = None;
    for &(code, count) in &hits {
        if count > 0 && best.map_or(true, |(_, top)| count > top) {
            best = Some((code, count));
        }
    }
    let (language, confidence) = match best {
        Some((code, count)) => (code, round2(count as f64 / total as f64)),
        None => ("unknown", 0.0),
    };
    let supported: Vec<&str> = LANGUAGE_PROFILES.iter().map(|(code, _)| *code).collect();

    json!({
        "detected_language": language,
        "confidence": confidence,
        "supported_languages": supported,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(operation: &str, text: &str) -> Value {
        let params = json!({ "text": text });
        let out = run(operation, Params::new(&params), None).unwrap();
        serde_json::from_slice(&out.bytes).unwrap()
    }

    #[test]
    fn test_statistics_counts() {
        let stats = report("statistics", "Rust is fast. Rust is safe!\n\nShip it?");
        assert_eq!(stats["word_count"], 8);
        assert_eq!(stats["sentence_count"], 3);
        assert_eq!(stats["paragraph_count"], 2);
        assert_eq!(stats["complexity"], "simple");
        assert_eq!(stats["top_terms"][0]["keyword"], "rust");
    }

    #[test]
    fn test_sentiment_labels() {
        assert_eq!(report("sentiment", "What a great, wonderful day")["label"], "positive");
        assert_eq!(report("sentiment", "This was a terrible failure")["label"], "negative");
        assert_eq!(report("sentiment", "The meeting is on Tuesday")["label"], "neutral");
    }

    #[test]
    fn test_negation_flips_polarity() {
        let out = report("sentiment", "The service was not good");
        assert_eq!(out["label"], "negative");
        assert_eq!(out["negative_words"], 1);
    }

    #[test]
    fn test_balanced_text_is_neutral() {
        let out = report("sentiment", "good food, bad service");
        assert_eq!(out["polarity"], 0.0);
        assert_eq!(out["label"], "neutral");
    }

    #[test]
    fn test_keywords_skip_stop_words_and_respect_limit() {
        let params = json!({ "text": "the cache and the cache and the queue", "num_keywords": 1 });
        let out = run("keywords", Params::new(&params), None).unwrap();
        let parsed: Value = serde_json::from_slice(&out.bytes).unwrap();
        let keywords = parsed["keywords"].as_array().unwrap();
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0]["keyword"], "cache");
        assert_eq!(keywords[0]["count"], 2);
    }

    #[test]
    fn test_uploaded_bytes_take_precedence() {
        let params = json!({ "text": "ignored" });
        let out = run("statistics", Params::new(&params), Some(&b"one two three"[..])).unwrap();
        let parsed: Value = serde_json::from_slice(&out.bytes).unwrap();
        assert_eq!(parsed["word_count"], 3);
        assert_eq!(out.metadata["text_length"], 13);
    }

    #[test]
    fn test_empty_text_rejected() {
        let params = json!({ "text": "   " });
        assert!(matches!(
            run("statistics", Params::new(&params), None),
            Err(OpError::InvalidInput(_))
        ));
    }

    fn report_with(operation: &str, params: Value) -> Value {
        let out = run(operation, Params::new(&params), None).unwrap();
        serde_json::from_slice(&out.bytes).unwrap()
    }

    #[test]
    fn test_identical_texts_are_fully_similar() {
        let out = report_with(
            "similarity",
            json!({ "text": "Rust makes systems safe", "other_text": "rust makes systems safe" }),
        );
        assert_eq!(out["similarity_score"], 1.0);
        assert_eq!(out["method"], "cosine");
        assert_eq!(out["interpretation"], "Very High Similarity");
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        let out = report_with(
            "similarity",
            json!({ "text": "apples oranges", "other_text": "engines gearboxes" }),
        );
        assert_eq!(out["similarity_score"], 0.0);
        assert_eq!(out["interpretation"], "Very Low Similarity");
    }

    #[test]
    fn test_jaccard_uses_word_sets() {
        let out = report_with(
            "similarity",
            json!({ "text": "a b c", "other_text": "b c d", "method": "jaccard" }),
        );
        assert_eq!(out["similarity_score"], 0.5);
        assert_eq!(out["interpretation"], "Moderate Similarity");
    }

    #[test]
    fn test_similarity_needs_other_text() {
        let params = json!({ "text": "something" });
        assert!(matches!(
            run("similarity", Params::new(&params), None),
            Err(OpError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_summary_keeps_ends_and_original_order() {
        let text = "Intro line here. Short. Tiny. This middle sentence is the longest one in the whole text by far. Closing line.";
        let out = report_with("summarize", json!({ "text": text, "max_sentences": 3 }));
        assert_eq!(
            out["summary"],
            "Intro line here. This middle sentence is the longest one in the whole text by far. Closing line."
        );
        assert_eq!(out["method"], "extractive");
        assert!(out["compression_ratio"].as_f64().unwrap() < 1.0);
    }

    #[test]
    fn test_short_text_is_its_own_summary() {
        let out = report_with("summarize", json!({ "text": "One. Two.", "max_sentences": 3 }));
        assert_eq!(out["summary"], "One. Two.");
        assert_eq!(out["compression_ratio"], 1.0);
    }

    #[test]
    fn test_sentences_ignore_decimal_points() {
        assert_eq!(sentences("Version 1.5 shipped. Done!"), ["Version 1.5 shipped.", "Done!"]);
    }

    #[test]
    fn test_classify_picks_most_mentioned_category() {
        let out = report_with(
            "classify",
            json!({
                "text": "We shipped a new database engine and tuned the database cache",
                "categories": ["database", "marketing"],
            }),
        );
        assert_eq!(out["predicted_category"], "database");
        assert_eq!(out["confidence"], 1.0);
        assert_eq!(out["all_probabilities"]["marketing"], 0.0);
    }

    #[test]
    fn test_classify_without_hits_is_uniform() {
        let out = report_with(
            "classify",
            json!({ "text": "nothing relevant", "categories": ["sports", "finance"] }),
        );
        assert_eq!(out["predicted_category"], "sports");
        assert_eq!(out["confidence"], 0.5);
    }

    #[test]
    fn test_language_guess() {
        let spanish = report_with(
            "language_detect",
            json!({ "text": "El equipo de desarrollo trabaja en la nueva versión para los clientes" }),
        );
        assert_eq!(spanish["detected_language"], "es");

        let english = report_with(
            "language_detect",
            json!({ "text": "The team is working on the release and it is going well" }),
        );
        assert_eq!(english["detected_language"], "en");

        let unknown = report_with("language_detect", json!({ "text": "xyzzy plugh" }));
        assert_eq!(unknown["detected_language"], "unknown");
        assert_eq!(unknown["confidence"], 0.0);
    }
}
