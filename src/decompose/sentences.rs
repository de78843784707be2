//! Sentence segmentation with a repair pass for broken splits.

use unicode_segmentation::UnicodeSegmentation;

/// Splits `text` into sentences (UAX #29), then repairs the segmentation.
///
/// Repair rules, applied left to right:
/// - a fragment of at most one token is merged into the previous sentence,
///   or into the following one when it opens the text;
/// - a sentence starting with a lowercase letter continues the previous one.
pub fn split_sentences(text: &str) -> Vec<String> {
    split_sentences_without(text, |_| false)
}

/// Like [`split_sentences`], but drops raw segments matching `is_noise` before
/// repair, so an apology such as "Sorry!" never glues onto a factual sentence.
pub fn split_sentences_without<F>(text: &str, is_noise: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let raw: Vec<&str> = text
        .unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_noise(s))
        .collect();

    let mut sentences: Vec<String> = Vec::with_capacity(raw.len());
    let mut leading: Option<String> = None;

    for fragment in raw {
        let sentence = match leading.take() {
            Some(prefix) => format!("{} {}", prefix, fragment),
            None => fragment.to_string(),
        };

        let is_fragment = sentence.split_whitespace().count() <= 1;
        let continues = sentence.chars().next().is_some_and(char::is_lowercase);

        match sentences.last_mut() {
            Some(previous) if is_fragment || continues => {
                previous.push(' ');
                previous.push_str(&sentence);
            }
            None if is_fragment => leading = Some(sentence),
            _ => sentences.push(sentence),
        }
    }

    if let Some(fragment) = leading {
        sentences.push(fragment);
    }
    sentences
}
