use crate::storage::Passage;

/// True/False verification prompt.
///
/// Passages are laid out in reverse retrieval order so the best-ranked passage
/// sits right above the question.
pub fn build_verification_prompt(topic: &str, claim: &str, passages: &[Passage]) -> String {
    let mut prompt = format!(
        "Answer the question about {} based on the given context.\n\n",
        topic.trim()
    );

    for passage in passages.iter().rev() {
        prompt.push_str("Title: ");
        prompt.push_str(&passage.title);
        prompt.push_str("\nText: ");
        prompt.push_str(&clean_passage_text(&passage.text));
        prompt.push_str("\n\n");
    }

    prompt.push_str("Input: ");
    prompt.push_str(claim.trim());
    prompt.push_str(" True or False?\nOutput:");
    prompt
}

/// Drops sentence markers left over from chunking.
fn clean_passage_text(text: &str) -> String {
    text.replace("<s>", "").replace("</s>", "")
}
