use super::demos::Demo;

pub const DECOMPOSE_INSTRUCTION: &str = "Please breakdown the following sentence into independent facts:";

/// Answer the model gives for a sentence with nothing to verify.
pub const NO_CLAIM_ANSWER: &str = "No verifiable claim.";

/// Few-shot decomposition prompt: each demo as instruction + dash-prefixed facts,
/// then the target sentence with its instruction left open.
pub fn build_decomposition_prompt(sentence: &str, demos: &[&Demo]) -> String {
    let mut prompt = String::new();

    for demo in demos {
        prompt.push_str(DECOMPOSE_INSTRUCTION);
        prompt.push(' ');
        prompt.push_str(&demo.sentence);
        prompt.push('\n');
        if demo.facts.is_empty() {
            prompt.push_str(NO_CLAIM_ANSWER);
            prompt.push('\n');
        }
        for fact in &demo.facts {
            prompt.push_str("- ");
            prompt.push_str(fact);
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str(DECOMPOSE_INSTRUCTION);
    prompt.push(' ');
    prompt.push_str(sentence.trim());
    prompt.push('\n');
    prompt
}
