/// Renders the generation prompt shared by every backend. The output format it
/// asks for is exactly what `response_validator` counts.
pub fn build_prompt(source_text: &str, question_count: usize) -> String {
    let n = question_count;
    format!(
        r#"You are an expert MCQ generator. Generate EXACTLY {n} Multiple Choice Questions from the provided text.

CRITICAL RULES:
1. Generate EXACTLY {n} questions - NO MORE, NO LESS
2. Number them Q1, Q2, Q3... up to Q{n}
3. Each question MUST have exactly 4 options: A), B), C), D)
4. Each question MUST have "Answer: <Letter>" at the end
5. Use ONLY information from the provided text
6. NO explanations, NO extra text, NO introduction, NO conclusion

EXACT FORMAT FOR EACH QUESTION:
Q[number]. [Question text]
A) [Option A]
B) [Option B]
C) [Option C]
D) [Option D]
Answer: [Correct letter]

[blank line between questions]

IMPORTANT: You MUST generate all {n} questions. Count carefully: 1, 2, 3... {n}.

Text to generate questions from:
{source_text}

Generate EXACTLY {n} MCQs now:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_appears_wherever_it_is_required() {
        let prompt = build_prompt("Photosynthesis happens in leaves.", 7);
        assert!(prompt.contains("Generate EXACTLY 7 Multiple Choice Questions"));
        assert!(prompt.contains("EXACTLY 7 questions - NO MORE, NO LESS"));
        assert!(prompt.contains("up to Q7\n"));
        assert!(prompt.contains("Count carefully: 1, 2, 3... 7."));
        assert!(prompt.ends_with("Generate EXACTLY 7 MCQs now:"));
    }

    #[test]
    fn prompt_carries_the_format_contract_and_source() {
        let prompt = build_prompt("The mitochondria is the powerhouse of the cell.", 3);
        assert!(prompt.contains("exactly 4 options: A), B), C), D)"));
        assert!(prompt.contains("\"Answer: <Letter>\""));
        assert!(prompt.contains("Use ONLY information from the provided text"));
        assert!(prompt.contains("NO explanations, NO extra text"));
        assert!(prompt.contains("The mitochondria is the powerhouse of the cell."));
    }

    #[test]
    fn rendering_is_deterministic() {
        for n in [1, 10, 50] {
            assert_eq!(build_prompt("Same text.", n), build_prompt("Same text.", n));
        }
        assert_ne!(build_prompt("Same text.", 1), build_prompt("Same text.", 2));
    }
}
