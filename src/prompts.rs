use crate::models::GenerationOptions;

pub const MULTITURN_QA: &str = include_str!("../data/prompts/multiturn_qa.txt");

pub const INDEPENDENT_RELATION: &str = "Each question could be independent of the previous turn.";
pub const DEPENDENT_RELATION: &str =
    "Each question should derive from the previous one, creating a coherent conversation.";
pub const INDEPENDENT_FOLLOW_UP: &str =
    "For each subsequent turn, generate a question that could be independent of the previous turn.";
pub const DEPENDENT_FOLLOW_UP: &str =
    "For each subsequent turn, generate a question that derives from the last question.";

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Instruction text for one multi-turn QA generation.
pub fn render_multiturn_qa(options: &GenerationOptions) -> String {
    let (relation, follow_up) = if options.question_independent {
        (INDEPENDENT_RELATION, INDEPENDENT_FOLLOW_UP)
    } else {
        (DEPENDENT_RELATION, DEPENDENT_FOLLOW_UP)
    };

    render(
        MULTITURN_QA,
        &[
            ("min_turns", &options.min_turns.to_string()),
            ("max_turns", &options.max_turns.to_string()),
            ("question_relation", relation),
            ("follow_up", follow_up),
        ],
    )
    .trim()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Hello {{name}}!", &[("name", "world")]),
            "Hello world!"
        );
    }

    #[test]
    fn test_render_leaves_single_braces_alone() {
        assert_eq!(
            render("{ \"n\": {{n}} }", &[("n", "3")]),
            "{ \"n\": 3 }"
        );
    }

    #[test]
    fn test_template_has_placeholders() {
        for key in ["min_turns", "max_turns", "question_relation", "follow_up"] {
            assert!(MULTITURN_QA.contains(&format!("{{{{{}}}}}", key)));
        }
    }

    #[test]
    fn test_rendered_prompt_contains_turn_bounds() {
        let prompt = render_multiturn_qa(&GenerationOptions::new(2, 5));

        assert!(prompt.contains("minimum of 2 turns"));
        assert!(prompt.contains("maximum of 5 turns"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_dependent_phrasing() {
        let prompt = render_multiturn_qa(&GenerationOptions::default());

        assert!(prompt.contains(DEPENDENT_RELATION));
        assert!(prompt.contains(DEPENDENT_FOLLOW_UP));
        assert!(!prompt.contains(INDEPENDENT_RELATION));
        assert!(!prompt.contains(INDEPENDENT_FOLLOW_UP));
    }

    #[test]
    fn test_independent_phrasing() {
        let prompt = render_multiturn_qa(&GenerationOptions::default().independent(true));

        assert!(prompt.contains(INDEPENDENT_RELATION));
        assert!(prompt.contains(INDEPENDENT_FOLLOW_UP));
        assert!(!prompt.contains(DEPENDENT_RELATION));
        assert!(!prompt.contains(DEPENDENT_FOLLOW_UP));
    }

    #[test]
    fn test_prompt_asks_for_messages_key() {
        let prompt = render_multiturn_qa(&GenerationOptions::default());
        assert!(prompt.contains("\"messages\""));
    }
}
