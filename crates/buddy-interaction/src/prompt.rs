//! Prompt construction.
//!
//! `build_prompt` assembles the single string sent to the generation API:
//! persona instructions, learner context, a bounded slice of recent
//! history, the new question, and the universal response rules. The
//! function is pure and deterministic, which is what makes the pipeline
//! testable without a network.

use buddy_core::{ChatMessage, LearnerProfile, MessageRole, Personality};

use crate::sanitize::OUTPUT_CHAR_LIMIT;

/// How many recent history messages are rendered into each prompt.
///
/// Four messages (two full turns) balances context quality against
/// outbound payload cost; error messages never count toward the window.
pub const HISTORY_WINDOW: usize = 4;

/// Speaker label for learner messages in rendered history.
const USER_LABEL: &str = "Student";
/// Speaker label for assistant messages in rendered history.
const ASSISTANT_LABEL: &str = "You";

/// Builds the generation prompt for one turn.
///
/// `history` is the conversation so far, excluding the message currently
/// being submitted; `user_message` carries that one separately so it is
/// rendered exactly once, under the question heading.
pub fn build_prompt(
    personality: &Personality,
    profile: &LearnerProfile,
    history: &[ChatMessage],
    user_message: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("ROLE AND PERSONA:\n");
    prompt.push_str(&personality.system_prompt);
    prompt.push_str("\n\n");

    prompt.push_str(
        "Reply in plain conversational text only: no markdown, no asterisks, and no other \
         formatting symbols, because the reply may be read aloud.\n\n",
    );

    if !profile.is_empty() {
        prompt.push_str("LEARNER CONTEXT:\n");
        if !profile.topic.is_empty() {
            prompt.push_str(&format!("Learning Topic: {}\n", profile.topic));
        }
        if let Some(education) = profile.education {
            prompt.push_str(&format!("Education Level: {education}\n"));
        }
        if !profile.grade.is_empty() {
            prompt.push_str(&format!("Grade/Academic Level: {}\n", profile.grade));
        }
        prompt.push('\n');
    }

    let window: Vec<&ChatMessage> = recent_window(history);
    if !window.is_empty() {
        prompt.push_str("CONVERSATION HISTORY:\n");
        for message in window {
            let label = match message.role {
                MessageRole::User => USER_LABEL,
                MessageRole::Assistant => ASSISTANT_LABEL,
                MessageRole::Error => continue,
            };
            prompt.push_str(&format!("{label}: {}\n", message.content));
        }
        prompt.push('\n');
    }

    prompt.push_str("STUDENT'S QUESTION:\n");
    prompt.push_str(user_message);
    prompt.push_str("\n\n");

    prompt.push_str("RESPONSE STYLE:\n");
    prompt.push_str(&personality.response_format);
    prompt.push_str("\n\n");

    prompt.push_str(&format!(
        "Respond naturally and stay in character. Provide comprehensive explanations with \
         multiple examples, and walk through problems step by step. Keep the language \
         appropriate for the learner's age and level. Read math aloud: say '3/6' as 'three \
         divided by six' and 'x^2' as 'x squared'; never read symbol names literally. Do not \
         use parenthetical actions. Keep the response under {OUTPUT_CHAR_LIMIT} characters."
    ));

    prompt
}

/// Returns the last [`HISTORY_WINDOW`] non-error messages, oldest first.
fn recent_window(history: &[ChatMessage]) -> Vec<&ChatMessage> {
    let mut window: Vec<&ChatMessage> = history
        .iter()
        .rev()
        .filter(|m| m.role != MessageRole::Error)
        .take(HISTORY_WINDOW)
        .collect();
    window.reverse();
    window
}

#[cfg(test)]
mod tests {
    use super::*;
    use buddy_core::{EducationLevel, PersonalityRegistry};

    fn registry() -> PersonalityRegistry {
        PersonalityRegistry::with_defaults()
    }

    fn algebra_profile() -> LearnerProfile {
        LearnerProfile {
            topic: "Algebra".to_string(),
            education: Some(EducationLevel::MiddleSchool),
            grade: String::new(),
        }
    }

    #[test]
    fn identical_inputs_yield_byte_identical_output() {
        let registry = registry();
        let personality = registry.get("storyteller");
        let profile = algebra_profile();
        let history = vec![
            ChatMessage::user("What is a fraction?"),
            ChatMessage::assistant("A fraction is part of a whole.", None),
        ];

        let first = build_prompt(personality, &profile, &history, "And a decimal?");
        let second = build_prompt(personality, &profile, &history, "And a decimal?");
        assert_eq!(first, second);
    }

    #[test]
    fn friendly_tutor_scenario_renders_expected_sections() {
        let registry = registry();
        let personality = registry.get("friendly_tutor");
        let profile = algebra_profile();

        let prompt = build_prompt(personality, &profile, &[], "What is a variable?");

        assert!(prompt.contains(&personality.system_prompt));
        assert!(prompt.contains("Learning Topic: Algebra"));
        assert!(prompt.contains("Education Level: middle_school"));
        assert!(!prompt.contains("Grade/Academic Level"));
        assert!(prompt.contains("What is a variable?"));
        assert!(prompt.contains(&personality.response_format));
    }

    #[test]
    fn window_keeps_the_last_four_non_error_messages_in_order() {
        let registry = registry();
        let personality = registry.get("friendly_tutor");
        let profile = LearnerProfile::default();

        let history = vec![
            ChatMessage::user("m1"),
            ChatMessage::assistant("m2", None),
            ChatMessage::error("boom"),
            ChatMessage::user("m3"),
            ChatMessage::assistant("m4", None),
            ChatMessage::user("m5"),
        ];

        let prompt = build_prompt(personality, &profile, &history, "next");

        assert!(!prompt.contains("m1"));
        assert!(!prompt.contains("boom"));
        let history_block = &prompt[prompt.find("CONVERSATION HISTORY:").unwrap()..];
        assert!(history_block.contains("You: m2"));
        assert!(history_block.contains("Student: m3"));
        assert!(history_block.contains("You: m4"));
        assert!(history_block.contains("Student: m5"));
        let pos = |needle: &str| history_block.find(needle).unwrap();
        assert!(pos("m2") < pos("m3"));
        assert!(pos("m3") < pos("m4"));
        assert!(pos("m4") < pos("m5"));
    }

    #[test]
    fn empty_profile_and_history_omit_their_sections() {
        let registry = registry();
        let personality = registry.get("friendly_tutor");

        let prompt = build_prompt(personality, &LearnerProfile::default(), &[], "hi");

        assert!(!prompt.contains("LEARNER CONTEXT:"));
        assert!(!prompt.contains("CONVERSATION HISTORY:"));
        assert!(prompt.contains("STUDENT'S QUESTION:\nhi"));
    }

    #[test]
    fn error_messages_do_not_displace_window_slots() {
        let registry = registry();
        let personality = registry.get("friendly_tutor");

        // Five real messages with errors interleaved: the window should
        // still contain the last four real ones.
        let history = vec![
            ChatMessage::user("a"),
            ChatMessage::user("b"),
            ChatMessage::error("e1"),
            ChatMessage::user("c"),
            ChatMessage::error("e2"),
            ChatMessage::user("d"),
            ChatMessage::user("f"),
        ];

        let prompt = build_prompt(personality, &LearnerProfile::default(), &history, "next");
        assert!(!prompt.contains("Student: a"));
        for kept in ["b", "c", "d", "f"] {
            assert!(prompt.contains(&format!("Student: {kept}")));
        }
    }
}
