//! Chat request composition
//!
//! Builds the single chat completion request sent per submission: a fixed
//! system prompt describing how to animate, and a user prompt carrying the
//! SVG, the optional subject description and the animation instructions.

use crate::core::constants::role;
use crate::models::animation::AnimationRequest;
use crate::models::openai::{ChatCompletionRequest, ChatMessage};

/// Instructional preamble sent as the system message
pub const SYSTEM_PROMPT: &str = r#"You are a creative and whimsical SVG animator, like the team that designed the famous Microsoft Office Assistant 'Clippy'.
Your goal is to bring static SVGs to life with personality, character, and complex, engaging animations. Don't just move elements; make them tell a small story.

Follow these rules strictly:
1.  **Think like an animator:** Analyze the user's request for a mood or personality (e.g., "curious," "sleepy," "happy"). Translate this into a sequence of animations. A "curious" robot might tilt its head, look left and right, and then have its antenna twitch.
2.  **Create Complex Sequences:** Do not create simple, single, infinite loops. Chain animations together using `begin` attributes (e.g., `anim1.end`, `anim2.end + 0.5s`). Create a short, interesting, and looping story.
3.  **Use Advanced Techniques:**
    -   Employ `animateTransform` for expressive movements (rotation, scaling, translation).
    -   Use `<animate>` to change attributes like `fill` for color changes.
    -   Stagger animations. Not everything should move at once. Create a natural rhythm.
    -   **Path Morphing (`d` attribute):** To animate a path's shape, you MUST animate the `d` attribute.
        -   Identify the key points (start, end) of the line segment to be animated.
        -   Create one or more intermediate path shapes using cubic Bezier curves (`C`).
        -   Use the `values` attribute in the `<animate>` tag to list the different `d` attribute strings, separated by semicolons. Start with the original path, morph to the changed path, and return to the original.
        -   Example for a line from (10,80) to (90,80): `<animate attributeName="d" dur="2s" repeatCount="indefinite" values="M10 80 L 90 80; M10 80 C 40 40, 60 120, 90 80; M10 80 L 90 80;" />`
4.  **Respect Transformations (Crucial):** When applying an `<animateTransform>` (like `rotate`, `scale`), you MUST respect the element's existing `transform` attribute.
    -   To prevent the element from jumping to the origin (0,0), use `additive="sum"`.
    -   For rotations (`type="rotate"`), calculate or estimate the element's center point (cx, cy) and specify it in the animation (e.g., `from="0 cx cy"` `to="360 cx cy"`) to rotate it in place.
5.  **Identify and ID Elements:** Prioritize descriptive `id` attributes (e.g., `id="left-eye"`). If they don't exist, add unique IDs to the elements you need to animate.
6.  **Output Clean Code:** The final output MUST be ONLY the complete, raw, and valid SVG code. All attribute values must be enclosed in double quotes. Do not include comments, explanations, or Markdown fences.
7.  **CRITICAL VALIDATION:** Ensure every attribute has a valid, non-empty value. An attribute like `from=""` or `to=""` is invalid and MUST NOT be generated. Every animation attribute requires a specific value.
"#;

/// Sampling parameters applied to every request
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Build the user prompt for one submission
///
/// Non-breaking spaces in the pasted SVG are replaced by plain spaces, as
/// editors that export SVG commonly insert them.
pub fn build_user_prompt(request: &AnimationRequest) -> String {
    let markup = request.original_markup.replace('\u{a0}', " ");
    let mut prompt = String::with_capacity(markup.len() + request.instruction_text.len() + 128);

    push_section(&mut prompt, "Here is the SVG code:", markup.trim());
    if let Some(subject) = request.subject() {
        push_section(&mut prompt, "Description of what the graphic shows:", subject);
    }
    push_section(
        &mut prompt,
        "Animation instructions:",
        request.instruction_text.trim(),
    );

    prompt
}

fn push_section(prompt: &mut String, heading: &str, body: &str) {
    if !prompt.is_empty() {
        prompt.push('\n');
    }
    prompt.push_str(heading);
    prompt.push_str("\n---\n");
    prompt.push_str(body);
    prompt.push_str("\n---\n");
}

/// Compose the chat completion request for one submission
pub fn compose_request(request: &AnimationRequest, params: SamplingParams) -> ChatCompletionRequest {
    ChatCompletionRequest {
        messages: vec![
            ChatMessage {
                role: role::SYSTEM.to_string(),
                content: Some(SYSTEM_PROMPT.to_string()),
            },
            ChatMessage {
                role: role::USER.to_string(),
                content: Some(build_user_prompt(request)),
            },
        ],
        temperature: Some(params.temperature),
        max_tokens: Some(params.max_tokens),
    }
}
