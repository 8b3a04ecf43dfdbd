//! HTML pages for the browser UI
//!
//! The form page, the result page and the failure page share one layout:
//! inputs on the left, result on the right.

use crate::core::animator::AnimateError;
use crate::core::constants::download;
use crate::models::animation::{AnimationRequest, CleanedMarkup};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::escape::escape;

/// Robot face shown in the form on first load
pub const SAMPLE_SVG: &str = r##"<svg width="100%" height="100%" viewBox="0 0 200 200" xmlns="http://www.w3.org/2000/svg">
    <g id="face">
        <rect x="30" y="50" width="140" height="110" rx="24" style="fill:rgb(33,253,255);"/>
        <line id="brow" x1="50" y1="70" x2="150" y2="70" style="stroke:black;stroke-width:4;"/>
    </g>
    <circle id="eye-left" cx="75" cy="100" r="16"/>
    <circle id="eye-right" cx="125" cy="100" r="16"/>
    <circle id="pupil-left" cx="75" cy="100" r="6" style="fill:white;"/>
    <circle id="pupil-right" cx="125" cy="100" r="6" style="fill:white;"/>
    <path id="antenna-left" d="M70 50 L55 20" style="stroke:black;stroke-width:4;"/>
    <path id="antenna-right" d="M130 50 L145 20" style="stroke:black;stroke-width:4;"/>
    <path id="mouth" d="M70 135 Q100 150 130 135" style="fill:none;stroke:black;stroke-width:4;"/>
</svg>"##;

/// Default subject description matching `SAMPLE_SVG`
pub const SAMPLE_DESCRIPTION: &str = "A robot face (id='face') with two eyes (id='eye-left', 'eye-right'), two pupils (id='pupil-left', 'pupil-right'), two antennas (id='antenna-left', 'antenna-right') and a mouth (id='mouth').";

/// Default animation instructions matching `SAMPLE_SVG`
pub const SAMPLE_INSTRUCTIONS: &str = "Bring the robot to life! The straight line at the top of its face (id='brow') should wave as if the robot is thinking, then become straight again.";

const STYLE: &str = r#"
        * { box-sizing: border-box; }
        body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 0; background: #fafafa; color: #222; }
        header { padding: 20px 30px; border-bottom: 1px solid #ddd; background: #fff; }
        h1 { margin: 0 0 5px 0; font-size: 26px; }
        .subtitle { color: #666; }
        .columns { display: flex; gap: 40px; padding: 30px; }
        .column { flex: 1; min-width: 0; }
        label { display: block; font-weight: 600; margin: 15px 0 5px 0; }
        textarea { width: 100%; font-family: 'Courier New', monospace; font-size: 13px; padding: 8px; }
        button, .download { display: block; width: 100%; margin-top: 20px; padding: 12px; font-size: 16px; border: none; border-radius: 6px; background: #ff4b4b; color: white; text-align: center; text-decoration: none; cursor: pointer; }
        .preview { border: 1px solid #ccc; border-radius: 8px; padding: 20px; text-align: center; background: #f9f9f9; }
        .preview img { max-width: 100%; height: auto; }
        .notice { padding: 12px 16px; border-radius: 6px; margin-bottom: 15px; }
        .info { background: #e8f0fe; }
        .success { background: #e6f4ea; }
        .error { background: #fce8e6; }
        pre { background: #f0f0f0; padding: 12px; overflow-x: auto; font-size: 12px; }
"#;

/// The input form with an info placeholder on the right
pub fn form_page(request: &AnimationRequest) -> String {
    layout(
        request,
        r#"<div class="notice info">The result will be shown here after you click 'Animate SVG'.</div>"#,
    )
}

/// The input form plus a successful result
pub fn result_page(request: &AnimationRequest, cleaned: &CleanedMarkup) -> String {
    let encoded = STANDARD.encode(cleaned.svg.as_bytes());
    let result = format!(
        r#"<div class="notice success">Animation created successfully! ({animations} animation element(s))</div>
        <div class="preview"><img alt="Animated SVG preview" src="data:{mime};base64,{encoded}"></div>
        <a class="download" download="{file}" href="data:{mime};base64,{encoded}">Download Animated SVG</a>
        <details><summary>Show Generated SVG Code</summary><pre><code>{code}</code></pre></details>"#,
        animations = cleaned.animation_count,
        mime = download::MIME,
        file = download::FILE_NAME,
        encoded = encoded,
        code = escape(cleaned.svg.as_str()),
    );
    layout(request, &result)
}

/// The input form plus an error, and the raw model text when there is one
pub fn failure_page(request: &AnimationRequest, error: &AnimateError) -> String {
    let message = match error {
        AnimateError::MissingInput(_) => format!("{}.", error),
        AnimateError::Request(e) => format!(
            "An error occurred with the API request: {}. Please try again.",
            e
        ),
        AnimateError::Validation { .. } => format!(
            "{}. Please try a different description or check your original SVG code.",
            error
        ),
    };
    let mut result = format!(
        r#"<div class="notice error">{}</div>"#,
        escape(message.as_str())
    );
    if let AnimateError::Validation { raw, .. } = error {
        if !raw.trim().is_empty() {
            result.push_str(&format!(
                "<label>Raw model response</label><pre><code>{}</code></pre>",
                escape(raw.as_str())
            ));
        }
    }
    layout(request, &result)
}

fn layout(request: &AnimationRequest, result: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>SVG Animator AI</title>
    <style>{style}</style>
</head>
<body>
    <header>
        <h1>SVG Animator AI</h1>
        <div class="subtitle">Paste your SVG code, describe the desired animation, and let the AI do the rest.</div>
    </header>
    <div class="columns">
        <form class="column" method="post" action="/animate">
            <h2>1. Input</h2>
            <label for="svg">Paste SVG code here</label>
            <textarea id="svg" name="svg" rows="16" title="Tip: give important elements an id (e.g. id='left-eye') for better results.">{svg}</textarea>
            <label for="description">What does the graphic show?</label>
            <textarea id="description" name="description" rows="4">{description}</textarea>
            <label for="instructions">How should the animation look?</label>
            <textarea id="instructions" name="instructions" rows="6">{instructions}</textarea>
            <button type="submit">Animate SVG</button>
        </form>
        <div class="column">
            <h2>2. Result</h2>
            {result}
        </div>
    </div>
</body>
</html>"#,
        style = STYLE,
        svg = escape(request.original_markup.as_str()),
        description = escape(request.subject_description.as_deref().unwrap_or_default()),
        instructions = escape(request.instruction_text.as_str()),
        result = result,
    )
}

/// Form contents shown on first load
pub fn sample_request() -> AnimationRequest {
    AnimationRequest::new(SAMPLE_SVG, SAMPLE_INSTRUCTIONS).with_subject(SAMPLE_DESCRIPTION)
}
