//! The artifact-generation rule and its markdown-to-HTML transform
//! (spec.md §4.1).

use qa_core::{intent, Artifact, ArtifactKind, ExecutionContext};
use qa_config::ArtifactConfig;

fn has_structural_markers(text: &str) -> bool {
    let has_header = text.lines().any(|l| l.trim_start().starts_with('#'));
    let has_bullet = text
        .lines()
        .any(|l| matches!(l.trim_start().as_bytes().first(), Some(b'-') | Some(b'*')));
    let has_table = text.contains('|');
    has_header || has_bullet || has_table
}

fn wants_artifact(context: &ExecutionContext, config: &ArtifactConfig) -> bool {
    let query_lower = context.user_query.to_lowercase();
    let keyword_match = config
        .trigger_keywords
        .iter()
        .any(|k| query_lower.contains(&k.to_lowercase()));

    let intent_match = context
        .intent
        .as_deref()
        .map(|i| config.trigger_intents.iter().any(|t| t == i))
        .unwrap_or(false);

    let answer = context.answer.as_deref().unwrap_or("");
    let length_and_structure_match =
        answer.chars().count() > config.length_threshold_chars && has_structural_markers(answer);

    keyword_match || intent_match || length_and_structure_match
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Deterministic markdown → HTML, per spec.md §4.1's "no model call for
/// artifact formatting" requirement.
pub fn markdown_to_html(markdown: &str) -> String {
    use pulldown_cmark::{html, Options, Parser};

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);
    rendered
}

fn wrap_shell(title: &str, subtitle: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body {{ font-family: -apple-system, "Segoe UI", sans-serif; max-width: 860px; margin: 2rem auto; padding: 0 1.5rem; color: #1a1a1a; }}
  h1 {{ font-size: 1.5rem; margin-bottom: 0.25rem; }}
  .subtitle {{ color: #666; font-size: 0.95rem; margin-bottom: 1.5rem; }}
  table {{ border-collapse: collapse; width: 100%; }}
  th, td {{ border: 1px solid #ddd; padding: 0.5rem; text-align: left; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p class="subtitle">{subtitle}</p>
{body_html}
</body>
</html>
"#,
        title = escape_html(title),
        subtitle = escape_html(subtitle),
        body_html = body_html,
    )
}

fn build_artifact(context: &ExecutionContext) -> Artifact {
    let kind = if context.intent.as_deref() == Some(intent::DATA_EXTRACTION) {
        ArtifactKind::Data
    } else {
        ArtifactKind::Report
    };

    let title: String = context.user_query.chars().take(80).collect();
    let body_html = markdown_to_html(context.answer.as_deref().unwrap_or(""));
    let content = wrap_shell(&title, &context.user_query, &body_html);

    Artifact { title, kind, content }
}

/// Returns `Some(Artifact)` when the query, intent, or answer shape
/// warrants one; `None` otherwise.
pub fn decide(context: &ExecutionContext, config: &ArtifactConfig) -> Option<Artifact> {
    wants_artifact(context, config).then(|| build_artifact(context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::Query;

    fn context_with(query: &str, answer: &str, query_intent: Option<&str>) -> ExecutionContext {
        let q = Query::new(query);
        let mut context = ExecutionContext::new(&q);
        context.answer = Some(answer.to_string());
        context.intent = query_intent.map(String::from);
        context
    }

    #[test]
    fn trigger_keyword_in_query_forces_an_artifact() {
        let context = context_with("please create report on quarterly revenue", "short answer", None);
        assert!(decide(&context, &ArtifactConfig::default()).is_some());
    }

    #[test]
    fn trigger_intent_forces_an_artifact_even_with_a_short_answer() {
        let context = context_with("what are the figures", "short answer", Some(intent::DATA_EXTRACTION));
        assert!(decide(&context, &ArtifactConfig::default()).is_some());
    }

    #[test]
    fn long_structured_answer_without_a_trigger_still_generates_an_artifact() {
        let mut body = String::from("# Summary\n\n");
        body.push_str(&"- a detailed finding about the documents in question\n".repeat(60));
        let context = context_with("tell me something", &body, None);
        assert!(body.chars().count() > ArtifactConfig::default().length_threshold_chars);
        assert!(decide(&context, &ArtifactConfig::default()).is_some());
    }

    #[test]
    fn long_unstructured_answer_does_not_trigger_one() {
        let body = "word ".repeat(500);
        let context = context_with("tell me something", &body, None);
        assert!(decide(&context, &ArtifactConfig::default()).is_none());
    }

    #[test]
    fn markdown_headers_and_bullets_render_to_html_tags() {
        let html = markdown_to_html("# Title\n\n- one\n- two\n");
        assert!(html.contains("<h1>"));
        assert!(html.contains("<li>"));
    }
}
