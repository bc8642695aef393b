//! Prompt construction and placeholder documents.

use prdocs_shared::{DocumentArtifact, PrDocsError};

/// First line of every placeholder document.
pub const PLACEHOLDER_MARKER: &str = "<!-- prdocs:generation-failed -->";

/// Build the generation prompt for one file.
pub fn build_prompt(code: &str, filename: &str, max_chars: usize) -> String {
    let code = truncate_content(code, max_chars);
    format!(
        "Generate updated documentation for the following file: {filename}.\n\n\
         Here is the current content:\n{code}\n"
    )
}

/// Build the deterministic failure document for `filename`.
pub fn placeholder(filename: &str, error: &PrDocsError) -> DocumentArtifact {
    DocumentArtifact::new(format!(
        "{PLACEHOLDER_MARKER}\n# {filename}\n\nError generating documentation: {error}\n"
    ))
}

/// Truncate content to at most `max_chars` characters, on a char boundary.
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        None => content.to_string(),
        Some((cut, _)) => {
            let truncated = &content[..cut];
            format!("{truncated}\n\n[... content truncated for LLM context window ...]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_filename_and_code() {
        let prompt = build_prompt("console.log(1)", "a.js", 1000);
        assert!(prompt.contains("following file: a.js."));
        assert!(prompt.contains("Here is the current content:\nconsole.log(1)"));
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(build_prompt("x", "f.rs", 10), build_prompt("x", "f.rs", 10));
    }

    #[test]
    fn truncate_short_content() {
        assert_eq!(truncate_content("short text", 100), "short text");
        assert_eq!(truncate_content("exact", 5), "exact");
    }

    #[test]
    fn truncate_long_content() {
        let content = "a".repeat(200);
        let result = truncate_content(&content, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(!result.starts_with(&"a".repeat(101)));
        assert!(result.contains("truncated"));
    }

    #[test]
    fn truncate_respects_multibyte_chars() {
        let content = "日本語のコード".repeat(10);
        let result = truncate_content(&content, 3);
        assert!(result.starts_with("日本語\n"));
    }

    #[test]
    fn placeholder_is_labeled_and_deterministic() {
        let err = PrDocsError::ServiceError("HTTP 500 Internal Server Error".into());
        let a = placeholder("src/a.js", &err);
        let b = placeholder("src/a.js", &err);
        assert_eq!(a, b);
        assert!(a.body.starts_with(PLACEHOLDER_MARKER));
        assert!(a.body.contains("# src/a.js"));
        assert!(a.body.contains("Error"));
        assert!(a.body.contains("HTTP 500"));
    }
}
