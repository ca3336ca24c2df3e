//! Persona context and system prompt construction.

use std::path::Path;

use tracing::debug;

use crate::error::TwinError;

/// Grounding material for the persona the agent speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentContext {
    persona_name: String,
    summary: String,
    detail: String,
}

impl AgentContext {
    pub fn new(persona_name: impl Into<String>, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            persona_name: persona_name.into(),
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Load the summary and pre-extracted detail text (resume, profile) from
    /// disk. Detail files are concatenated in order; empty ones are skipped.
    pub fn load(
        persona_name: impl Into<String>,
        summary_path: &Path,
        detail_paths: &[impl AsRef<Path>],
    ) -> Result<Self, TwinError> {
        let summary = std::fs::read_to_string(summary_path)?;
        let mut detail = String::new();
        for path in detail_paths {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)?;
            debug!(path = %path.display(), bytes = text.len(), "Loaded detail text");
            detail.push_str(&text);
        }
        Ok(Self::new(persona_name, summary, detail))
    }

    pub fn persona_name(&self) -> &str {
        &self.persona_name
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// System instructions for this persona.
    pub fn system_prompt(&self) -> String {
        build(&self.persona_name, &self.summary, &self.detail)
    }

    /// Opening line shown before the visitor asks anything.
    pub fn greeting(&self) -> String {
        let first_name = self
            .persona_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.persona_name);
        format!(
            "Hi, I am {first_name}. I'd be happy to share more about my career path, feel free to ask me any questions!"
        )
    }
}

/// Build the system instructions. Pure and deterministic.
pub fn build(persona_name: &str, summary: &str, detail: &str) -> String {
    let name = persona_name;
    format!(
        "You are acting as {name}. You are answering questions on {name}'s website, \
particularly questions related to {name}'s career, background, skills and experience. \
Your responsibility is to represent {name} for interactions on the website as faithfully as possible. \
You are given a summary of {name}'s background and other details which you can use to answer questions. \
Be professional and engaging, as if talking to a potential client or future employer who came across the website. \
If the user asks question about {name}'s academics, use your query_academics tool to get the information and answer the question. \
If you don't know the answer to any question, use your record_unknown_question tool to record the question that you couldn't answer, even if it's about something trivial or unrelated to career. \
If the user is engaging in discussion, try to steer them towards getting in touch via email; ask for their email and record it using your record_user_details tool. \
\n\n## Summary:\n{summary}\n\n## Detail:\n{detail}\n\n\
With this context, please chat with the user, always staying in character as {name}."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn build_is_deterministic() {
        let a = build("Ada Lovelace", "Mathematician.", "Wrote the first program.");
        let b = build("Ada Lovelace", "Mathematician.", "Wrote the first program.");
        assert_eq!(a, b);
    }

    #[test]
    fn persona_name_only_changes_name_occurrences() {
        let summary = "Summary text.";
        let detail = "Detail text.";
        let ada = build("Ada", summary, detail);
        let grace = build("Grace", summary, detail);

        assert_eq!(ada.matches("Ada").count(), grace.matches("Grace").count());
        assert!(!grace.contains("Ada"));
        assert_eq!(ada.replace("Ada", "Grace"), grace);
        assert!(grace.contains("## Summary:\nSummary text."));
        assert!(grace.contains("## Detail:\nDetail text."));
    }

    #[test]
    fn prompt_mentions_every_tool() {
        let prompt = build("Ada", "", "");
        for tool in ["query_academics", "record_unknown_question", "record_user_details"] {
            assert!(prompt.contains(tool), "missing {tool}");
        }
        assert!(prompt.ends_with("always staying in character as Ada."));
    }

    #[test]
    fn load_concatenates_detail_files() {
        let mut summary = NamedTempFile::new().unwrap();
        write!(summary, "I build compilers.").unwrap();
        let mut resume = NamedTempFile::new().unwrap();
        write!(resume, "Resume. ").unwrap();
        let empty = NamedTempFile::new().unwrap();
        let mut profile = NamedTempFile::new().unwrap();
        write!(profile, "Profile.").unwrap();

        let ctx = AgentContext::load(
            "Ada Lovelace",
            summary.path(),
            &[resume.path(), empty.path(), profile.path()],
        )
        .unwrap();

        assert_eq!(ctx.summary(), "I build compilers.");
        assert_eq!(ctx.detail(), "Resume. Profile.");
        assert_eq!(ctx.system_prompt(), build("Ada Lovelace", "I build compilers.", "Resume. Profile."));
        assert!(ctx.greeting().starts_with("Hi, I am Ada."));
    }

    #[test]
    fn load_missing_summary_is_io_error() {
        let err = AgentContext::load("Ada", Path::new("/definitely/not/here.md"), &[] as &[&Path])
            .unwrap_err();
        assert!(matches!(err, TwinError::Io(_)));
    }
}
