use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Structured attributes the tool reports for a single photo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoAnalysis {
    pub description: String,
    #[serde(default)]
    pub inferred_location: String,
    #[serde(default)]
    pub subjects: Subjects,
    pub dominant_emotion: String,
}

/// The tool answers with either a sentence or a list for `subjects`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subjects {
    One(String),
    Many(Vec<String>),
}

impl Default for Subjects {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// The part of an analysis that goes into the synthesis prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoAnalysisSummary<'a> {
    pub description: &'a str,
    pub dominant_emotion: &'a str,
}

impl<'a> From<&'a PhotoAnalysis> for PhotoAnalysisSummary<'a> {
    fn from(analysis: &'a PhotoAnalysis) -> Self {
        Self {
            description: &analysis.description,
            dominant_emotion: &analysis.dominant_emotion,
        }
    }
}

impl From<PhotoAnalysisSummary<'_>> for Value {
    fn from(summary: PhotoAnalysisSummary<'_>) -> Self {
        let mut object = Map::new();
        object.insert("description".into(), summary.description.into());
        object.insert("dominant_emotion".into(), summary.dominant_emotion.into());
        Value::Object(object)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResult {
    pub post_text: String,
    /// Advisory only: models answer with a file name, an index or nothing.
    #[serde(default)]
    pub image_to_post: Option<Value>,
}

impl PostResult {
    pub fn image_label(&self) -> String {
        match &self.image_to_post {
            None | Some(Value::Null) => "N/A".to_string(),
            Some(Value::String(name)) => name.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Analysis,
    Synthesis,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Analysis => "analysis",
            Self::Synthesis => "synthesis",
            Self::Write => "write",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub image: Option<PathBuf>,
    pub message: String,
}

/// Everything that went wrong during one run, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub images: usize,
    pub analyzed: usize,
    pub failures: Vec<StageFailure>,
}

impl RunReport {
    pub fn record(&mut self, stage: Stage, image: Option<PathBuf>, err: &dyn std::error::Error) {
        self.failures.push(StageFailure {
            stage,
            image,
            message: err.to_string(),
        });
    }

    pub fn failures_in(&self, stage: Stage) -> impl Iterator<Item = &StageFailure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    NoImages,
    NoAnalyses,
    SynthesisFailed,
    Published {
        post: PostResult,
        saved_to: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn subjects_accepts_text_or_list() -> anyhow::Result<()> {
        let one: PhotoAnalysis = serde_json::from_str(
            r#"{"description": "d", "inferred_location": "l", "subjects": "a dog", "dominant_emotion": "joy"}"#,
        )?;
        assert_eq!(one.subjects, Subjects::One("a dog".into()));
        let many: PhotoAnalysis = serde_json::from_str(
            r#"{"description": "d", "subjects": ["a", "b"], "dominant_emotion": "joy"}"#,
        )?;
        assert_eq!(many.subjects, Subjects::Many(vec!["a".into(), "b".into()]));
        assert_eq!(many.inferred_location, "");
        Ok(())
    }

    #[test]
    fn summary_keeps_two_keys() {
        let analysis = PhotoAnalysis {
            description: "a quiet harbor".into(),
            inferred_location: "Lisbon".into(),
            subjects: Subjects::One("boats".into()),
            dominant_emotion: "calm".into(),
        };
        let summary = Value::from(PhotoAnalysisSummary::from(&analysis));
        assert_eq!(
            summary,
            serde_json::json!({"description": "a quiet harbor", "dominant_emotion": "calm"})
        );
    }

    #[test]
    fn post_without_image_is_accepted() -> anyhow::Result<()> {
        let post: PostResult = serde_json::from_str(r#"{"post_text": "Hello"}"#)?;
        assert_eq!(post.image_to_post, None);
        assert_eq!(post.image_label(), "N/A");
        let indexed: PostResult = serde_json::from_str(r#"{"post_text": "Hi", "image_to_post": 2}"#)?;
        assert_eq!(indexed.image_label(), "2");
        Ok(())
    }
}
