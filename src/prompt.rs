use crate::generator::ATTACHMENT_PREFIX;
use crate::model::{PhotoAnalysis, PhotoAnalysisSummary};
use serde_json::Value;
use std::path::Path;

pub fn analysis_prompt(image: &Path) -> String {
    format!(
        "{ATTACHMENT_PREFIX}{} Analyze this photo. Return a JSON object with the following keys: \
         'description', 'inferred_location', 'subjects', and 'dominant_emotion'. Be descriptive.",
        image.display()
    )
}

pub fn post_prompt(analyses: &[PhotoAnalysis]) -> String {
    let data: Value = analyses
        .iter()
        .map(|analysis| Value::from(PhotoAnalysisSummary::from(analysis)))
        .collect();
    format!(
        "You are a social media manager. I'll provide a JSON array of photo analyses. \
         Create a professional and engaging LinkedIn post that weaves these photos into a narrative. \
         Use the descriptions and emotions to build the story. Include relevant hashtags. \
         Format the output as a JSON object with 'post_text' and 'image_to_post' keys. \
         Here is the photo data: {data}"
    )
}
