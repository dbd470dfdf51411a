use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// The confidence value a caller sent, interpolated as received.
///
/// Numbers render like `92.5` or `88`; anything else JSON can carry (a
/// string, `null`) passes through in its own rendering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Percent(f64),
    Other(Value),
}

impl Default for Confidence {
    fn default() -> Self {
        Self::Other(Value::Null)
    }
}

impl From<f64> for Confidence {
    fn from(percent: f64) -> Self {
        Self::Percent(percent)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(percent) => write!(f, "{}", percent),
            Self::Other(Value::String(text)) => f.write_str(text),
            Self::Other(other) => write!(f, "{}", other),
        }
    }
}

/// The instruction sent to the language model for one advice request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvicePrompt(String);

impl AdvicePrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AdvicePrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the advice prompt. Inputs are interpolated as given, without validation.
pub fn build_advice_prompt(disease_name: &str, confidence: impl Into<Confidence>) -> AdvicePrompt {
    let confidence: Confidence = confidence.into();
    AdvicePrompt(format!(
        "As a medical AI assistant, provide comprehensive medical advice for {disease_name} (confidence: {confidence}%).

Please include:
1. What this condition means
2. Immediate precautions to take
3. Recommended treatments
4. When to seek medical attention
5. Prevention tips
6. Lifestyle recommendations

Format the response in a clear, structured manner with bullet points and sections.
Keep it informative but easy to understand for patients."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("Burns", 92.5, "Burns (confidence: 92.5%)")]
    #[case("Cut", 88.0, "Cut (confidence: 88%)")]
    #[case("Insect Bite", 0.125, "Insect Bite (confidence: 0.125%)")]
    #[case("", 150.0, "for  (confidence: 150%)")]
    #[case("Abrasions", -3.0, "Abrasions (confidence: -3%)")]
    fn test_prompt_interpolates_inputs_verbatim(
        #[case] disease: &str,
        #[case] confidence: f64,
        #[case] expected: &str,
    ) {
        let prompt = build_advice_prompt(disease, confidence);
        assert!(
            prompt.as_str().contains(expected),
            "prompt did not contain {:?}: {}",
            expected,
            prompt
        );
    }

    #[rstest]
    #[case(json!(null), "Burns (confidence: null%)")]
    #[case(json!("92.5"), "Burns (confidence: 92.5%)")]
    #[case(json!(70), "Burns (confidence: 70%)")]
    #[case(json!(true), "Burns (confidence: true%)")]
    fn test_non_numeric_confidence_is_interpolated_as_received(
        #[case] raw: Value,
        #[case] expected: &str,
    ) {
        let confidence: Confidence = serde_json::from_value(raw).unwrap();
        let prompt = build_advice_prompt("Burns", confidence);
        assert!(prompt.as_str().contains(expected), "{}", prompt);
    }

    #[test]
    fn test_numbers_deserialize_as_percent() {
        let confidence: Confidence = serde_json::from_value(json!(92.5)).unwrap();
        assert_eq!(confidence, Confidence::Percent(92.5));
        assert_eq!(Confidence::default().to_string(), "null");
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(
            build_advice_prompt("Bruises", 71.25),
            build_advice_prompt("Bruises", 71.25)
        );
    }

    #[test]
    fn test_prompt_requests_every_section() {
        let prompt = build_advice_prompt("Burns", 92.5).into_inner();
        for section in [
            "1. What this condition means",
            "2. Immediate precautions to take",
            "3. Recommended treatments",
            "4. When to seek medical attention",
            "5. Prevention tips",
            "6. Lifestyle recommendations",
        ] {
            assert!(prompt.contains(section), "missing section {section}");
        }
        assert!(prompt.contains("bullet points and sections"));
    }
}
