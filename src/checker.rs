//! Request translation and response shaping
//!
//! Normalises both inbound request shapes into a [`CheckRequest`], runs it
//! through the [`EngineAdapter`] and shapes the engine matches into the
//! outward [`CheckResult`] contract.

use serde::{Deserialize, Serialize};

use crate::adapter::{CheckOutcome, EngineAdapter};
use crate::engine::EngineMatch;
use crate::error::{ProxyError, Result};

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const UNAVAILABLE_RULE_ID: &str = "SERVICE_UNAVAILABLE";
const SHORT_MESSAGE_CHARS: usize = 50;

/// Supported language codes and their display names
pub const SUPPORTED_LANGUAGES: [(&str, &str); 6] = [
    ("en-US", "English (US)"),
    ("en-GB", "English (UK)"),
    ("en-AU", "English (Australia)"),
    ("en-NZ", "English (New Zealand)"),
    ("en-ZA", "English (South Africa)"),
    ("en-CA", "English (Canada)"),
];

/// Raw fields as they arrive in a form or JSON body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckPayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, rename = "questionText")]
    pub question_text: Option<String>,
}

/// Validated check request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    pub text: String,
    pub language: String,
    pub question_text: Option<String>,
}

impl TryFrom<CheckPayload> for CheckRequest {
    type Error = ProxyError;

    fn try_from(payload: CheckPayload) -> Result<Self> {
        let text = payload
            .text
            .ok_or_else(|| ProxyError::Validation("Field required: text".to_string()))?;

        let language = payload
            .language
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let question_text = payload.question_text.filter(|q| !q.is_empty());

        Ok(Self {
            text,
            language,
            question_text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Language {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchContext {
    pub text: String,
    pub offset: usize,
    pub length: usize,
}

/// One grammar or spelling finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub message: String,
    pub short_message: String,
    pub replacements: Vec<Replacement>,
    pub offset: usize,
    pub length: usize,
    pub rule: Rule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<MatchContext>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub language: Language,
    pub matches: Vec<Match>,
    #[serde(rename = "questionText", skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
}

/// Display name for a language code; unknown codes read as "English"
pub fn language_name(code: &str) -> &'static str {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or("English")
}

/// Run `request` through the adapter and shape the outcome
pub async fn check(adapter: &EngineAdapter, request: CheckRequest) -> Result<CheckResult> {
    tracing::debug!(
        "Checking {} chars in {}",
        request.text.chars().count(),
        request.language
    );

    let matches = match adapter.check_text(&request.text, &request.language).await? {
        CheckOutcome::Checked(matches) => matches
            .into_iter()
            .map(|m| shape_match(m, &request.text))
            .collect(),
        CheckOutcome::Unavailable => vec![unavailable_match(&request.text)],
    };

    Ok(CheckResult {
        language: Language {
            name: language_name(&request.language).to_string(),
            code: request.language,
        },
        matches,
        question_text: request.question_text,
    })
}

/// Sentinel match returned while the engine is unavailable
pub fn unavailable_match(text: &str) -> Match {
    Match {
        message: "LanguageTool is not available. Please check server configuration.".to_string(),
        short_message: "Service unavailable".to_string(),
        replacements: Vec::new(),
        offset: 0,
        length: text.chars().count(),
        rule: Rule {
            id: UNAVAILABLE_RULE_ID.to_string(),
            description: "LanguageTool service not available".to_string(),
        },
        context: None,
    }
}

/// Convert an engine match into the outward shape. The engine counts
/// offsets in UTF-16 code units; the result counts characters.
pub fn shape_match(m: EngineMatch, text: &str) -> Match {
    let short_message: String = m.message.chars().take(SHORT_MESSAGE_CHARS).collect();

    let offset = utf16_to_char_index(text, m.offset);
    let end = utf16_to_char_index(text, m.offset.saturating_add(m.length));
    let length = end - offset;

    let context_text = m
        .context
        .map(|c| c.text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| char_slice(text, offset, length));

    let rule_id = m
        .rule
        .and_then(|r| r.id)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let description = if m.message.is_empty() {
        "Grammar issue".to_string()
    } else {
        m.message.clone()
    };

    Match {
        short_message,
        replacements: m
            .replacements
            .into_iter()
            .map(|r| Replacement { value: r.value })
            .collect(),
        offset,
        length,
        rule: Rule {
            id: rule_id,
            description,
        },
        context: Some(MatchContext {
            text: context_text,
            offset,
            length,
        }),
        message: m.message,
    }
}

/// Character index of a UTF-16 position, clamped to the text end. A
/// position inside a surrogate pair maps to the character after it.
fn utf16_to_char_index(text: &str, utf16_pos: usize) -> usize {
    let mut units = 0;
    for (index, c) in text.chars().enumerate() {
        if units >= utf16_pos {
            return index;
        }
        units += c.len_utf16();
    }
    text.chars().count()
}

/// `text[offset..offset + length]` in characters, clamped to the text
fn char_slice(text: &str, offset: usize, length: usize) -> String {
    text.chars().skip(offset).take(length).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::{EngineContext, EngineReplacement, EngineRule};
    use pretty_assertions::assert_eq;

    fn payload(text: Option<&str>, language: Option<&str>, question: Option<&str>) -> CheckPayload {
        CheckPayload {
            text: text.map(String::from),
            language: language.map(String::from),
            question_text: question.map(String::from),
        }
    }

    #[test]
    fn test_missing_text_is_validation_error() {
        let err = CheckRequest::try_from(payload(None, Some("en-US"), None)).unwrap_err();
        assert!(matches!(err, ProxyError::Validation(_)));
    }

    #[test]
    fn test_language_defaults_when_absent_or_empty() {
        let req = CheckRequest::try_from(payload(Some("hi"), None, None)).unwrap();
        assert_eq!(req.language, "en-US");

        let req = CheckRequest::try_from(payload(Some("hi"), Some(""), None)).unwrap();
        assert_eq!(req.language, "en-US");
    }

    #[test]
    fn test_empty_question_text_is_dropped() {
        let req = CheckRequest::try_from(payload(Some("hi"), None, Some(""))).unwrap();
        assert_eq!(req.question_text, None);

        let req = CheckRequest::try_from(payload(Some("hi"), None, Some("Why?"))).unwrap();
        assert_eq!(req.question_text.as_deref(), Some("Why?"));
    }

    #[test]
    fn test_language_names() {
        assert_eq!(language_name("en-US"), "English (US)");
        assert_eq!(language_name("en-ZA"), "English (South Africa)");
        assert_eq!(language_name("fr-FR"), "English");
    }

    #[test]
    fn test_unavailable_match_counts_chars() {
        let m = unavailable_match("naïve café");
        assert_eq!(m.rule.id, UNAVAILABLE_RULE_ID);
        assert_eq!(m.offset, 0);
        assert_eq!(m.length, 10);
    }

    #[test]
    fn test_shape_match_full() {
        let engine = EngineMatch {
            message: "Possible spelling mistake found.".to_string(),
            short_message: Some("Spelling mistake".to_string()),
            replacements: vec![EngineReplacement {
                value: "This".to_string(),
            }],
            offset: 0,
            length: 5,
            context: Some(EngineContext {
                text: "Thiss is bad.".to_string(),
                offset: 0,
                length: 5,
            }),
            rule: Some(EngineRule {
                id: Some("MORFOLOGIK_RULE_EN_US".to_string()),
                description: Some("Possible spelling mistake".to_string()),
            }),
        };

        let shaped = shape_match(engine, "Thiss is bad.");
        assert_eq!(
            shaped,
            Match {
                message: "Possible spelling mistake found.".to_string(),
                short_message: "Possible spelling mistake found.".to_string(),
                replacements: vec![Replacement {
                    value: "This".to_string()
                }],
                offset: 0,
                length: 5,
                rule: Rule {
                    id: "MORFOLOGIK_RULE_EN_US".to_string(),
                    description: "Possible spelling mistake found.".to_string(),
                },
                context: Some(MatchContext {
                    text: "Thiss is bad.".to_string(),
                    offset: 0,
                    length: 5,
                }),
            }
        );
    }

    #[test]
    fn test_shape_match_fallbacks() {
        let engine = EngineMatch {
            offset: 8,
            length: 3,
            ..Default::default()
        };

        let shaped = shape_match(engine, "This is bad.");
        assert_eq!(shaped.short_message, "");
        assert_eq!(shaped.rule.id, "UNKNOWN");
        assert_eq!(shaped.rule.description, "Grammar issue");
        assert_eq!(shaped.context.unwrap().text, "bad");
    }

    #[test]
    fn test_short_message_truncates_to_50_chars() {
        let message = "é".repeat(80);
        let engine = EngineMatch {
            message: message.clone(),
            ..Default::default()
        };

        let shaped = shape_match(engine, "");
        assert_eq!(shaped.short_message.chars().count(), 50);
        assert!(message.starts_with(&shaped.short_message));
    }

    #[test]
    fn test_context_slice_clamps_out_of_range() {
        let engine = EngineMatch {
            offset: 10,
            length: 50,
            ..Default::default()
        };
        let shaped = shape_match(engine, "short");
        assert_eq!(shaped.context.unwrap().text, "");
    }

    #[test]
    fn test_utf16_offsets_become_char_offsets() {
        // "😀" is two UTF-16 units, so the engine reports "Thiss" at 3..8
        let engine = EngineMatch {
            message: "Possible spelling mistake found.".to_string(),
            offset: 3,
            length: 5,
            ..Default::default()
        };

        let shaped = shape_match(engine, "😀 Thiss is");
        assert_eq!(shaped.offset, 2);
        assert_eq!(shaped.length, 5);
        assert_eq!(
            shaped.context,
            Some(MatchContext {
                text: "Thiss".to_string(),
                offset: 2,
                length: 5,
            })
        );
    }

    #[test]
    fn test_utf16_length_spanning_astral_chars() {
        let engine = EngineMatch {
            offset: 3,
            length: 4,
            ..Default::default()
        };

        let shaped = shape_match(engine, "ab 😀😀 cd");
        assert_eq!(shaped.offset, 3);
        assert_eq!(shaped.length, 2);
        assert_eq!(shaped.context.unwrap().text, "😀😀");
    }

    #[test]
    fn test_question_text_key_absent_when_none() {
        let result = CheckResult {
            language: Language {
                name: "English (US)".to_string(),
                code: "en-US".to_string(),
            },
            matches: vec![],
            question_text: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("questionText").is_none());
    }

    #[tokio::test]
    async fn test_check_degraded_mode() {
        let mut config = Config::default();
        config.engine.url = String::new();
        let adapter = EngineAdapter::connect(&config).await;

        let request = CheckRequest {
            text: "This is a test.".to_string(),
            language: "fr-FR".to_string(),
            question_text: Some("Describe a test".to_string()),
        };
        let result = check(&adapter, request).await.unwrap();

        assert_eq!(result.language.code, "fr-FR");
        assert_eq!(result.language.name, "English");
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].rule.id, UNAVAILABLE_RULE_ID);
        assert_eq!(result.matches[0].length, 15);
        assert_eq!(result.question_text.as_deref(), Some("Describe a test"));
    }

    #[tokio::test]
    async fn test_check_degraded_mode_keeps_display_name() {
        let mut config = Config::default();
        config.engine.url = String::new();
        let adapter = EngineAdapter::connect(&config).await;

        let request = CheckRequest {
            text: "Colour".to_string(),
            language: "en-GB".to_string(),
            question_text: None,
        };
        let result = check(&adapter, request).await.unwrap();

        assert_eq!(
            result.language,
            Language {
                name: "English (UK)".to_string(),
                code: "en-GB".to_string(),
            }
        );
        assert_eq!(result.matches[0].rule.id, UNAVAILABLE_RULE_ID);
    }
}
