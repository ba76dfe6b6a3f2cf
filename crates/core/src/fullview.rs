//! Full-view validation of tree photos by a multimodal model.
//!
//! The model is forced to answer through the `fullview_validation` tool so
//! the verdict arrives as structured input rather than free text. Any
//! failure to obtain or read a verdict yields a passing result with zero
//! confidence so a flaky upstream never blocks annotation work.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::CoreError;

/// Tool the model must call with its verdict.
pub const TOOL_NAME: &str = "fullview_validation";

pub const DEFAULT_MODEL_ID: &str = "claude-sonnet-4-5";

pub const MAX_TOKENS: u32 = 512;

/// Reason reported when the upstream call fails.
pub const SKIP_REASON_API_ERROR: &str = "APIエラーのためスキップ";

/// Reason reported when the upstream answer cannot be read.
pub const SKIP_REASON_PARSE_ERROR: &str = "レスポンス解析エラーのためスキップ";

pub const SYSTEM_PROMPT: &str = "あなたは桜の木の写真を評価する画像判定の専門家です。\n\
与えられた画像が「桜の木の全景写真」として適切かどうかを判定してください。\n\
\n\
判定は厳密に以下の基準に従ってください。";

pub const USER_PROMPT: &str = "この画像が桜の木の全景写真として適切かどうかを判定してください。\n\
\n\
## OK判定の条件\n\
以下の条件をすべて満たす場合、OKと判定してください:\n\
- 桜の木の幹（根元付近）から樹冠（木の上部）まで、木全体の形が概ね確認できる\n\
- 木の主要な構造（幹・主枝・樹冠）が画像フレーム内に概ね収まっている\n\
\n\
## NG判定の条件\n\
以下のいずれかに該当する場合、NGと判定してください:\n\
\n\
1. **枝先端のみ**: 幹が写っておらず、枝の先端部分や花のクローズアップのみが写っている\n\
2. **寄りすぎ**: 幹や枝に寄りすぎており、木全体の形状（シルエット）が把握できない\n\
3. **はみ出し**: 木の主要部分（幹・主枝・樹冠）が画像フレームから大きくはみ出しており、全体像が確認できない\n\
\n\
## 判定の注意事項\n\
- 木の一部（枝先や根元）が多少フレームから切れていても、全体の形状が把握できればOKとしてください\n\
- 複数の桜の木が写っている場合、主要な1本の全景が確認できればOKとしてください\n\
- 桜の木以外の被写体（建物、人物など）が写り込んでいても、桜の木の全景が確認できればOKとしてください\n\
- 画像が不鮮明・暗い等の品質問題はこの判定の対象外です（OKとしてください）\n\
\n\
判定結果をfullview_validationツールで返却してください。";

// ---------------------------------------------------------------------------
// Image format
// ---------------------------------------------------------------------------

/// Image encodings the model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Gif,
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Gif => "image/gif",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullviewValidationResult {
    pub is_valid: bool,
    pub reason: String,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
}

impl FullviewValidationResult {
    /// Passing verdict used whenever no real verdict is available.
    pub fn fail_open(reason: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            reason: reason.into(),
            confidence: 0.0,
        }
    }

    /// Read the verdict from the tool input object.
    pub fn from_tool_input(input: &Value) -> Result<Self, CoreError> {
        let field = |name: &str| {
            input
                .get(name)
                .ok_or_else(|| CoreError::Validation(format!("tool input is missing '{name}'")))
        };
        let is_valid = field("is_valid")?
            .as_bool()
            .ok_or_else(|| CoreError::Validation("'is_valid' is not a boolean".into()))?;
        let reason = match field("reason")? {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let confidence = field("confidence")?
            .as_f64()
            .ok_or_else(|| CoreError::Validation("'confidence' is not a number".into()))?;

        Ok(Self {
            is_valid,
            reason,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// JSON schema of the verdict tool's input.
pub fn tool_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "is_valid": {
                "type": "boolean",
                "description": "桜の木全体が適切に写っているか"
            },
            "reason": {
                "type": "string",
                "description": "判定理由の説明"
            },
            "confidence": {
                "type": "number",
                "description": "判定の信頼度（0.0〜1.0）",
                "minimum": 0.0,
                "maximum": 1.0
            }
        },
        "required": ["is_valid", "reason", "confidence"]
    })
}

/// Messages API request body with the image inlined as base64 and the
/// verdict tool forced.
pub fn build_request_body(model_id: &str, image_base64: &str, format: ImageFormat) -> Value {
    json!({
        "model": model_id,
        "max_tokens": MAX_TOKENS,
        "temperature": 0.0,
        "system": SYSTEM_PROMPT,
        "tools": [{
            "name": TOOL_NAME,
            "description": "桜の全景バリデーション判定結果を返却する",
            "input_schema": tool_input_schema(),
        }],
        "tool_choice": { "type": "tool", "name": TOOL_NAME },
        "messages": [{
            "role": "user",
            "content": [
                {
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": format.media_type(),
                        "data": image_base64,
                    }
                },
                { "type": "text", "text": USER_PROMPT }
            ]
        }]
    })
}

/// Extract the verdict from a Messages API response: the first `tool_use`
/// content block wins.
pub fn parse_response(response: &Value) -> Result<FullviewValidationResult, CoreError> {
    let blocks = response
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::Validation("response has no content blocks".into()))?;

    let tool_use = blocks
        .iter()
        .find(|b| b.get("type").and_then(Value::as_str) == Some("tool_use"))
        .ok_or_else(|| CoreError::Validation("response has no tool_use block".into()))?;

    let input = tool_use
        .get("input")
        .ok_or_else(|| CoreError::Validation("tool_use block has no input".into()))?;

    FullviewValidationResult::from_tool_input(input)
}

/// [`parse_response`], falling back to a passing verdict on any error.
pub fn parse_response_or_fail_open(response: &Value) -> FullviewValidationResult {
    parse_response(response)
        .unwrap_or_else(|_| FullviewValidationResult::fail_open(SKIP_REASON_PARSE_ERROR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn response_with(input: Value) -> Value {
        json!({
            "content": [
                { "type": "text", "text": "checking" },
                { "type": "tool_use", "name": TOOL_NAME, "input": input }
            ]
        })
    }

    #[test]
    fn parses_tool_use_verdict() {
        let resp = response_with(json!({
            "is_valid": false,
            "reason": "枝先端のみ",
            "confidence": 0.92
        }));
        let result = parse_response(&resp).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.reason, "枝先端のみ");
        assert!((result.confidence - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn clamps_confidence() {
        let high = parse_response(&response_with(json!({
            "is_valid": true, "reason": "ok", "confidence": 1.7
        })))
        .unwrap();
        assert_eq!(high.confidence, 1.0);

        let low = parse_response(&response_with(json!({
            "is_valid": true, "reason": "ok", "confidence": -3
        })))
        .unwrap();
        assert_eq!(low.confidence, 0.0);
    }

    #[test]
    fn missing_tool_use_is_an_error() {
        let resp = json!({ "content": [{ "type": "text", "text": "looks fine" }] });
        assert_matches!(parse_response(&resp), Err(CoreError::Validation(_)));
    }

    #[test]
    fn malformed_input_fails_open() {
        let resp = response_with(json!({ "is_valid": "yes" }));
        let result = parse_response_or_fail_open(&resp);
        assert_eq!(result, FullviewValidationResult::fail_open(SKIP_REASON_PARSE_ERROR));
        assert!(result.is_valid);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn request_forces_the_verdict_tool() {
        let body = build_request_body("m", "AAAA", ImageFormat::Png);
        assert_eq!(body["tool_choice"]["name"], TOOL_NAME);
        assert_eq!(body["messages"][0]["content"][0]["source"]["media_type"], "image/png");
        assert_eq!(body["messages"][0]["content"][0]["source"]["data"], "AAAA");
        assert_eq!(body["tools"][0]["input_schema"]["required"][2], "confidence");
    }
}
