use elicit_core::{
    strip_code_fence, ElicitError, LlmResponse, Runnable, StrOutputParser,
    StructuredOutputParser, ToolCall,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, PartialEq)]
struct Verdict {
    is_sufficient: bool,
    reason: String,
}

fn response(content: &str) -> LlmResponse {
    LlmResponse {
        content: content.to_string(),
        tool_calls: vec![],
    }
}

#[tokio::test]
async fn str_parser_returns_content() {
    let output = StrOutputParser.invoke(response("Hello from LLM")).await.unwrap();
    assert_eq!(output, "Hello from LLM");
}

#[test]
fn strip_code_fence_handles_json_and_bare_fences() {
    assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
    assert_eq!(strip_code_fence("  {}  "), "{}");
}

#[tokio::test]
async fn structured_parser_prefers_tool_call_args() {
    let parser = StructuredOutputParser::<Verdict>::new("Verdict");
    let input = LlmResponse {
        content: "ignored".to_string(),
        tool_calls: vec![ToolCall {
            id: "call_1".to_string(),
            name: "Verdict".to_string(),
            args: json!({"is_sufficient": true, "reason": "covered"}),
        }],
    };

    let verdict = parser.invoke(input).await.unwrap();
    assert_eq!(
        verdict,
        Verdict {
            is_sufficient: true,
            reason: "covered".to_string()
        }
    );
}

#[tokio::test]
async fn structured_parser_falls_back_to_fenced_content() {
    let parser = StructuredOutputParser::<Verdict>::new("Verdict");
    let content = "```json\n{\"is_sufficient\": false, \"reason\": \"thin\"}\n```";

    let verdict = parser.invoke(response(content)).await.unwrap();
    assert!(!verdict.is_sufficient);
    assert_eq!(verdict.reason, "thin");
}

#[tokio::test]
async fn structured_parser_reports_schema_mismatch() {
    let parser = StructuredOutputParser::<Verdict>::new("Verdict");

    let err = parser.invoke(response("{\"reason\": 3}")).await.unwrap_err();
    assert!(matches!(err, ElicitError::SchemaMismatch { ref shape, .. } if shape == "Verdict"));

    let err = parser.invoke(response("   ")).await.unwrap_err();
    assert!(matches!(err, ElicitError::SchemaMismatch { .. }));
}
