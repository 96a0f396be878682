//! Generic OpenAI-compatible chat-completions client
//!
//! Works with any provider speaking OpenAI's API format (OpenAI, Azure-style
//! gateways, DeepSeek, Together, a local Ollama `/v1` endpoint, ...).

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use elicit_core::{ElicitError, LlmRequest, LlmResponse, Message, Runnable, ToolCall, ToolSpec, Value};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Request body for the chat completions endpoint
#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<FunctionTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
}

#[derive(Serialize, Debug, Clone)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

#[derive(Serialize, Debug, Clone)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<ToolSpec> for FunctionTool {
    fn from(tool: ToolSpec) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionSpec {
                name: tool.name,
                description: tool.description,
                parameters: tool.parameters,
            },
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WireToolCall {
    pub id: String,
    pub function: WireFunctionCall,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WireFunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as sent by the provider.
    pub arguments: String,
}

impl From<WireToolCall> for ToolCall {
    fn from(call: WireToolCall) -> Self {
        let args = serde_json::from_str(&call.function.arguments)
            .unwrap_or(Value::String(call.function.arguments));
        Self {
            id: call.id,
            name: call.function.name,
            args,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// OpenAI-style error response
#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiError {
    pub error: ErrorDetail,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: Client,
    endpoint: Url,
    api_key: Option<SecretString>,
    default_model: String,
    temperature: Option<f32>,
}

impl std::fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleClient {
    pub fn builder() -> OpenAiCompatibleBuilder {
        OpenAiCompatibleBuilder::default()
    }

    /// Client for api.openai.com using `gpt-4o` at temperature 0.
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ElicitError> {
        Self::builder()
            .base_url("https://api.openai.com/v1")?
            .api_key(api_key)
            .default_model("gpt-4o")
            .temperature(0.0)
            .build()
    }

    pub fn set_default_model(&mut self, model: impl Into<String>) {
        self.default_model = model.into();
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn to_wire(&self, input: LlmRequest) -> ChatCompletionRequest {
        let LlmRequest {
            model,
            messages,
            tools,
            temperature,
        } = input;
        let model = if model.is_empty() {
            self.default_model.clone()
        } else {
            model
        };
        // A single tool is a structured-output request; force the model to call it.
        let tool_choice = match tools.as_slice() {
            [only] => Some(serde_json::json!({
                "type": "function",
                "function": { "name": only.name },
            })),
            _ => None,
        };
        let tools = if tools.is_empty() {
            None
        } else {
            Some(tools.into_iter().map(FunctionTool::from).collect())
        };

        ChatCompletionRequest {
            model,
            messages,
            tools,
            tool_choice,
            temperature: temperature.or(self.temperature),
            stream: false,
        }
    }
}

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for OpenAiCompatibleClient {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, ElicitError> {
        let request = self.to_wire(input);
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "sending chat completion"
        );

        let mut builder = self.http.post(self.endpoint.clone()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }
        let response = builder
            .send()
            .await
            .map_err(|err| ElicitError::Capability(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|err| err.error.message)
                .unwrap_or(body);
            return Err(ElicitError::Capability(format!("HTTP {status}: {message}")));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| ElicitError::Capability(err.to_string()))?;
        if let Some(usage) = &completion.usage {
            tracing::debug!(
                model = %completion.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "chat completion usage"
            );
        }

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ElicitError::Capability("response contained no choices".to_string()))?;
        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls: choice
                .message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(ToolCall::from)
                .collect(),
        })
    }
}

pub struct OpenAiCompatibleBuilder {
    base_url: Option<Url>,
    api_key: Option<SecretString>,
    default_model: String,
    temperature: Option<f32>,
    timeout: Duration,
}

impl Default for OpenAiCompatibleBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            default_model: String::new(),
            temperature: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OpenAiCompatibleBuilder {
    pub fn base_url(mut self, base_url: &str) -> Result<Self, ElicitError> {
        let mut url = Url::parse(base_url)
            .map_err(|err| ElicitError::InvalidConfig(format!("base url '{base_url}': {err}")))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = Some(url);
        Ok(self)
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenAiCompatibleClient, ElicitError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ElicitError::InvalidConfig("base url is required".to_string()))?;
        if self.default_model.is_empty() {
            return Err(ElicitError::InvalidConfig(
                "default model is required".to_string(),
            ));
        }
        let endpoint = base_url
            .join("chat/completions")
            .map_err(|err| ElicitError::InvalidConfig(err.to_string()))?;
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| ElicitError::InvalidConfig(err.to_string()))?;

        Ok(OpenAiCompatibleClient {
            http,
            endpoint,
            api_key: self.api_key,
            default_model: self.default_model,
            temperature: self.temperature,
        })
    }
}
