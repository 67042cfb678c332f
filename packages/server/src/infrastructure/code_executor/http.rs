//! HTTP 経由の CodeExecutor 実装
//!
//! ドメイン層が定義する CodeExecutor trait の具体的な実装。
//! JDoodle 互換の実行 API に POST し、結果を ExecutionReport に写し取ります。
//!
//! ## エラーの分類
//!
//! - `Rejected`: プロバイダが実行依頼自体を受理しなかった（クレデンシャル不正、
//!   利用上限超過など）。プロバイダのエラーメッセージをそのまま保持する。
//! - `Unavailable`: プロバイダに到達できない・応答を解釈できない（タイムアウト、
//!   接続失敗、HTTP エラー、JSON の破損）。
//!
//! 受理された実行のコンパイルエラーやランタイムエラーは `output` に現れるため、
//! どちらのエラーにもならず正常な ExecutionReport として返ります。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{CodeExecutor, ExecutionError, ExecutionReport, ExecutionRequest};

/// JDoodle API が言語バージョンの指定に使うインデックス。常に最新を使う。
const VERSION_INDEX: &str = "0";

/// HTTP 経由の CodeExecutor 実装
pub struct HttpCodeExecutor {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
    client_secret: String,
}

impl HttpCodeExecutor {
    /// 新しい HttpCodeExecutor を作成
    ///
    /// # Arguments
    ///
    /// * `endpoint` - 実行 API の URL（例: `https://api.jdoodle.com/v1/execute`）
    /// * `client_id` / `client_secret` - プロバイダのクレデンシャル
    /// * `timeout` - リクエスト全体のタイムアウト
    pub fn new(
        endpoint: String,
        client_id: String,
        client_secret: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            client_id,
            client_secret,
        })
    }
}

/// プロバイダへのリクエストボディ
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    script: &'a str,
    /// プロバイダ側の言語エンジン名（例: `nodejs`, `python3`）
    language: &'a str,
    version_index: &'a str,
    stdin: &'a str,
}

/// プロバイダからのレスポンスボディ
///
/// 成功時は `{"output": "...", "statusCode": 200, ...}`、
/// 拒否時は `{"error": "...", "statusCode": 4xx}` が返る。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderResponse {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status_code: Option<i64>,
}

/// レスポンスボディを実行結果に変換する
fn report_from_response(response: ProviderResponse) -> Result<ExecutionReport, ExecutionError> {
    match response.status_code {
        Some(200) => Ok(ExecutionReport {
            output: response.output.unwrap_or_default(),
        }),
        _ => {
            let message = response
                .error
                .or(response.output)
                .unwrap_or_else(|| "Execution failed".to_string());
            Err(ExecutionError::Rejected(message))
        }
    }
}

#[async_trait]
impl CodeExecutor for HttpCodeExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionReport, ExecutionError> {
        let body = ProviderRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            script: &request.script,
            language: request.language.engine_id(),
            version_index: VERSION_INDEX,
            stdin: &request.stdin,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Execution provider unreachable: {}", e);
                ExecutionError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Execution provider returned HTTP {}", status);
            return Err(ExecutionError::Unavailable(format!(
                "provider returned HTTP {}",
                status
            )));
        }

        let provider_response = response.json::<ProviderResponse>().await.map_err(|e| {
            tracing::warn!("Execution provider returned malformed body: {}", e);
            ExecutionError::Unavailable(e.to_string())
        })?;

        report_from_response(provider_response)
    }
}
