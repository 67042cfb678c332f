//! コード実行のインターフェース定義
//!
//! 依存性逆転の原則（DIP）に基づき、Domain 層でインターフェースを定義し、
//! Infrastructure 層で実装します。Usecase 層は実行プロバイダ（JDoodle）の
//! HTTP API を知りません。

use async_trait::async_trait;

use super::error::ExecutionError;
use super::value_object::Language;

/// 実行リクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub script: String,
    pub language: Language,
    pub stdin: String,
}

/// 実行結果（プロバイダが実行を受理した場合）
///
/// `output` には stdout と stderr が混ざって入る。コンパイルエラーも
/// ランタイムエラーもここに現れるため、受理された実行の失敗は
/// エラーではなく出力として扱う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub output: String,
}

/// 外部の実行プロバイダへのコード実行依頼
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionReport, ExecutionError>;
}
