//! UseCase: コード実行
//!
//! 実行プロバイダの呼び出しはルームのロック外で行う。ルームは実行中フラグ
//! （begin / finish）だけを持ち、同時実行の重複をはねる。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RunCodeUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 実行結果（成功・拒否・プロバイダ障害）が全メンバーに届くことを保証
//! - 実行中の再実行依頼が依頼者だけにエラーとして返ることを保証
//! - 実行対象のコード・言語がルーム状態に反映されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：ホストによる実行と結果のブロードキャスト
//! - 異常系：実行の重複、プロバイダの拒否・障害、非ホストの実行依頼
//!
//! ### モックの使い方
//! - CodeExecutor のみ mockall のモックを使う（外部 API のため）。
//!   Registry / MessagePusher は実物のインメモリ実装を使う。

use std::sync::Arc;

use crate::domain::{
    CodeExecutor, ExecutionError, ExecutionRequest, Language, MessagePusher, Participant,
    RegistryError, RoomError, RoomId, RoomRegistry, UserId,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// 実行中の重複依頼を拒否するときにクライアントへ返すメッセージ
pub const EXECUTION_IN_PROGRESS_ERROR: &str = "Execution already in progress";

/// プロバイダに到達できなかったときにクライアントへ返すメッセージ
pub const EXECUTION_UNAVAILABLE_ERROR: &str = "Error while executing code";

/// コード実行のユースケース
pub struct RunCodeUseCase {
    /// Registry（ルーム状態管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// CodeExecutor（実行プロバイダの抽象化）
    executor: Arc<dyn CodeExecutor>,
}

impl RunCodeUseCase {
    /// 新しい RunCodeUseCase を作成
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        executor: Arc<dyn CodeExecutor>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            executor,
        }
    }

    /// コード実行を行い、結果を全メンバーへ通知する（ホスト専用）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        actor: &UserId,
        code: String,
        language: Language,
        input: String,
    ) -> Result<(), RegistryError> {
        // 1. 実行中フラグを立てる。実行対象のコード・言語もここでルームに反映する
        if let Err(e) = self
            .registry
            .begin_execution(room_id, actor, code.clone(), language)
            .await
        {
            // 実行中の重複依頼は依頼者だけにエラーを返し、正常終了とする
            if e == RegistryError::Room(RoomError::ExecutionInFlight) {
                self.reject_overlap(room_id, actor).await;
                return Ok(());
            }
            return Err(e);
        }

        // 2. プロバイダを呼び出す（ロック外・数秒かかり得る）
        let request = ExecutionRequest {
            script: code,
            language,
            stdin: input,
        };
        let event = match self.executor.execute(request).await {
            Ok(report) => ServerEvent::ExecutionResult {
                output: Some(report.output),
                error: None,
            },
            Err(ExecutionError::Rejected(message)) => ServerEvent::ExecutionResult {
                output: None,
                error: Some(message),
            },
            Err(ExecutionError::Unavailable(detail)) => {
                tracing::warn!("Execution provider unavailable: {}", detail);
                ServerEvent::ExecutionResult {
                    output: None,
                    error: Some(EXECUTION_UNAVAILABLE_ERROR.to_string()),
                }
            }
        };

        // 3. 実行中フラグを下ろし、現在の全メンバーへ結果を通知する
        match self.registry.finish_execution(room_id).await {
            Ok(members) => self.broadcast_result(&members, &event).await,
            Err(_) => {
                // 実行中に全員が退出してルームが消えた。結果は捨てる
                tracing::warn!(
                    "Room '{}' disappeared during execution; result discarded",
                    room_id.as_str()
                );
            }
        }
        Ok(())
    }

    /// 実行中の重複依頼を依頼者本人にだけ通知する
    async fn reject_overlap(&self, room_id: &RoomId, actor: &UserId) {
        let Some(connection_id) = self.registry.connection_of(room_id, actor).await else {
            return;
        };
        let event = ServerEvent::ExecutionResult {
            output: None,
            error: Some(EXECUTION_IN_PROGRESS_ERROR.to_string()),
        };
        let json = serde_json::to_string(&event).unwrap();
        if let Err(e) = self.message_pusher.push_to(&connection_id, &json).await {
            tracing::warn!("Failed to push execution-result: {}", e);
        }
    }

    async fn broadcast_result(&self, members: &[Participant], event: &ServerEvent) {
        let connection_ids: Vec<_> = members.iter().map(|p| p.connection_id.clone()).collect();
        let json = serde_json::to_string(event).unwrap();
        if let Err(e) = self.message_pusher.broadcast(&connection_ids, &json).await {
            tracing::warn!("Failed to broadcast execution-result: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, ExecutionReport, MockCodeExecutor, Username};
    use crate::infrastructure::message_pusher::WebSocketMessagePusher;
    use crate::infrastructure::registry::InMemoryRoomRegistry;
    use kobo_shared::time::FixedClock;
    use tokio::sync::mpsc;

    fn create_usecase(
        executor: MockCodeExecutor,
    ) -> (
        RunCodeUseCase,
        Arc<InMemoryRoomRegistry>,
        Arc<WebSocketMessagePusher>,
    ) {
        let registry = Arc::new(InMemoryRoomRegistry::new(Arc::new(FixedClock::new(
            1_700_000_000_000,
        ))));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = RunCodeUseCase::new(registry.clone(), pusher.clone(), Arc::new(executor));
        (usecase, registry, pusher)
    }

    async fn join(
        registry: &Arc<InMemoryRoomRegistry>,
        pusher: &Arc<WebSocketMessagePusher>,
        room: &str,
        id: &str,
    ) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::generate();
        pusher.register(connection_id.clone(), tx).await;
        registry
            .join(
                room_id(room),
                user(id),
                Username::try_from(id.to_string()).unwrap(),
                connection_id,
            )
            .await;
        rx
    }

    fn next_event(rx: &mut mpsc::UnboundedReceiver<String>) -> ServerEvent {
        let raw = rx.try_recv().expect("expected a pushed event");
        serde_json::from_str(&raw).unwrap()
    }

    fn room_id(id: &str) -> RoomId {
        RoomId::try_from(id.to_string()).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::try_from(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_execution_result_reaches_all_members() {
        // テスト項目: 実行結果が依頼者を含む全メンバーに届く
        // given (前提条件):
        let mut executor = MockCodeExecutor::new();
        executor.expect_execute().times(1).returning(|request| {
            assert_eq!(request.script, "print(42)");
            assert_eq!(request.language, Language::Python);
            assert_eq!(request.stdin, "");
            Ok(ExecutionReport {
                output: "42\n".to_string(),
            })
        });
        let (usecase, registry, pusher) = create_usecase(executor);
        let mut alice_rx = join(&registry, &pusher, "room-1", "alice").await;
        let mut bob_rx = join(&registry, &pusher, "room-1", "bob").await;

        // when (操作):
        usecase
            .execute(
                &room_id("room-1"),
                &user("alice"),
                "print(42)".to_string(),
                Language::Python,
                String::new(),
            )
            .await
            .unwrap();

        // then (期待する結果):
        for rx in [&mut alice_rx, &mut bob_rx] {
            match next_event(rx) {
                ServerEvent::ExecutionResult { output, error } => {
                    assert_eq!(output.as_deref(), Some("42\n"));
                    assert_eq!(error, None);
                }
                other => panic!("expected execution-result, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_executed_code_and_language_stick_to_the_room() {
        // テスト項目: 実行対象のコードと言語がルーム状態に反映される
        // given (前提条件):
        let mut executor = MockCodeExecutor::new();
        executor.expect_execute().returning(|_| {
            Ok(ExecutionReport {
                output: String::new(),
            })
        });
        let (usecase, registry, pusher) = create_usecase(executor);
        let _alice_rx = join(&registry, &pusher, "room-1", "alice").await;

        // when (操作):
        usecase
            .execute(
                &room_id("room-1"),
                &user("alice"),
                "std::cout << 1;".to_string(),
                Language::Cpp,
                String::new(),
            )
            .await
            .unwrap();

        // then (期待する結果):
        let snapshot = registry.snapshot(&room_id("room-1")).await.unwrap();
        assert_eq!(snapshot.code, "std::cout << 1;");
        assert_eq!(snapshot.language, Language::Cpp);
    }

    #[tokio::test]
    async fn test_overlapping_request_errors_only_the_requester() {
        // テスト項目: 実行中の再実行依頼は依頼者だけにエラーが返り、
        //             実行完了後は再び実行できる
        // given (前提条件):
        let mut executor = MockCodeExecutor::new();
        executor.expect_execute().times(2).returning(|_| {
            Ok(ExecutionReport {
                output: "ok".to_string(),
            })
        });
        let (usecase, registry, pusher) = create_usecase(executor);
        let mut alice_rx = join(&registry, &pusher, "room-1", "alice").await;
        let mut bob_rx = join(&registry, &pusher, "room-1", "bob").await;

        // when (操作): begin だけ済ませた状態（実行中）で依頼を重ねる
        registry
            .begin_execution(
                &room_id("room-1"),
                &user("alice"),
                "spin()".to_string(),
                Language::Javascript,
            )
            .await
            .unwrap();
        usecase
            .execute(
                &room_id("room-1"),
                &user("alice"),
                "print(1)".to_string(),
                Language::Python,
                String::new(),
            )
            .await
            .unwrap();

        // then (期待する結果): 依頼者にだけ in-progress エラーが届く
        match next_event(&mut alice_rx) {
            ServerEvent::ExecutionResult { output, error } => {
                assert_eq!(output, None);
                assert_eq!(error.as_deref(), Some(EXECUTION_IN_PROGRESS_ERROR));
            }
            other => panic!("expected execution-result, got {:?}", other),
        }
        assert!(bob_rx.try_recv().is_err());

        // when (操作): 実行が完了すれば次の依頼は通る
        registry.finish_execution(&room_id("room-1")).await.unwrap();
        usecase
            .execute(
                &room_id("room-1"),
                &user("alice"),
                "print(2)".to_string(),
                Language::Python,
                String::new(),
            )
            .await
            .unwrap();

        // then (期待する結果):
        match next_event(&mut bob_rx) {
            ServerEvent::ExecutionResult { output, .. } => {
                assert_eq!(output.as_deref(), Some("ok"));
            }
            other => panic!("expected execution-result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_rejection_is_forwarded_verbatim() {
        // テスト項目: プロバイダが実行を拒否した場合、その文言がそのまま届く
        // given (前提条件):
        let mut executor = MockCodeExecutor::new();
        executor
            .expect_execute()
            .returning(|_| Err(ExecutionError::Rejected("daily limit reached".to_string())));
        let (usecase, registry, pusher) = create_usecase(executor);
        let mut alice_rx = join(&registry, &pusher, "room-1", "alice").await;

        // when (操作):
        usecase
            .execute(
                &room_id("room-1"),
                &user("alice"),
                "print(1)".to_string(),
                Language::Python,
                String::new(),
            )
            .await
            .unwrap();

        // then (期待する結果):
        match next_event(&mut alice_rx) {
            ServerEvent::ExecutionResult { output, error } => {
                assert_eq!(output, None);
                assert_eq!(error.as_deref(), Some("daily limit reached"));
            }
            other => panic!("expected execution-result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_outage_maps_to_generic_error_and_unlocks() {
        // テスト項目: プロバイダ障害は固定文言のエラーになり、
        //             実行中フラグは解除される
        // given (前提条件):
        let mut executor = MockCodeExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_| Err(ExecutionError::Unavailable("connect timeout".to_string())));
        let (usecase, registry, pusher) = create_usecase(executor);
        let mut alice_rx = join(&registry, &pusher, "room-1", "alice").await;

        // when (操作):
        usecase
            .execute(
                &room_id("room-1"),
                &user("alice"),
                "print(1)".to_string(),
                Language::Python,
                String::new(),
            )
            .await
            .unwrap();

        // then (期待する結果):
        match next_event(&mut alice_rx) {
            ServerEvent::ExecutionResult { output, error } => {
                assert_eq!(output, None);
                assert_eq!(error.as_deref(), Some(EXECUTION_UNAVAILABLE_ERROR));
            }
            other => panic!("expected execution-result, got {:?}", other),
        }
        // フラグが解除されているので begin が通る
        assert!(
            registry
                .begin_execution(
                    &room_id("room-1"),
                    &user("alice"),
                    "print(2)".to_string(),
                    Language::Python,
                )
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_non_host_request_is_rejected_without_calling_provider() {
        // テスト項目: 非ホストの実行依頼はプロバイダを呼ばずに拒否される
        // given (前提条件):
        let mut executor = MockCodeExecutor::new();
        executor.expect_execute().times(0);
        let (usecase, registry, pusher) = create_usecase(executor);
        let _alice_rx = join(&registry, &pusher, "room-1", "alice").await;
        let _bob_rx = join(&registry, &pusher, "room-1", "bob").await;

        // when (操作):
        let result = usecase
            .execute(
                &room_id("room-1"),
                &user("bob"),
                "print(1)".to_string(),
                Language::Python,
                String::new(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            RegistryError::Room(RoomError::NotHost("bob".to_string()))
        );
    }
}
