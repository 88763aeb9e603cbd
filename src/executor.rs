use crate::action::{Action, ActionKind, ActionResult};
use crate::engine::SharedExecutionContext;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// PageDriver는 페이지에 액션을 실제로 발생시키는 추상 계층을 정의한다.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 조합 가능한 액션 묶음을 한 번에 실행하고 액션마다 결과를 하나씩 반환한다.
    async fn dispatch_batch(&self, actions: &[Action]) -> anyhow::Result<Vec<ActionResult>>;

    /// 단독 액션을 실행한다. 데이터 참조는 `ctx`로 해석한다.
    async fn dispatch_single(
        &self,
        action: &Action,
        ctx: SharedExecutionContext,
    ) -> anyhow::Result<ActionResult>;
}

/// DummyExecutor는 실제 페이지 없이 로그만 남기고 성공으로 처리하는 기본 구현이다.
#[derive(Debug, Default, Clone)]
pub struct DummyExecutor;

#[async_trait]
impl PageDriver for DummyExecutor {
    /// 묶음의 각 액션을 로그로 남긴다.
    async fn dispatch_batch(&self, actions: &[Action]) -> anyhow::Result<Vec<ActionResult>> {
        for action in actions {
            info!(action = %action.display(), "[DummyExecutor] 이벤트 실행");
        }
        Ok(actions.iter().map(|_| ActionResult::pass()).collect())
    }

    /// 대기는 실제로 기다리고 데이터 입력은 해석 결과를 로그로 남긴다.
    async fn dispatch_single(
        &self,
        action: &Action,
        ctx: SharedExecutionContext,
    ) -> anyhow::Result<ActionResult> {
        match &action.kind {
            ActionKind::Wait { millis } => {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            ActionKind::InsertData { origin, name } => {
                let resolved = {
                    let mut guard = ctx.write().await;
                    guard.resolve(*origin, name)
                };
                match resolved {
                    Ok(value) => info!(%origin, %name, %value, "[DummyExecutor] 데이터 입력"),
                    Err(err) => return Ok(ActionResult::fail(err.to_string())),
                }
            }
            _ => info!(action = %action.display(), "[DummyExecutor] 명령 실행"),
        }
        Ok(ActionResult::pass())
    }
}

/// PageDriver를 공유하기 위한 Arc 타입 별칭이다.
pub type SharedExecutor = Arc<dyn PageDriver>;
