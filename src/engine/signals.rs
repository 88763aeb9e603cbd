use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// 호스트 페이지 상태를 알려 주는 외부 신호이다.
#[async_trait]
pub trait HostSignals: Send + Sync {
    /// 페이지가 이동 중이 아닌 안정 상태가 될 때까지 기다린다.
    async fn ready(&self);
    /// 페이지가 사용할 수 없는 상태가 되면 중단 사유를 반환한다.
    async fn halted(&self) -> String;
}

/// HostSignals를 공유하기 위한 Arc 타입 별칭이다.
pub type SharedSignals = Arc<dyn HostSignals>;

/// watch 채널 기반의 호스트 상태 중계기이다.
///
/// 페이지 로더는 `set_ready`/`halt`로 상태를 알리고 엔진은 [`HostSignals`]로 기다린다.
#[derive(Clone, Debug)]
pub struct HostMonitor {
    /// 내부 상태를 보관한다.
    inner: Arc<HostMonitorInner>,
}

/// HostMonitor 내부 구현체이다.
#[derive(Debug)]
struct HostMonitorInner {
    /// 페이지 안정 여부.
    ready: watch::Sender<bool>,
    /// 첫 중단 사유. `reset_error` 전까지 유지된다.
    halt: watch::Sender<Option<String>>,
}

impl HostMonitor {
    /// 준비되지 않은 상태로 생성한다.
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        let (halt, _) = watch::channel(None);
        Self {
            inner: Arc::new(HostMonitorInner { ready, halt }),
        }
    }

    /// 페이지 안정 여부를 갱신한다.
    pub fn set_ready(&self, ready: bool) {
        self.inner.ready.send_replace(ready);
    }

    /// 중단 사유를 기록한다. 이미 중단된 경우 처음 사유를 유지한다.
    pub fn halt(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.inner.halt.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            tracing::warn!(%reason, "호스트 페이지 중단");
            *current = Some(reason);
            true
        });
    }

    /// 새 실행을 위해 중단 상태를 지운다.
    pub fn reset_error(&self) {
        self.inner.halt.send_replace(None);
    }

    /// 현재 중단 사유를 조회한다.
    pub fn halt_reason(&self) -> Option<String> {
        self.inner.halt.borrow().clone()
    }
}

impl Default for HostMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostSignals for HostMonitor {
    async fn ready(&self) {
        let mut rx = self.inner.ready.subscribe();
        // 송신자는 self가 보유하므로 wait_for가 실패하지 않는다.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    async fn halted(&self) -> String {
        let mut rx = self.inner.halt.subscribe();
        let reason = match rx.wait_for(|reason| reason.is_some()).await {
            Ok(reason) => reason.clone(),
            Err(_) => None,
        };
        match reason {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }
}
