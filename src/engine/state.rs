use crate::action::ActionResult;
use crate::error::ReplayError;
use serde::Serialize;
use std::time::SystemTime;

/// 한 번의 재생 실행 상태이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayState {
    /// 엔진 생성 직후 또는 재실행 대기.
    Idle,
    /// 위치 `index`에서 시작하는 배치를 실행 중.
    Dispatching { index: usize },
    /// 모든 액션이 성공적으로 처리됨.
    Completed,
    /// 실패 또는 호스트 중단으로 종료됨.
    Aborted(ReplayError),
}

/// 시나리오 결과 상태이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// 아직 실행하지 않음.
    Pending,
    /// 실행 중.
    Running,
    /// 모든 액션 성공.
    Passed,
    /// 실패 또는 중단.
    Failed,
}

/// 시나리오 한 번 실행의 결과 누적기이다.
///
/// `action_results`는 원본 액션 목록과 위치가 맞춰진다. 드라이버가 결과를 빠뜨린
/// 위치는 `None`으로 남는다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioResult {
    /// 현재 상태.
    pub status: RunStatus,
    /// 시작 시각.
    pub started_at: Option<SystemTime>,
    /// 종료 시각.
    pub finished_at: Option<SystemTime>,
    /// 위치별 액션 결과.
    pub action_results: Vec<Option<ActionResult>>,
}

impl ScenarioResult {
    /// 초기 상태를 생성한다.
    pub fn new() -> Self {
        Self {
            status: RunStatus::Pending,
            started_at: None,
            finished_at: None,
            action_results: Vec::new(),
        }
    }

    /// 결과를 비우고 대기 상태로 되돌린다.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// 실행 시작을 기록한다.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(SystemTime::now());
        self.finished_at = None;
        self.action_results.clear();
    }

    /// 성공 종료를 기록한다.
    pub fn pass(&mut self) {
        self.status = RunStatus::Passed;
        self.finished_at = Some(SystemTime::now());
    }

    /// 실패 종료를 기록한다.
    pub fn fail(&mut self) {
        self.status = RunStatus::Failed;
        self.finished_at = Some(SystemTime::now());
    }

    /// 실패한 첫 액션 위치를 찾는다.
    pub fn first_failure(&self) -> Option<usize> {
        self.action_results
            .iter()
            .position(|r| matches!(r, Some(result) if !result.pass))
    }
}

impl Default for ScenarioResult {
    fn default() -> Self {
        Self::new()
    }
}
