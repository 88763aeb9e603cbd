use crate::action::{Action, ActionResult, DomLookup, ElementRef};
use crate::engine::{
    ExecutionContext, HostMonitor, HostSignals, ReplayEngine, ReplayEvent, ScenarioResult,
    SharedExecutionContext, shared,
};
use crate::error::ReplayError;
use crate::executor::SharedExecutor;
use crate::scenario::{DataSet, Scenario};
use crate::steps::StepList;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

/// 편집 중인 시나리오와 재생 상태를 관리하는 컨트롤러이다.
///
/// 마지막으로 저장된 시나리오와 작업 사본을 함께 보관하며, 액션 목록이 바뀔 때마다
/// 단계 목록을 다시 압축한다.
pub struct ScenarioSession {
    /// 마지막으로 저장된 시나리오.
    saved: Scenario,
    /// 편집 중인 작업 사본.
    working: Scenario,
    /// 작업 사본 액션의 단계 목록.
    steps: StepList,
    /// 데이터 셋과 해석기.
    ctx: SharedExecutionContext,
    /// 액션 실행 드라이버.
    driver: SharedExecutor,
    /// 호스트 페이지 상태.
    monitor: HostMonitor,
    /// 현재 실행 결과.
    result: ScenarioResult,
    /// 재생 진행 이벤트 송신 채널.
    events: Option<UnboundedSender<ReplayEvent>>,
    /// 마지막으로 실행한 단계 번호.
    performing: Option<usize>,
    /// 실행 중 실패한 단계의 오류 메시지.
    step_error: Option<String>,
    /// 마지막 저장 이후 변경 여부.
    changed: bool,
}

impl ScenarioSession {
    /// 저장된 시나리오로 세션을 연다.
    pub fn new(scenario: Scenario, driver: SharedExecutor, monitor: HostMonitor) -> Self {
        let ctx = ExecutionContext::new(
            scenario.project_data.clone(),
            scenario.data.clone(),
            &scenario.replay,
        );
        let steps = StepList::from_actions(&scenario.actions);
        Self {
            working: scenario.clone(),
            saved: scenario,
            steps,
            ctx: shared(ctx),
            driver,
            monitor,
            result: ScenarioResult::new(),
            events: None,
            performing: None,
            step_error: None,
            changed: false,
        }
    }

    /// 재생 진행 이벤트를 받을 채널을 연결한다.
    pub fn with_events(mut self, sender: UnboundedSender<ReplayEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// 상태를 초기화하고 페이지가 준비되면 처음부터 다시 재생한다.
    ///
    /// 준비 전에 호스트가 중단되면 액션 없이 실패로 기록한다.
    pub async fn reset(&mut self) -> Result<(), ReplayError> {
        self.monitor.reset_error();
        self.ctx.write().await.clear_resolutions();
        self.result.reset();
        self.performing = None;
        self.step_error = None;
        self.recompute_steps();

        let halted = tokio::select! {
            biased;
            reason = self.monitor.halted() => Some(reason),
            _ = self.monitor.ready() => None,
        };
        if let Some(reason) = halted {
            error!(%reason, "페이지 준비 전에 중단되었습니다");
            self.result.start();
            self.result.fail();
            self.step_error = Some(reason.clone());
            return Err(ReplayError::HostHalted(reason));
        }
        self.rerun().await
    }

    /// 현재 액션 목록 전체를 재생하고 결과를 기록한다.
    pub async fn rerun(&mut self) -> Result<(), ReplayError> {
        self.result.start();
        let mut engine = ReplayEngine::new(
            self.driver.clone(),
            Arc::new(self.monitor.clone()),
            self.ctx.clone(),
            self.working.replay.clone(),
        );
        if let Some(sender) = &self.events {
            engine = engine.with_events(sender.clone());
        }

        let mut results = Vec::new();
        let outcome = engine.run(&self.working.actions, &mut results).await;
        let position = match &outcome {
            Ok(()) => results.len().checked_sub(1),
            Err(ReplayError::ActionFailed(_)) => results.len().checked_sub(1),
            Err(_) => Some(results.len()),
        };
        self.performing = position.and_then(|p| self.steps.step_index_of(p));
        self.result.action_results = results;

        match &outcome {
            Ok(()) => {
                info!(name = %self.working.name, "시나리오 재생 성공");
                self.step_error = None;
                self.result.pass();
            }
            Err(err) => {
                warn!(step = ?self.performing, error = %err, "시나리오 재생 실패");
                self.step_error = Some(err.payload());
                self.result.fail();
            }
        }
        outcome
    }

    /// 액션을 끝에 추가한다. `perform`이면 즉시 실행하고 결과를 반환한다.
    pub async fn add_action(
        &mut self,
        action: Action,
        perform: bool,
    ) -> Result<Option<ActionResult>, ReplayError> {
        self.working.actions.push(action.clone());
        self.changed = true;
        self.recompute_steps();
        if !perform {
            return Ok(None);
        }

        let outcome = if action.is_composable() {
            self.driver
                .dispatch_batch(std::slice::from_ref(&action))
                .await
                .map(|results| results.into_iter().next())
        } else {
            self.driver
                .dispatch_single(&action, self.ctx.clone())
                .await
                .map(Some)
        };
        outcome.map_err(|err| ReplayError::Driver(format!("{err:#}")))
    }

    /// 위치 `index`의 액션을 `update`로 교체한다.
    pub fn update_action<F>(&mut self, index: usize, update: F) -> bool
    where
        F: FnOnce(Action) -> Action,
    {
        if index >= self.working.actions.len() {
            error!(index, "존재하지 않는 액션 수정 요청");
            return false;
        }
        let action = self.working.actions[index].clone();
        self.working.actions[index] = update(action);
        self.changed = true;
        self.recompute_steps();
        true
    }

    /// 단계와 그 단계의 모든 액션을 제거한다.
    pub fn remove_step(&mut self, step_index: usize) -> bool {
        if step_index >= self.steps.len() {
            warn!(step_index, "존재하지 않는 단계 제거 요청");
            return false;
        }
        self.working.actions = self
            .steps
            .actions_without_step(&self.working.actions, step_index);
        self.changed = true;
        self.recompute_steps();
        true
    }

    /// 모든 액션을 지운다.
    pub fn clear_all_steps(&mut self) {
        self.working.actions.clear();
        self.changed = true;
        self.recompute_steps();
    }

    /// 외부에서 단계가 수정되었음을 알리고 단계 목록을 다시 만든다.
    pub fn step_updated(&mut self) {
        self.changed = true;
        self.recompute_steps();
    }

    /// 단계의 요소 참조를 다시 지정하고 그 결과를 액션 목록에 반영한다.
    pub fn rebind_step<F>(&mut self, step_index: usize, dom: &dyn DomLookup, rebind: F) -> bool
    where
        F: FnMut(&mut ElementRef),
    {
        let Some(step) = self.steps.get_mut(step_index) else {
            warn!(step_index, "존재하지 않는 단계 요소 변경 요청");
            return false;
        };
        step.rebind_element(dom, rebind);
        for (event, &position) in step.events().iter().zip(step.positions()) {
            if let Some(action) = self.working.actions.get_mut(position) {
                *action = event.clone();
            }
        }
        self.step_updated();
        true
    }

    /// 작업 사본을 마지막 저장본으로 되돌린다.
    pub async fn revert_to_last_saved(&mut self) {
        self.working = self.saved.clone();
        self.changed = false;
        self.sync_context().await;
        self.recompute_steps();
    }

    /// 작업 사본을 저장본으로 확정한다.
    pub fn mark_saved(&mut self) {
        self.saved = self.working.clone();
        self.changed = false;
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.changed
    }

    /// 프로젝트 데이터 셋과 시나리오 데이터 셋을 반환한다.
    pub fn data_sets(&self) -> (Option<&DataSet>, &DataSet) {
        (self.working.project_data.as_ref(), &self.working.data)
    }

    /// 시나리오 데이터 셋을 교체한다.
    pub async fn update_scenario_data_set(&mut self, set: DataSet) {
        self.working.data = set;
        self.changed = true;
        self.sync_context().await;
    }

    /// 프로젝트 데이터 셋을 교체한다. 프로젝트 쪽 변경이라 저장 대상이 아니다.
    pub async fn update_project_data_set(&mut self, set: Option<DataSet>) {
        self.working.project_data = set.clone();
        self.saved.project_data = set;
        self.sync_context().await;
    }

    /// 실행용으로 작업 사본을 복제한다.
    pub fn create_run_scenario(&self) -> Scenario {
        self.working.clone()
    }

    pub fn scenario(&self) -> &Scenario {
        &self.working
    }

    pub fn steps(&self) -> &StepList {
        &self.steps
    }

    pub fn result(&self) -> &ScenarioResult {
        &self.result
    }

    /// 마지막으로 실행한 단계 번호.
    pub fn performing_step(&self) -> Option<usize> {
        self.performing
    }

    /// 실패한 단계의 오류 메시지.
    pub fn step_error(&self) -> Option<&str> {
        self.step_error.as_deref()
    }

    fn recompute_steps(&mut self) {
        self.steps = StepList::from_actions(&self.working.actions);
    }

    async fn sync_context(&self) {
        let mut ctx = self.ctx.write().await;
        ctx.set_scenario_data(self.working.data.clone());
        ctx.set_project_data(self.working.project_data.clone());
    }
}
