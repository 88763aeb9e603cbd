use super::context::SharedExecutionContext;
use super::events::ReplayEvent;
use super::policy::{BatchPlan, plan_batch};
use super::signals::SharedSignals;
use super::state::ReplayState;
use crate::action::{Action, ActionResult};
use crate::error::ReplayError;
use crate::executor::SharedExecutor;
use crate::scenario::ReplayConfig;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// 녹화된 액션을 순서대로 재생하는 엔진이다.
///
/// 배치는 항상 하나씩만 실행되며, 배치 실행과 배치 사이의 준비 대기는 모두 호스트
/// 중단 신호와 경쟁한다. 중단 신호가 먼저 오면 진행 중인 배치 결과는 버려진다.
pub struct ReplayEngine {
    /// 액션을 실제로 발생시키는 드라이버.
    driver: SharedExecutor,
    /// 호스트 준비/중단 신호.
    signals: SharedSignals,
    /// 단독 액션에 주입되는 데이터 해석 컨텍스트.
    ctx: SharedExecutionContext,
    /// 진행 이벤트 송신 채널.
    sender: Option<UnboundedSender<ReplayEvent>>,
    /// 재생 설정.
    config: ReplayConfig,
    /// 현재 실행 상태.
    state: ReplayState,
}

impl ReplayEngine {
    /// 대기 상태의 엔진을 생성한다.
    pub fn new(
        driver: SharedExecutor,
        signals: SharedSignals,
        ctx: SharedExecutionContext,
        config: ReplayConfig,
    ) -> Self {
        Self {
            driver,
            signals,
            ctx,
            sender: None,
            config,
            state: ReplayState::Idle,
        }
    }

    /// 진행 이벤트를 받을 채널을 연결한다.
    pub fn with_events(mut self, sender: UnboundedSender<ReplayEvent>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// 현재 실행 상태를 반환한다.
    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    /// 액션 목록 전체를 처음부터 재생한다.
    ///
    /// # 매개변수
    /// - `actions`: 녹화 순서의 액션 목록.
    /// - `results`: 위치별 결과가 누적될 목록. 원본 위치와 맞춰 추가된다.
    ///
    /// # 반환값
    /// 모든 액션이 처리되면 `Ok(())`, 첫 실패 또는 호스트 중단 시 해당 오류.
    pub async fn run(
        &mut self,
        actions: &[Action],
        results: &mut Vec<Option<ActionResult>>,
    ) -> Result<(), ReplayError> {
        self.state = ReplayState::Idle;
        info!(total = actions.len(), "재생 시작");
        self.emit(ReplayEvent::RunStarted {
            total: actions.len(),
        });

        let mut index = 0;
        while index < actions.len() {
            self.state = ReplayState::Dispatching { index };
            self.emit(ReplayEvent::ActionStarted { index });
            let plan = plan_batch(actions, index);
            let (slots, failure) = match self.execute(actions, &plan).await {
                Ok(outcome) => outcome,
                Err(err) => return self.abort(err),
            };
            results.extend(slots);
            if let Some(message) = failure {
                return self.abort(ReplayError::ActionFailed(message));
            }
            index += plan.len();
            if let Err(err) = self.wait_ready().await {
                return self.abort(err);
            }
        }

        sleep(Duration::from_millis(self.config.wait_before_complete_ms)).await;
        if let Err(err) = self.wait_ready().await {
            return self.abort(err);
        }
        self.state = ReplayState::Completed;
        info!("재생 완료");
        self.emit(ReplayEvent::RunFinished { error: None });
        Ok(())
    }

    /// 배치 하나를 실행하고 위치별 결과와 첫 실패 메시지를 반환한다.
    async fn execute(
        &self,
        actions: &[Action],
        plan: &BatchPlan,
    ) -> Result<(Vec<Option<ActionResult>>, Option<String>), ReplayError> {
        match plan {
            BatchPlan::Single { index } => {
                let action = &actions[*index];
                debug!(index, action = %action.display(), "단독 액션 실행");
                let dispatch = self.driver.dispatch_single(action, self.ctx.clone());
                let result = self.race(dispatch).await?;
                let failure = failure_message(std::slice::from_ref(&result));
                Ok((vec![Some(result)], failure))
            }
            BatchPlan::Composite {
                index,
                len,
                dispatch,
                skipped,
            } => {
                let mut slots: Vec<Option<ActionResult>> = vec![None; *len];
                for &position in skipped {
                    slots[position - index] = Some(ActionResult::pass());
                    self.emit(ReplayEvent::ActionSkipped { index: position });
                }
                if dispatch.is_empty() {
                    return Ok((slots, None));
                }
                let batch: Vec<Action> = dispatch.iter().map(|&i| actions[i].clone()).collect();
                debug!(index, len, dispatched = batch.len(), "배치 실행");
                self.emit(ReplayEvent::BatchDispatched {
                    index: *index,
                    len: *len,
                });
                let returned = self.race(self.driver.dispatch_batch(&batch)).await?;
                if returned.len() != batch.len() {
                    warn!(
                        index,
                        expected = batch.len(),
                        returned = returned.len(),
                        "드라이버 결과 수가 실행한 액션 수와 다릅니다"
                    );
                }
                let failure = failure_message(&returned);
                Ok((fill_slots(*index, slots, returned), failure))
            }
        }
    }

    /// 실행 중인 작업과 호스트 중단 신호를 경쟁시킨다. 이미 중단되었으면 중단이 우선한다.
    async fn race<T, F>(&self, dispatch: F) -> Result<T, ReplayError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        tokio::select! {
            biased;
            reason = self.signals.halted() => Err(ReplayError::HostHalted(reason)),
            outcome = dispatch => outcome.map_err(|err| ReplayError::Driver(format!("{err:#}"))),
        }
    }

    /// 다음 배치 전에 페이지가 안정될 때까지 기다린다.
    async fn wait_ready(&self) -> Result<(), ReplayError> {
        tokio::select! {
            biased;
            reason = self.signals.halted() => Err(ReplayError::HostHalted(reason)),
            _ = self.signals.ready() => Ok(()),
        }
    }

    fn abort(&mut self, err: ReplayError) -> Result<(), ReplayError> {
        warn!(error = %err, "재생 중단");
        self.state = ReplayState::Aborted(err.clone());
        self.emit(ReplayEvent::RunFinished {
            error: Some(err.payload()),
        });
        Err(err)
    }

    fn emit(&self, event: ReplayEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

/// 첫 실패 결과의 메시지를 반환한다.
fn failure_message(results: &[ActionResult]) -> Option<String> {
    results.iter().find(|r| !r.pass).map(|r| {
        r.error
            .clone()
            .unwrap_or_else(|| "액션 실행 실패".to_string())
    })
}

/// 드라이버 결과를 건너뛴 위치를 제외한 빈 위치에 순서대로 채운다.
fn fill_slots(
    index: usize,
    mut slots: Vec<Option<ActionResult>>,
    returned: Vec<ActionResult>,
) -> Vec<Option<ActionResult>> {
    let mut open = slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_none())
        .map(|(i, _)| i)
        .collect::<Vec<_>>()
        .into_iter();
    for result in returned {
        match open.next() {
            Some(slot) => slots[slot] = Some(result),
            None => warn!(index, ?result, "배치 범위를 넘는 결과를 버립니다"),
        }
    }
    for missing in open {
        warn!(position = index + missing, "결과가 비어 있는 위치가 있습니다");
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, ElementRef};
    use crate::engine::context::{ExecutionContext, shared};
    use crate::engine::signals::HostMonitor;
    use crate::executor::PageDriver;
    use crate::scenario::{DataOrigin, DataSet, NamedData};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// 실행 요청을 기록하고 미리 정한 결과를 돌려주는 목업 드라이버이다.
    #[derive(Default)]
    struct RecordingDriver {
        /// 배치별로 받은 액션 종류 목록이다.
        batches: Mutex<Vec<Vec<&'static str>>>,
        /// 배치 결과 대기열. 비어 있으면 모두 성공으로 응답한다.
        scripted: Mutex<VecDeque<Vec<ActionResult>>>,
        /// 첫 배치를 끝낸 뒤 중단시킬 모니터이다.
        halt_after_first: Option<HostMonitor>,
        /// 단독 액션에서 해석한 데이터 값이다.
        resolved: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageDriver for RecordingDriver {
        async fn dispatch_batch(&self, actions: &[Action]) -> anyhow::Result<Vec<ActionResult>> {
            let mut batches = self.batches.lock().await;
            batches.push(actions.iter().map(|a| a.kind.name()).collect());
            if let Some(monitor) = &self.halt_after_first {
                monitor.halt("page crashed");
            }
            match self.scripted.lock().await.pop_front() {
                Some(results) => Ok(results),
                None => Ok(actions.iter().map(|_| ActionResult::pass()).collect()),
            }
        }

        async fn dispatch_single(
            &self,
            action: &Action,
            ctx: SharedExecutionContext,
        ) -> anyhow::Result<ActionResult> {
            self.batches.lock().await.push(vec![action.kind.name()]);
            if let ActionKind::InsertData { origin, name } = &action.kind {
                let value = ctx.write().await.resolve(*origin, name);
                return Ok(match value {
                    Ok(value) => {
                        self.resolved.lock().await.push(value);
                        ActionResult::pass()
                    }
                    Err(err) => ActionResult::fail(err.to_string()),
                });
            }
            Ok(ActionResult::pass())
        }
    }

    fn on(kind: ActionKind, selector: &str) -> Action {
        Action::new(kind, Some(ElementRef::css(selector)))
    }

    fn ready_monitor() -> HostMonitor {
        let monitor = HostMonitor::new();
        monitor.set_ready(true);
        monitor
    }

    fn engine(driver: Arc<RecordingDriver>, monitor: HostMonitor) -> ReplayEngine {
        let config = ReplayConfig {
            wait_before_complete_ms: 0,
            ..ReplayConfig::default()
        };
        ReplayEngine::new(
            driver,
            Arc::new(monitor),
            shared(ExecutionContext::default()),
            config,
        )
    }

    #[tokio::test]
    async fn text_input_cascade_skips_input_and_keeps_positions() {
        let driver = Arc::new(RecordingDriver::default());
        let mut engine = engine(driver.clone(), ready_monitor());
        let actions = vec![on(ActionKind::TextInput, "#q"), on(ActionKind::Input, "#q")];
        let mut results = Vec::new();

        engine.run(&actions, &mut results).await.expect("재생 실패");

        assert_eq!(*driver.batches.lock().await, vec![vec!["textInput"]]);
        assert_eq!(
            results,
            vec![Some(ActionResult::pass()), Some(ActionResult::pass())]
        );
        assert_eq!(engine.state(), &ReplayState::Completed);
    }

    #[tokio::test]
    async fn gesture_is_one_batch_and_single_actions_go_alone() {
        let driver = Arc::new(RecordingDriver::default());
        let mut engine = engine(driver.clone(), ready_monitor());
        let actions = vec![
            on(ActionKind::Mousedown, "#a"),
            on(ActionKind::Mouseup, "#a"),
            on(ActionKind::Click, "#a"),
            Action::command(ActionKind::Back),
            on(ActionKind::Keydown, "#q"),
            on(ActionKind::Keyup, "#q"),
        ];
        let mut results = Vec::new();
        engine.run(&actions, &mut results).await.expect("재생 실패");

        assert_eq!(
            *driver.batches.lock().await,
            vec![
                vec!["mousedown", "mouseup", "click"],
                vec!["back"],
                vec!["keydown", "keyup"],
            ]
        );
        assert_eq!(results.len(), actions.len());
    }

    #[tokio::test]
    async fn failing_result_stops_replay_after_recording_batch() {
        let driver = Arc::new(RecordingDriver {
            scripted: Mutex::new(VecDeque::from(vec![vec![
                ActionResult::pass(),
                ActionResult::fail("element not found"),
            ]])),
            ..RecordingDriver::default()
        });
        let mut engine = engine(driver.clone(), ready_monitor());
        let actions = vec![
            on(ActionKind::Mousedown, "#a"),
            on(ActionKind::Mouseup, "#a"),
            on(ActionKind::Mousedown, "#b"),
        ];
        let mut results = Vec::new();
        let err = engine
            .run(&actions, &mut results)
            .await
            .expect_err("실패 결과로 중단되어야 한다");

        assert_eq!(err, ReplayError::ActionFailed("element not found".into()));
        assert_eq!(driver.batches.lock().await.len(), 1);
        assert_eq!(results.len(), 2);
        assert!(matches!(engine.state(), ReplayState::Aborted(_)));
    }

    #[tokio::test]
    async fn halt_after_first_batch_prevents_second_dispatch() {
        let monitor = ready_monitor();
        let driver = Arc::new(RecordingDriver {
            halt_after_first: Some(monitor.clone()),
            ..RecordingDriver::default()
        });
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut engine = engine(driver.clone(), monitor).with_events(tx);
        let actions = vec![on(ActionKind::Click, "#a"), on(ActionKind::Click, "#b")];
        let mut results = Vec::new();

        let err = engine
            .run(&actions, &mut results)
            .await
            .expect_err("호스트 중단으로 종료되어야 한다");

        assert_eq!(err, ReplayError::HostHalted("page crashed".into()));
        assert_eq!(driver.batches.lock().await.len(), 1);
        assert_eq!(results.len(), 1);

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert_eq!(
            last,
            Some(ReplayEvent::RunFinished {
                error: Some("page crashed".into())
            })
        );
    }

    #[tokio::test]
    async fn halt_before_dispatch_wins_race() {
        let monitor = ready_monitor();
        monitor.halt("navigation failed");
        let driver = Arc::new(RecordingDriver::default());
        let mut engine = engine(driver.clone(), monitor);
        let mut results = Vec::new();

        let err = engine
            .run(&[on(ActionKind::Click, "#a")], &mut results)
            .await
            .expect_err("이미 중단된 호스트에서는 실패해야 한다");

        assert_eq!(err, ReplayError::HostHalted("navigation failed".into()));
        assert!(driver.batches.lock().await.is_empty());
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn missing_results_leave_empty_slots_without_abort() {
        let driver = Arc::new(RecordingDriver {
            scripted: Mutex::new(VecDeque::from(vec![vec![ActionResult::pass()]])),
            ..RecordingDriver::default()
        });
        let mut engine = engine(driver.clone(), ready_monitor());
        let actions = vec![on(ActionKind::Mousedown, "#a"), on(ActionKind::Mouseup, "#a")];
        let mut results = Vec::new();

        engine.run(&actions, &mut results).await.expect("재생 실패");
        assert_eq!(results, vec![Some(ActionResult::pass()), None]);
    }

    #[tokio::test]
    async fn extra_results_are_dropped_but_checked_for_failure() {
        let driver = Arc::new(RecordingDriver {
            scripted: Mutex::new(VecDeque::from(vec![
                vec![ActionResult::pass(), ActionResult::pass()],
                vec![ActionResult::pass(), ActionResult::fail("stale element")],
            ])),
            ..RecordingDriver::default()
        });
        let mut engine = engine(driver.clone(), ready_monitor());
        let actions = vec![on(ActionKind::Click, "#a")];

        let mut results = Vec::new();
        engine.run(&actions, &mut results).await.expect("재생 실패");
        assert_eq!(results, vec![Some(ActionResult::pass())]);

        let mut results = Vec::new();
        let err = engine
            .run(&actions, &mut results)
            .await
            .expect_err("초과 결과의 실패로 중단되어야 한다");
        assert_eq!(err, ReplayError::ActionFailed("stale element".into()));
        assert_eq!(results, vec![Some(ActionResult::pass())]);
    }

    #[tokio::test]
    async fn single_action_resolves_data_through_context() {
        let driver = Arc::new(RecordingDriver::default());
        let scenario: DataSet = [NamedData::literal("user", "alice")].into_iter().collect();
        let ctx = shared(ExecutionContext::new(
            None,
            scenario,
            &ReplayConfig::default(),
        ));
        let mut engine = ReplayEngine::new(
            driver.clone(),
            Arc::new(ready_monitor()),
            ctx,
            ReplayConfig {
                wait_before_complete_ms: 0,
                ..ReplayConfig::default()
            },
        );
        let actions = vec![Action::new(
            ActionKind::InsertData {
                origin: DataOrigin::Scenario,
                name: "user".into(),
            },
            Some(ElementRef::css("#user")),
        )];
        let mut results = Vec::new();
        engine.run(&actions, &mut results).await.expect("재생 실패");
        assert_eq!(*driver.resolved.lock().await, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn rerun_starts_from_first_action() {
        let driver = Arc::new(RecordingDriver::default());
        let mut engine = engine(driver.clone(), ready_monitor());
        let actions = vec![on(ActionKind::Click, "#a")];
        let mut first = Vec::new();
        engine.run(&actions, &mut first).await.expect("재생 실패");
        let mut second = Vec::new();
        engine.run(&actions, &mut second).await.expect("재생 실패");
        assert_eq!(driver.batches.lock().await.len(), 2);
        assert_eq!(first, second);
    }
}
