/// 재생 엔진에서 소비자로 전달되는 진행 이벤트이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEvent {
    /// 재생 시작 알림.
    RunStarted { total: usize },
    /// 위치 `index`부터 배치 구성을 시작한다.
    ActionStarted { index: usize },
    /// 브라우저가 이미 발생시킨 이벤트라 실행하지 않았다.
    ActionSkipped { index: usize },
    /// `index`부터 `len`개 위치를 한 번에 실행했다.
    BatchDispatched { index: usize, len: usize },
    /// 재생 종료. 실패 시 오류 메시지를 포함한다.
    RunFinished { error: Option<String> },
}
