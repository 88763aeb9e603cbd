use super::{Step, StepEvents};
use crate::action::{Action, ActionKind, ElementRef};
use tracing::{error, warn};

use super::keycode::{KEY_ENTER, KEY_SPACE, KEY_TAB};

/// 압축 중 열려 있는 단계를 가리키는 슬롯이다. 값은 `steps` 내 위치이다.
#[derive(Debug, Default)]
struct CompactorState {
    steps: Vec<Step>,
    mouse: Option<usize>,
    key: Option<usize>,
    tab: Option<usize>,
}

/// 녹화 액션 목록을 표시/편집용 단계 목록으로 압축한다.
pub fn compact(actions: &[Action]) -> Vec<Step> {
    let mut state = CompactorState::default();
    for (position, action) in actions.iter().enumerate() {
        state.accept(position, action);
    }
    state.finish(actions.len())
}

impl CompactorState {
    fn accept(&mut self, position: usize, action: &Action) {
        if !action.is_composable() {
            self.mouse = None;
            self.key = None;
            self.steps
                .push(Step::SingleAction(StepEvents::with(position, action)));
            return;
        }
        if action.kind.is_key() && action.options.key_code == KEY_TAB {
            self.accept_tab(position, action);
        } else if action.kind.is_key() {
            self.accept_key(position, action);
        } else if action.kind.is_mouse() {
            self.accept_mouse(position, action);
        } else if action.kind.is_follow_up() {
            self.accept_follow_up(position, action);
        } else {
            warn!(position, kind = action.kind.name(), "단계에 속하지 않는 이벤트");
        }
    }

    fn accept_tab(&mut self, position: usize, action: &Action) {
        self.mouse = None;
        self.key = None;
        match action.kind {
            ActionKind::Keydown => {
                self.tab = Some(self.open(Step::Tab(StepEvents::with(position, action))));
            }
            ActionKind::Keyup => match self.tab {
                Some(slot) => self.steps[slot].push(position, action),
                None => warn!(position, "짝이 없는 Tab keyup 이벤트"),
            },
            _ => warn!(
                position,
                kind = action.kind.name(),
                "Tab 단계가 받을 수 없는 이벤트"
            ),
        }
    }

    fn accept_key(&mut self, position: usize, action: &Action) {
        self.mouse = None;
        self.tab = None;
        if let Some(slot) = self.key {
            if same_target(self.steps[slot].primary_element(), action.element.as_ref()) {
                self.steps[slot].push(position, action);
                return;
            }
        }
        self.key = Some(self.open(Step::Key(StepEvents::with(position, action))));
    }

    fn accept_mouse(&mut self, position: usize, action: &Action) {
        if let Some(slot) = self.keyboard_activated_click(action) {
            self.steps[slot].push(position, action);
            return;
        }
        self.key = None;
        self.tab = None;
        if action.kind != ActionKind::Mousedown {
            if let Some(slot) = self.mouse {
                if same_target(self.steps[slot].primary_element(), action.element.as_ref()) {
                    self.steps[slot].push(position, action);
                    return;
                }
            }
        }
        self.mouse = Some(self.open(Step::Mouse(StepEvents::with(position, action))));
    }

    /// Enter/Space 키로 submit 버튼이 눌려 브라우저가 만든 click이면 열린 키 단계를 반환한다.
    fn keyboard_activated_click(&self, action: &Action) -> Option<usize> {
        if action.kind != ActionKind::Click {
            return None;
        }
        let element = action.element.as_ref().filter(|e| e.is_submit_control())?;
        let slot = self.key?;
        let last_key = self.steps[slot]
            .events()
            .iter()
            .rev()
            .find(|e| e.kind.is_key())?;
        if !matches!(last_key.options.key_code, KEY_ENTER | KEY_SPACE) {
            return None;
        }
        let key_element = last_key.element.as_ref()?;
        key_element.shares_form_with(element).then_some(slot)
    }

    fn accept_follow_up(&mut self, position: usize, action: &Action) {
        let target = self
            .steps
            .iter()
            .rposition(|s| matches!(s, Step::Mouse(_) | Step::Key(_)));
        match target {
            Some(slot) => self.steps[slot].push(position, action),
            None => warn!(position, kind = action.kind.name(), "짝이 없는 후속 이벤트"),
        }
    }

    fn open(&mut self, step: Step) -> usize {
        self.steps.push(step);
        self.steps.len() - 1
    }

    fn finish(self, expected: usize) -> Vec<Step> {
        let added: usize = self.steps.iter().map(|s| s.events().len()).sum();
        if added != expected {
            error!(expected, added, "단계에 포함되지 않은 이벤트가 있습니다");
        }
        self.steps
    }
}

fn same_target(current: Option<&ElementRef>, incoming: Option<&ElementRef>) -> bool {
    matches!((current, incoming), (Some(a), Some(b)) if a == b)
}
