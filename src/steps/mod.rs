use crate::action::{Action, ActionKind, DomLookup, ElementRef};

mod compact;
mod display;
pub mod keycode;

pub use compact::compact;

/// 단계에 속한 이벤트와 원본 액션 목록에서의 위치이다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepEvents {
    events: Vec<Action>,
    positions: Vec<usize>,
}

impl StepEvents {
    fn with(position: usize, action: &Action) -> Self {
        Self {
            events: vec![action.clone()],
            positions: vec![position],
        }
    }

    fn push(&mut self, position: usize, action: &Action) {
        self.events.push(action.clone());
        self.positions.push(position);
    }
}

/// 표시/편집 단위로 묶인 녹화 이벤트 묶음이다.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// 조합되지 않는 단일 명령.
    SingleAction(StepEvents),
    /// mousedown으로 시작하는 마우스 제스처.
    Mouse(StepEvents),
    /// 같은 요소에 대한 연속 키 입력.
    Key(StepEvents),
    /// Tab 키로 포커스를 옮긴 입력.
    Tab(StepEvents),
}

impl Step {
    fn body(&self) -> &StepEvents {
        match self {
            Step::SingleAction(body) | Step::Mouse(body) | Step::Key(body) | Step::Tab(body) => {
                body
            }
        }
    }

    fn body_mut(&mut self) -> &mut StepEvents {
        match self {
            Step::SingleAction(body) | Step::Mouse(body) | Step::Key(body) | Step::Tab(body) => {
                body
            }
        }
    }

    /// 단계 종류 이름을 반환한다.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Step::SingleAction(_) => "SingleActionStep",
            Step::Mouse(_) => "MouseStep",
            Step::Key(_) => "KeyStep",
            Step::Tab(_) => "TabStep",
        }
    }

    /// 단계에 속한 이벤트를 녹화 순서대로 반환한다.
    pub fn events(&self) -> &[Action] {
        &self.body().events
    }

    /// 각 이벤트의 원본 액션 목록 위치를 반환한다.
    pub fn positions(&self) -> &[usize] {
        &self.body().positions
    }

    /// 원본 위치 `index`의 액션이 이 단계에 속하는지 확인한다.
    pub fn has_action(&self, index: usize) -> bool {
        self.positions().contains(&index)
    }

    pub(crate) fn push(&mut self, position: usize, action: &Action) {
        self.body_mut().push(position, action);
    }

    fn first_keyup(&self) -> Option<&Action> {
        self.events()
            .iter()
            .find(|e| matches!(e.kind, ActionKind::Keyup))
    }

    /// 단계를 대표하는 요소. Tab 단계는 포커스가 이동한 keyup 요소를 우선한다.
    pub fn primary_element(&self) -> Option<&ElementRef> {
        if let Step::Tab(_) = self {
            if let Some(keyup) = self.first_keyup() {
                return keyup.element.as_ref();
            }
        }
        self.events().first().and_then(|e| e.element.as_ref())
    }

    /// 편집 가능한 단계인지 확인한다. 브라우저 명령만 편집할 수 없다.
    pub fn is_editable(&self) -> bool {
        match self {
            Step::SingleAction(body) => body
                .events
                .first()
                .map(|a| !a.kind.is_browser_command())
                .unwrap_or(true),
            _ => true,
        }
    }

    /// 단계가 소유한 요소 참조에 `rebind`를 적용한다.
    ///
    /// 마우스/키 단계의 submit 이벤트는 `rebind` 대신 직전 이벤트 요소의 form으로
    /// 교체된다. form은 `dom`에서 매번 새로 조회한다.
    pub fn rebind_element<F>(&mut self, dom: &dyn DomLookup, mut rebind: F)
    where
        F: FnMut(&mut ElementRef),
    {
        match self {
            Step::SingleAction(body) => {
                for element in body.events.iter_mut().filter_map(|e| e.element.as_mut()) {
                    rebind(element);
                }
            }
            Step::Mouse(body) | Step::Key(body) => {
                for i in 0..body.events.len() {
                    if body.events[i].kind != ActionKind::Submit {
                        if let Some(element) = body.events[i].element.as_mut() {
                            rebind(element);
                        }
                        continue;
                    }
                    let form = i
                        .checked_sub(1)
                        .and_then(|prev| body.events[prev].element.as_ref())
                        .and_then(|prev| dom.form_of(prev));
                    if let Some(form) = form {
                        body.events[i].element = Some(form);
                    }
                }
            }
            Step::Tab(body) => {
                let target = body
                    .events
                    .iter()
                    .position(|e| e.kind == ActionKind::Keyup)
                    .unwrap_or(0);
                if let Some(element) = body.events.get_mut(target).and_then(|e| e.element.as_mut())
                {
                    rebind(element);
                }
            }
        }
    }
}

/// 액션 목록을 압축한 단계 목록이다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepList {
    steps: Vec<Step>,
}

impl StepList {
    /// 액션 목록에서 단계 목록을 새로 만든다.
    pub fn from_actions(actions: &[Action]) -> Self {
        Self {
            steps: compact(actions),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Step> {
        self.steps.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// 원본 위치 `action_index`의 액션을 포함한 단계 번호를 찾는다.
    pub fn step_index_of(&self, action_index: usize) -> Option<usize> {
        self.steps.iter().position(|s| s.has_action(action_index))
    }

    /// `step_index` 단계의 액션을 뺀 액션 목록을 만든다.
    pub fn actions_without_step(&self, actions: &[Action], step_index: usize) -> Vec<Action> {
        let Some(step) = self.steps.get(step_index) else {
            return actions.to_vec();
        };
        actions
            .iter()
            .enumerate()
            .filter(|(i, _)| !step.has_action(*i))
            .map(|(_, a)| a.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 테스트용 form 조회기. 모든 요소가 `#login` form에 속한다.
    struct LoginForm;

    impl DomLookup for LoginForm {
        fn form_of(&self, _element: &ElementRef) -> Option<ElementRef> {
            Some(ElementRef::css("#login").with_tag("form"))
        }
    }

    struct NoForm;

    impl DomLookup for NoForm {
        fn form_of(&self, _element: &ElementRef) -> Option<ElementRef> {
            None
        }
    }

    fn field() -> ElementRef {
        ElementRef::css("#user").with_tag("input")
    }

    #[test]
    fn rebind_rewrites_submit_to_live_form() {
        let actions = vec![
            Action::new(ActionKind::Mousedown, Some(field())),
            Action::new(ActionKind::Click, Some(field())),
            Action::new(ActionKind::Submit, Some(ElementRef::css("#old-form"))),
        ];
        let mut steps = compact(&actions);
        assert_eq!(steps.len(), 1);
        steps[0].rebind_element(&LoginForm, |e| e.css_selector = Some("#name".into()));

        let events = steps[0].events();
        assert_eq!(events[0].element, Some(ElementRef::css("#name")));
        assert_eq!(events[1].element, Some(ElementRef::css("#name")));
        assert_eq!(events[2].element, Some(ElementRef::css("#login")));
    }

    #[test]
    fn rebind_keeps_submit_when_form_is_gone() {
        let actions = vec![
            Action::new(ActionKind::Click, Some(field())),
            Action::new(ActionKind::Submit, Some(ElementRef::css("#old-form"))),
        ];
        let mut steps = compact(&actions);
        steps[0].rebind_element(&NoForm, |e| e.css_selector = Some("#name".into()));
        assert_eq!(steps[0].events()[1].element, Some(ElementRef::css("#old-form")));
    }

    #[test]
    fn tab_step_prefers_keyup_element() {
        let from = ElementRef::css("#a");
        let to = ElementRef::css("#b");
        let actions = vec![
            Action::key(ActionKind::Keydown, from.clone(), 9),
            Action::key(ActionKind::Keyup, to.clone(), 9),
        ];
        let mut steps = compact(&actions);
        assert_eq!(steps[0].primary_element(), Some(&to));

        let mut touched = Vec::new();
        steps[0].rebind_element(&NoForm, |e| touched.push(e.clone()));
        assert_eq!(touched, vec![to]);
    }

    #[test]
    fn browser_commands_are_not_editable() {
        let actions = vec![
            Action::command(ActionKind::Back),
            Action::command(ActionKind::Wait { millis: 100 }),
        ];
        let steps = compact(&actions);
        assert!(!steps[0].is_editable());
        assert!(steps[1].is_editable());
    }

    #[test]
    fn step_list_maps_actions_to_steps_and_removes() {
        let actions = vec![
            Action::new(ActionKind::Mousedown, Some(field())),
            Action::command(ActionKind::Reload),
            Action::new(ActionKind::Input, Some(field())),
        ];
        let list = StepList::from_actions(&actions);
        assert_eq!(list.len(), 2);
        assert_eq!(list.step_index_of(2), Some(0));
        assert_eq!(list.step_index_of(1), Some(1));

        let remaining = list.actions_without_step(&actions, 0);
        assert_eq!(remaining, vec![Action::command(ActionKind::Reload)]);
    }
}
