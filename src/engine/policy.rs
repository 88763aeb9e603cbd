use crate::action::{Action, ActionKind};

/// 직전 액션이 브라우저에서 이미 발생시킨 액션이면 다시 실행하지 않는다.
///
/// - textInput을 발생시키면 같은 요소에 input이 따라 발생한다.
/// - submit 버튼 click은 그 form의 submit을 발생시킨다.
pub fn should_skip(current: &Action, previous: &Action) -> bool {
    match current.kind {
        ActionKind::Input => {
            previous.kind == ActionKind::TextInput && current.same_element(previous)
        }
        ActionKind::Submit => {
            if previous.kind != ActionKind::Click {
                return false;
            }
            let Some(control) = previous.element.as_ref() else {
                return false;
            };
            if control.input_type.as_deref() != Some("submit") {
                return false;
            }
            match (control.form.as_deref(), current.element.as_ref()) {
                (Some(form), Some(target)) => form == target,
                _ => false,
            }
        }
        _ => false,
    }
}

/// `candidate`를 `anchor`와 같은 배치로 실행할지 판단한다.
///
/// 같은 요소의 mouseup/click은 제스처를 완성하고, keyup은 항상 열린 키 입력을 닫는다.
pub fn should_bundle(anchor: &Action, candidate: &Action) -> bool {
    match candidate.kind {
        ActionKind::Mouseup | ActionKind::Click => candidate.same_element(anchor),
        ActionKind::Keyup => true,
        _ => false,
    }
}

/// 한 번의 실행 단위이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchPlan {
    /// 단독 액션 하나.
    Single { index: usize },
    /// 조합 가능한 액션 묶음.
    Composite {
        /// 배치 시작 위치.
        index: usize,
        /// 배치가 차지하는 위치 수.
        len: usize,
        /// 드라이버에 보낼 절대 위치.
        dispatch: Vec<usize>,
        /// 실행하지 않고 성공 처리할 절대 위치.
        skipped: Vec<usize>,
    },
}

impl BatchPlan {
    /// 배치가 차지하는 위치 수.
    pub fn len(&self) -> usize {
        match self {
            BatchPlan::Single { .. } => 1,
            BatchPlan::Composite { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 위치 `index`에서 시작하는 배치를 구성한다.
///
/// 조합 가능한 액션은 건너뛸 수도 묶을 수도 없는 첫 액션을 만날 때까지 이어서 묶는다.
pub fn plan_batch(actions: &[Action], index: usize) -> BatchPlan {
    let anchor = &actions[index];
    if !anchor.is_composable() {
        return BatchPlan::Single { index };
    }
    let mut dispatch = Vec::new();
    let mut skipped = Vec::new();
    if index > 0 && should_skip(anchor, &actions[index - 1]) {
        skipped.push(index);
    } else {
        dispatch.push(index);
    }
    let mut next = index + 1;
    while next < actions.len() {
        let candidate = &actions[next];
        if should_skip(candidate, &actions[next - 1]) {
            skipped.push(next);
        } else if should_bundle(anchor, candidate) {
            dispatch.push(next);
        } else {
            break;
        }
        next += 1;
    }
    BatchPlan::Composite {
        index,
        len: next - index,
        dispatch,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ElementRef;

    fn on(kind: ActionKind, selector: &str) -> Action {
        Action::new(kind, Some(ElementRef::css(selector)))
    }

    #[test]
    fn input_after_text_input_on_same_element_is_skipped() {
        let text = on(ActionKind::TextInput, "#q");
        assert!(should_skip(&on(ActionKind::Input, "#q"), &text));
        assert!(!should_skip(&on(ActionKind::Input, "#other"), &text));
        assert!(!should_skip(&on(ActionKind::Input, "#q"), &on(ActionKind::Keyup, "#q")));
    }

    #[test]
    fn submit_after_submit_click_of_same_form_is_skipped() {
        let form = ElementRef::css("#login");
        let button = ElementRef::css("#go")
            .with_tag("input")
            .with_type("submit")
            .with_form(form.clone());
        let click = Action::new(ActionKind::Click, Some(button));
        assert!(should_skip(
            &Action::new(ActionKind::Submit, Some(form)),
            &click
        ));
        assert!(!should_skip(&on(ActionKind::Submit, "#search"), &click));

        let plain = Action::new(
            ActionKind::Click,
            Some(ElementRef::css("#x").with_form(ElementRef::css("#login"))),
        );
        assert!(!should_skip(&on(ActionKind::Submit, "#login"), &plain));
    }

    #[test]
    fn bundles_gesture_and_keyups() {
        let down = on(ActionKind::Mousedown, "#a");
        assert!(should_bundle(&down, &on(ActionKind::Mouseup, "#a")));
        assert!(should_bundle(&down, &on(ActionKind::Click, "#a")));
        assert!(!should_bundle(&down, &on(ActionKind::Click, "#b")));
        assert!(should_bundle(&down, &on(ActionKind::Keyup, "#b")));
        assert!(!should_bundle(&down, &on(ActionKind::Mousedown, "#a")));
    }

    #[test]
    fn plans_mouse_gesture_as_one_batch() {
        let actions = vec![
            on(ActionKind::Mousedown, "#a"),
            on(ActionKind::Mouseup, "#a"),
            on(ActionKind::Click, "#a"),
            on(ActionKind::Mousedown, "#b"),
        ];
        assert_eq!(
            plan_batch(&actions, 0),
            BatchPlan::Composite {
                index: 0,
                len: 3,
                dispatch: vec![0, 1, 2],
                skipped: vec![],
            }
        );
        assert_eq!(plan_batch(&actions, 3).len(), 1);
    }

    #[test]
    fn plans_skipped_action_inside_batch() {
        let actions = vec![
            on(ActionKind::TextInput, "#q"),
            on(ActionKind::Input, "#q"),
            on(ActionKind::Keyup, "#q"),
            on(ActionKind::Change, "#q"),
        ];
        assert_eq!(
            plan_batch(&actions, 0),
            BatchPlan::Composite {
                index: 0,
                len: 3,
                dispatch: vec![0, 2],
                skipped: vec![1],
            }
        );
    }

    #[test]
    fn non_composable_is_single() {
        let actions = vec![
            on(ActionKind::Click, "#a"),
            Action::command(ActionKind::Reload),
            on(ActionKind::Mouseup, "#a"),
        ];
        assert_eq!(plan_batch(&actions, 1), BatchPlan::Single { index: 1 });
        assert_eq!(plan_batch(&actions, 0).len(), 1);
    }
}
