use super::Step;
use super::keycode::{
    char_code_to_string, char_matches_key_code, is_modifier_key, key_code_to_string,
};
use crate::action::{Action, ActionKind};
use tracing::warn;

impl Step {
    /// 단계를 사람이 읽을 수 있는 한 줄로 표시한다.
    pub fn display(&self) -> String {
        let target = self
            .primary_element()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "(unknown element)".to_string());
        match self {
            Step::SingleAction(_) => self
                .events()
                .first()
                .map(Action::display)
                .unwrap_or_default(),
            Step::Mouse(_) => format!("{} on {target}", mouse_gesture(self.events())),
            Step::Key(_) => format!("Type [{}] on {target}", typed_keys(self.events()).join(", ")),
            Step::Tab(_) => {
                if self.events().iter().any(|e| e.kind == ActionKind::Keyup) {
                    format!("Use [Tab] to focus on {target}")
                } else {
                    format!("Use [Tab] on {target}")
                }
            }
        }
    }
}

fn mouse_gesture(events: &[Action]) -> &'static str {
    let has = |kind: ActionKind| events.iter().any(|e| e.kind == kind);
    if has(ActionKind::Click) {
        "Click"
    } else if has(ActionKind::Mousedown) {
        if has(ActionKind::Mouseup) {
            "Mouse down and up"
        } else {
            "Mouse down"
        }
    } else {
        "Mouse up"
    }
}

/// keydown/keypress 쌍을 실제 입력한 키 목록으로 정리한다.
fn typed_keys(events: &[Action]) -> Vec<String> {
    let mut keys: Vec<&Action> = Vec::new();
    let mut last_keydown: Option<&Action> = None;
    for event in events {
        match event.kind {
            ActionKind::Keydown => {
                if let Some(pending) = last_keydown.replace(event) {
                    keys.push(pending);
                }
            }
            ActionKind::Keypress => match last_keydown.take() {
                Some(down)
                    if char_matches_key_code(event.options.char_code, down.options.key_code) =>
                {
                    keys.push(event);
                }
                Some(down) => {
                    warn!(
                        char_code = event.options.char_code,
                        key_code = down.options.key_code,
                        "keydown과 맞지 않는 keypress"
                    );
                    keys.push(down);
                }
                None => warn!(char_code = event.options.char_code, "짝이 없는 keypress"),
            },
            _ => {}
        }
    }
    if let Some(pending) = last_keydown {
        keys.push(pending);
    }
    keys.into_iter().map(key_label).collect()
}

fn key_label(event: &Action) -> String {
    if event.kind != ActionKind::Keydown {
        return char_code_to_string(event.options.char_code);
    }
    let code = event.options.key_code;
    let mut label = key_code_to_string(code);
    if is_modifier_key(code) {
        return label;
    }
    let options = &event.options;
    if options.ctrl_key {
        label = format!("Ctrl-{label}");
    }
    if options.meta_key {
        label = format!("Cmd-{label}");
    }
    if options.alt_key {
        label = format!("Alt-{label}");
    }
    if options.shift_key {
        label = format!("Shift-{label}");
    }
    label
}
