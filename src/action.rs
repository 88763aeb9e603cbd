use crate::scenario::DataOrigin;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 녹화된 요소를 다시 찾기 위한 위치 정보이다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementRef {
    /// DOM id 속성.
    #[serde(default)]
    pub id: Option<String>,
    /// CSS 셀렉터.
    #[serde(default)]
    pub css_selector: Option<String>,
    /// XPath 표현식.
    #[serde(default)]
    pub xpath: Option<String>,
    /// 소문자 태그 이름.
    #[serde(default)]
    pub tag_name: Option<String>,
    /// input 요소의 type 속성.
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,
    /// 요소가 속한 form. 관계만 표현하며 소유하지 않는다.
    #[serde(default)]
    pub form: Option<Box<ElementRef>>,
}

impl ElementRef {
    /// CSS 셀렉터만으로 요소를 생성한다.
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            css_selector: Some(selector.into()),
            ..Self::default()
        }
    }

    /// 태그 이름을 지정한다.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_name = Some(tag.into());
        self
    }

    /// input type을 지정한다.
    pub fn with_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    /// 소속 form을 지정한다.
    pub fn with_form(mut self, form: ElementRef) -> Self {
        self.form = Some(Box::new(form));
        self
    }

    /// `<input type="submit">` 요소인지 확인한다.
    pub fn is_submit_control(&self) -> bool {
        self.tag_name.as_deref() == Some("input") && self.input_type.as_deref() == Some("submit")
    }

    /// 두 요소가 같은 form에 속하는지 확인한다. form이 없으면 같다고 보지 않는다.
    pub fn shares_form_with(&self, other: &ElementRef) -> bool {
        match (&self.form, &other.form) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for ElementRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.css_selector == other.css_selector && self.xpath == other.xpath
    }
}

impl Eq for ElementRef {}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag_name.as_deref().unwrap_or("");
        if let Some(id) = &self.id {
            write!(f, "{tag}#{id}")
        } else if let Some(css) = &self.css_selector {
            write!(f, "{css}")
        } else if let Some(xpath) = &self.xpath {
            write!(f, "{xpath}")
        } else if !tag.is_empty() {
            write!(f, "{tag}")
        } else {
            write!(f, "(unknown element)")
        }
    }
}

/// 실제 페이지에서 요소 관계를 조회하는 기능이다.
pub trait DomLookup {
    /// 현재 페이지 기준으로 요소가 속한 form을 찾는다.
    fn form_of(&self, element: &ElementRef) -> Option<ElementRef>;
}

/// 키/수정자 정보를 담는 이벤트 옵션이다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOptions {
    #[serde(default)]
    pub key_code: u32,
    #[serde(default)]
    pub char_code: u32,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub meta_key: bool,
    #[serde(default)]
    pub alt_key: bool,
    #[serde(default)]
    pub shift_key: bool,
}

/// 액션 종류. DOM 이벤트는 조합 가능하고 나머지는 단독으로 실행된다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Keydown,
    Keypress,
    Keyup,
    Mousedown,
    Mouseup,
    Click,
    Input,
    Change,
    Submit,
    TextInput,
    /// 브라우저 뒤로 가기.
    Back,
    /// 브라우저 앞으로 가기.
    Forward,
    /// 페이지 새로고침.
    Reload,
    /// 지정 시간 대기.
    Wait { millis: u64 },
    /// 현재 URL 검증.
    VerifyUrl { url: String },
    /// 요소 텍스트 검증.
    VerifyText { text: String },
    /// 이름 있는 데이터를 해석해 요소에 입력한다.
    InsertData { origin: DataOrigin, name: String },
}

impl ActionKind {
    /// 이벤트 이름을 반환한다.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Keydown => "keydown",
            ActionKind::Keypress => "keypress",
            ActionKind::Keyup => "keyup",
            ActionKind::Mousedown => "mousedown",
            ActionKind::Mouseup => "mouseup",
            ActionKind::Click => "click",
            ActionKind::Input => "input",
            ActionKind::Change => "change",
            ActionKind::Submit => "submit",
            ActionKind::TextInput => "textInput",
            ActionKind::Back => "back",
            ActionKind::Forward => "forward",
            ActionKind::Reload => "reload",
            ActionKind::Wait { .. } => "wait",
            ActionKind::VerifyUrl { .. } => "verify_url",
            ActionKind::VerifyText { .. } => "verify_text",
            ActionKind::InsertData { .. } => "insert_data",
        }
    }

    pub fn is_key(&self) -> bool {
        matches!(
            self,
            ActionKind::Keydown | ActionKind::Keypress | ActionKind::Keyup
        )
    }

    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            ActionKind::Mousedown | ActionKind::Mouseup | ActionKind::Click
        )
    }

    /// 단계를 열지 않고 직전 마우스/키 단계에 붙는 이벤트인지 확인한다.
    pub fn is_follow_up(&self) -> bool {
        matches!(
            self,
            ActionKind::Input | ActionKind::Change | ActionKind::Submit | ActionKind::TextInput
        )
    }

    /// 편집 대상이 아닌 브라우저 명령인지 확인한다.
    pub fn is_browser_command(&self) -> bool {
        matches!(
            self,
            ActionKind::Back | ActionKind::Forward | ActionKind::Reload
        )
    }

    /// DOM 이벤트로 녹화된 조합 가능한 액션인지 확인한다.
    pub fn is_composable(&self) -> bool {
        self.is_key() || self.is_mouse() || self.is_follow_up()
    }
}

/// 녹화된 단일 상호작용이다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// 액션 종류와 종류별 필드.
    #[serde(flatten)]
    pub kind: ActionKind,
    /// 대상 요소.
    #[serde(default)]
    pub element: Option<ElementRef>,
    /// 키/수정자 옵션.
    #[serde(default)]
    pub options: EventOptions,
}

impl Action {
    /// 요소를 지정해 액션을 생성한다.
    pub fn new(kind: ActionKind, element: Option<ElementRef>) -> Self {
        Self {
            kind,
            element,
            options: EventOptions::default(),
        }
    }

    /// 키 이벤트를 생성한다.
    pub fn key(kind: ActionKind, element: ElementRef, key_code: u32) -> Self {
        let mut action = Self::new(kind, Some(element));
        action.options.key_code = key_code;
        action
    }

    /// 요소 없는 브라우저/검증 명령을 생성한다.
    pub fn command(kind: ActionKind) -> Self {
        Self::new(kind, None)
    }

    pub fn is_composable(&self) -> bool {
        self.kind.is_composable()
    }

    /// 두 액션의 대상 요소가 같은지 확인한다. 한쪽이라도 없으면 다르다.
    pub fn same_element(&self, other: &Action) -> bool {
        match (&self.element, &other.element) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// 사람이 읽을 수 있는 설명을 만든다.
    pub fn display(&self) -> String {
        let target = self
            .element
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "page".to_string());
        match &self.kind {
            ActionKind::Back => "Go back".to_string(),
            ActionKind::Forward => "Go forward".to_string(),
            ActionKind::Reload => "Reload page".to_string(),
            ActionKind::Wait { millis } => format!("Wait {millis} ms"),
            ActionKind::VerifyUrl { url } => format!("Verify URL is {url}"),
            ActionKind::VerifyText { text } => format!("Verify text \"{text}\" on {target}"),
            ActionKind::InsertData { origin, name } => {
                format!("Insert {origin} data \"{name}\" into {target}")
            }
            kind => format!("{} on {target}", kind.name()),
        }
    }
}

/// 액션 하나의 실행 결과이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// 성공 여부.
    pub pass: bool,
    /// 실패 시 오류 메시지.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    /// 성공 결과를 생성한다.
    pub fn pass() -> Self {
        Self {
            pass: true,
            error: None,
        }
    }

    /// 실패 결과를 생성한다.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            pass: false,
            error: Some(message.into()),
        }
    }
}
