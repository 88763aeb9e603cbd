use crate::action::Action;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// 데이터 참조가 속한 범위이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    /// 프로젝트 공용 데이터.
    Project,
    /// 시나리오 전용 데이터.
    Scenario,
}

impl fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataOrigin::Project => write!(f, "project"),
            DataOrigin::Scenario => write!(f, "scenario"),
        }
    }
}

impl FromStr for DataOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(DataOrigin::Project),
            "scenario" => Ok(DataOrigin::Scenario),
            other => Err(format!("알 수 없는 데이터 범위: {other}")),
        }
    }
}

/// 이름 있는 데이터 항목이다. `regex`가 참이면 값은 템플릿 정규식이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedData {
    /// 데이터 셋 안에서 고유한 이름.
    pub name: String,
    /// 값 또는 템플릿.
    pub value: String,
    /// 정규식 생성 여부.
    #[serde(default)]
    pub regex: bool,
}

impl NamedData {
    /// 리터럴 데이터를 생성한다.
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            regex: false,
        }
    }

    /// 정규식 템플릿 데이터를 생성한다.
    pub fn pattern(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            regex: true,
        }
    }
}

/// 이름으로 조회하는 데이터 셋이다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSet {
    items: Vec<NamedData>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이름으로 데이터를 조회한다.
    pub fn get_data(&self, name: &str) -> Option<&NamedData> {
        self.items.iter().find(|d| d.name == name)
    }

    /// 데이터를 추가하거나 같은 이름의 항목을 교체한다.
    pub fn upsert(&mut self, data: NamedData) {
        match self.items.iter_mut().find(|d| d.name == data.name) {
            Some(existing) => *existing = data,
            None => self.items.push(data),
        }
    }

    /// 이름으로 항목을 제거한다.
    pub fn remove(&mut self, name: &str) -> Option<NamedData> {
        let pos = self.items.iter().position(|d| d.name == name)?;
        Some(self.items.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedData> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<NamedData> for DataSet {
    fn from_iter<T: IntoIterator<Item = NamedData>>(iter: T) -> Self {
        let mut set = DataSet::new();
        for data in iter {
            set.upsert(data);
        }
        set
    }
}

/// 재생 동작 설정이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// 마지막 액션 후 완료 판정 전 대기 시간(밀리초).
    #[serde(default = "default_wait_before_complete")]
    pub wait_before_complete_ms: u64,
    /// 정규식 값 생성 시 무한 반복의 상한.
    #[serde(default = "default_regex_max_repeat")]
    pub regex_max_repeat: u32,
    /// 값 생성 난수 시드. 없으면 엔트로피에서 생성한다.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            wait_before_complete_ms: default_wait_before_complete(),
            regex_max_repeat: default_regex_max_repeat(),
            seed: None,
        }
    }
}

fn default_wait_before_complete() -> u64 {
    100
}

fn default_regex_max_repeat() -> u32 {
    100
}

/// 녹화된 액션과 데이터로 구성된 시나리오이다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// 시나리오 표시 이름.
    pub name: String,
    /// 재생 시작 URL.
    #[serde(default)]
    pub url: Option<String>,
    /// 녹화 순서의 액션 목록.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// 시나리오 범위 데이터.
    #[serde(default)]
    pub data: DataSet,
    /// 프로젝트 범위 데이터.
    #[serde(default)]
    pub project_data: Option<DataSet>,
    /// 재생 설정.
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl Scenario {
    /// 전체 액션 수를 반환한다.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// 액션이 비었는지 확인한다.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// YAML 파일을 읽어 Scenario로 역직렬화한다.
pub fn load_scenario_from_file(path: &Path) -> anyhow::Result<Scenario> {
    let mut file = File::open(path)
        .with_context(|| format!("시나리오 파일을 열 수 없습니다: {}", path.display()))?;
    load_scenario_from_reader(&mut file)
        .with_context(|| format!("시나리오 파싱 실패: {}", path.display()))
}

/// Reader에서 YAML을 읽어 Scenario 구조체로 파싱한다.
pub fn load_scenario_from_reader<R: Read>(reader: &mut R) -> anyhow::Result<Scenario> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    let scenario: Scenario = serde_yaml::from_str(&buf)?;
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    #[test]
    fn loads_scenario_with_defaults() {
        let yaml = r#"
name: login
url: https://example.com/login
actions:
  - type: click
    element: { id: user, tag_name: input }
  - type: back
data:
  - name: user
    value: "user_${n}"
    regex: true
  - name: n
    value: "[0-9]{3}"
"#;
        let scenario =
            load_scenario_from_reader(&mut yaml.as_bytes()).expect("시나리오 파싱 실패");
        assert_eq!(scenario.len(), 2);
        assert_eq!(scenario.actions[1].kind, ActionKind::Back);
        assert_eq!(scenario.data.len(), 2);
        assert!(scenario.data.get_data("user").map(|d| d.regex).unwrap_or(false));
        assert!(!scenario.data.get_data("n").map(|d| d.regex).unwrap_or(true));
        assert!(scenario.project_data.is_none());
        assert_eq!(scenario.replay, ReplayConfig::default());
    }

    #[test]
    fn upsert_replaces_by_name() {
        let mut set: DataSet = [NamedData::literal("a", "1")].into_iter().collect();
        set.upsert(NamedData::literal("a", "2"));
        set.upsert(NamedData::literal("b", "3"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_data("a").map(|d| d.value.as_str()), Some("2"));
        assert!(set.remove("b").is_some());
        assert!(set.get_data("b").is_none());
    }
}
