use crate::data::DataResolver;
use crate::error::DataError;
use crate::scenario::{DataOrigin, DataSet, ReplayConfig};

/// 실행 중 액션이 참조하는 데이터 셋과 해석기를 묶은 컨텍스트이다.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    /// 프로젝트 범위 데이터. 프로젝트가 없으면 `None`이다.
    project: Option<DataSet>,
    /// 시나리오 범위 데이터.
    scenario: DataSet,
    /// 범위별 결과를 기억하는 해석기.
    resolver: DataResolver,
}

impl ExecutionContext {
    /// 데이터 셋과 재생 설정으로 컨텍스트를 생성한다.
    pub fn new(project: Option<DataSet>, scenario: DataSet, config: &ReplayConfig) -> Self {
        Self {
            project,
            scenario,
            resolver: DataResolver::with_config(config),
        }
    }

    /// 이름 있는 데이터를 해석한다.
    ///
    /// # 매개변수
    /// - `origin`: 데이터가 속한 범위.
    /// - `name`: 데이터 이름.
    ///
    /// # 반환값
    /// 해석된 문자열. 프로젝트가 없으면 프로젝트 범위는 빈 데이터 셋으로 취급한다.
    pub fn resolve(&mut self, origin: DataOrigin, name: &str) -> Result<String, DataError> {
        let empty = DataSet::new();
        let set = match origin {
            DataOrigin::Project => self.project.as_ref().unwrap_or(&empty),
            DataOrigin::Scenario => &self.scenario,
        };
        self.resolver.resolve(set, origin, name)
    }

    /// 시나리오 초기화 시 기억된 해석 결과를 모두 버린다.
    pub fn clear_resolutions(&mut self) {
        self.resolver.clear();
    }

    /// 범위의 데이터 셋을 조회한다.
    pub fn data_set(&self, origin: DataOrigin) -> Option<&DataSet> {
        match origin {
            DataOrigin::Project => self.project.as_ref(),
            DataOrigin::Scenario => Some(&self.scenario),
        }
    }

    /// 시나리오 데이터 셋을 교체한다.
    pub fn set_scenario_data(&mut self, set: DataSet) {
        self.scenario = set;
    }

    /// 프로젝트 데이터 셋을 교체한다. 동기화로 프로젝트가 갱신될 때 호출된다.
    pub fn set_project_data(&mut self, set: Option<DataSet>) {
        self.project = set;
    }
}

/// ExecutionContext를 비동기 환경에서 공유하기 위한 타입 별칭이다.
pub type SharedExecutionContext = std::sync::Arc<tokio::sync::RwLock<ExecutionContext>>;

/// 컨텍스트를 공유 핸들로 감싼다.
pub fn shared(context: ExecutionContext) -> SharedExecutionContext {
    std::sync::Arc::new(tokio::sync::RwLock::new(context))
}
