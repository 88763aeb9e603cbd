/// 데이터 해석 중 발생하는 오류를 표현한다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// 데이터 셋에 이름이 존재하지 않는 경우이다.
    #[error("Data \"{0}\" is missing")]
    Missing(String),
    /// 해석 중인 데이터가 다시 참조된 경우이다.
    #[error("Data \"{0}\" is used in circular reference")]
    Circular(String),
    /// 조립된 정규식으로 값을 생성할 수 없는 경우이다.
    #[error("Data \"{name}\" has invalid pattern: {message}")]
    InvalidPattern { name: String, message: String },
    /// 최상위 해석 실패에 데이터 이름을 덧붙인다.
    #[error("{source}. Data \"{name}\" can not be resolved.")]
    Unresolved {
        name: String,
        #[source]
        source: Box<DataError>,
    },
}

impl DataError {
    /// 가장 안쪽의 원인 오류를 반환한다.
    pub fn root(&self) -> &DataError {
        match self {
            DataError::Unresolved { source, .. } => source.root(),
            other => other,
        }
    }
}

/// 재생 실행을 종료시키는 오류이다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// 실행한 액션이 실패 결과를 반환했다.
    #[error("{0}")]
    ActionFailed(String),
    /// 호스트 페이지가 사용할 수 없는 상태가 되었다.
    #[error("{0}")]
    HostHalted(String),
    /// 드라이버가 결과를 만들지 못했다.
    #[error("드라이버 실행 실패: {0}")]
    Driver(String),
}

impl ReplayError {
    /// 호출자에게 전달할 오류 메시지를 반환한다.
    pub fn payload(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_appends_context_to_inner_message() {
        let err = DataError::Unresolved {
            name: "a".into(),
            source: Box::new(DataError::Missing("b".into())),
        };
        assert_eq!(
            err.to_string(),
            "Data \"b\" is missing. Data \"a\" can not be resolved."
        );
        assert_eq!(err.root(), &DataError::Missing("b".into()));
    }
}
