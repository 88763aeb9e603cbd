use super::template::assemble;
use crate::error::DataError;
use crate::scenario::{DataOrigin, DataSet, NamedData, ReplayConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex_syntax::Parser;
use regex_syntax::hir::{Capture, Hir, HirKind, Repetition};
use std::collections::HashMap;
use tracing::debug;

/// 해석 결과와 해석 당시의 데이터 내용이다.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: NamedData,
    resolution: String,
}

type ResolutionCache = HashMap<String, CacheEntry>;

/// 이름 있는 데이터를 실제 문자열로 해석하고 범위별로 결과를 기억한다.
///
/// 기억한 결과는 해당 항목의 이름/값/정규식 여부가 바뀌었을 때만 다시 계산된다.
/// 시나리오를 초기화할 때는 [`DataResolver::clear`]로 두 범위를 모두 비워야 한다.
#[derive(Debug)]
pub struct DataResolver {
    project: ResolutionCache,
    scenario: ResolutionCache,
    rng: StdRng,
    max_repeat: u32,
}

impl DataResolver {
    /// 엔트로피 기반 난수로 해석기를 생성한다.
    pub fn new() -> Self {
        Self::with_config(&ReplayConfig::default())
    }

    /// 재생 설정의 시드와 반복 상한을 적용해 생성한다.
    pub fn with_config(config: &ReplayConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            project: HashMap::new(),
            scenario: HashMap::new(),
            rng,
            max_repeat: config.regex_max_repeat,
        }
    }

    /// `origin` 범위의 `set`에서 `name`을 해석한다.
    ///
    /// 실패하면 안쪽 원인에 최상위 이름을 덧붙인 [`DataError::Unresolved`]를 반환한다.
    pub fn resolve(
        &mut self,
        set: &DataSet,
        origin: DataOrigin,
        name: &str,
    ) -> Result<String, DataError> {
        let cache = match origin {
            DataOrigin::Project => &mut self.project,
            DataOrigin::Scenario => &mut self.scenario,
        };
        let mut resolution = Resolution {
            set,
            cache,
            rng: &mut self.rng,
            max_repeat: self.max_repeat,
            used: Vec::new(),
        };
        resolution
            .resolve(name)
            .map_err(|source| DataError::Unresolved {
                name: name.to_string(),
                source: Box::new(source),
            })
    }

    /// 두 범위의 기억된 결과를 모두 버린다.
    pub fn clear(&mut self) {
        self.project.clear();
        self.scenario.clear();
    }
}

impl Default for DataResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// 한 번의 최상위 해석 호출 동안 유지되는 상태이다.
struct Resolution<'a> {
    set: &'a DataSet,
    cache: &'a mut ResolutionCache,
    rng: &'a mut StdRng,
    max_repeat: u32,
    /// 현재 해석 중인 이름 스택.
    used: Vec<String>,
}

impl Resolution<'_> {
    fn resolve(&mut self, name: &str) -> Result<String, DataError> {
        let set = self.set;
        let data = set
            .get_data(name)
            .ok_or_else(|| DataError::Missing(name.to_string()))?;

        // 순환 검사보다 먼저 확인해야 여러 번 참조된 항목이 순환으로 오인되지 않는다.
        if let Some(entry) = self.cache.get(name) {
            if entry.data == *data {
                return Ok(entry.resolution.clone());
            }
        }
        if self.used.iter().any(|u| u == name) {
            return Err(DataError::Circular(name.to_string()));
        }

        self.used.push(name.to_string());
        let resolution = if data.regex {
            let pattern = assemble(&data.value, |sub| self.resolve(sub))?;
            self.generate(name, &pattern)?
        } else {
            data.value.clone()
        };
        self.used.pop();

        debug!(name, regex = data.regex, "데이터 해석 완료");
        self.cache.insert(
            name.to_string(),
            CacheEntry {
                data: data.clone(),
                resolution: resolution.clone(),
            },
        );
        Ok(resolution)
    }

    fn generate(&mut self, name: &str, pattern: &str) -> Result<String, DataError> {
        let invalid = |message: String| DataError::InvalidPattern {
            name: name.to_string(),
            message,
        };
        let hir = Parser::new()
            .parse(pattern)
            .map_err(|err| invalid(err.to_string()))?;
        let generator = rand_regex::Regex::with_hir(strip_assertions(hir), self.max_repeat)
            .map_err(|err| invalid(err.to_string()))?;
        Ok(self.rng.sample::<String, _>(&generator))
    }
}

/// 앵커와 단어 경계는 만들 문자가 없으므로 빈 패턴으로 바꾼다.
fn strip_assertions(hir: Hir) -> Hir {
    match hir.into_kind() {
        HirKind::Empty | HirKind::Look(_) => Hir::empty(),
        HirKind::Literal(literal) => Hir::literal(literal.0),
        HirKind::Class(class) => Hir::class(class),
        HirKind::Repetition(rep) => Hir::repetition(Repetition {
            sub: Box::new(strip_assertions(*rep.sub)),
            ..rep
        }),
        HirKind::Capture(capture) => Hir::capture(Capture {
            sub: Box::new(strip_assertions(*capture.sub)),
            ..capture
        }),
        HirKind::Concat(subs) => Hir::concat(subs.into_iter().map(strip_assertions).collect()),
        HirKind::Alternation(subs) => {
            Hir::alternation(subs.into_iter().map(strip_assertions).collect())
        }
    }
}
