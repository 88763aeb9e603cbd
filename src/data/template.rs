use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// 홀수 개의 역슬래시가 앞에 붙지 않은 `${name}` 참조.
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[^\\]|^)(?:\\\\)*(\$\{([A-Za-z0-9_]+)\})").expect("정규식 컴파일 실패")
});

/// 정규식 메타 문자.
static META: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\-\[\]/\{\}\(\)\*\+\?\.\\\^\$\|]").expect("정규식 컴파일 실패")
});

/// 템플릿 안의 데이터 참조 위치이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'a> {
    /// 참조하는 데이터 이름.
    pub name: &'a str,
    /// `${`부터 `}`까지의 바이트 범위.
    pub span: Range<usize>,
}

/// 템플릿의 모든 참조를 앞에서부터 찾는다.
///
/// 매치는 참조 앞 한 글자를 소비하므로 다음 검색은 매치 시작 다음 글자부터 이어서
/// `${a}${b}`처럼 붙어 있는 참조도 놓치지 않는다.
pub fn references(template: &str) -> Vec<Reference<'_>> {
    let mut found = Vec::new();
    let mut start = 0;
    while start <= template.len() {
        let Some(caps) = REFERENCE.captures_at(template, start) else {
            break;
        };
        let (Some(whole), Some(reference), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            break;
        };
        found.push(Reference {
            name: name.as_str(),
            span: reference.range(),
        });
        start = whole.start()
            + template[whole.start()..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
    }
    found
}

/// 값을 정규식 안에서 문자 그대로 쓰이도록 이스케이프한다.
pub fn escape_pattern(value: &str) -> String {
    META.replace_all(value, r"\${0}").into_owned()
}

/// 참조를 `resolve` 결과로 치환해 정규식 패턴을 조립한다. 치환 값은 이스케이프된다.
pub fn assemble<E, F>(template: &str, mut resolve: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<String, E>,
{
    let mut result = String::with_capacity(template.len());
    let mut last = 0;
    for reference in references(template) {
        let value = resolve(reference.name)?;
        result.push_str(&template[last..reference.span.start]);
        result.push_str(&escape_pattern(&value));
        last = reference.span.end;
    }
    result.push_str(&template[last..]);
    Ok(result)
}
