//! 키 코드/문자 코드를 표시 문자열로 바꾸는 표이다.

pub const KEY_BACKSPACE: u32 = 8;
pub const KEY_TAB: u32 = 9;
pub const KEY_ENTER: u32 = 13;
pub const KEY_SHIFT: u32 = 16;
pub const KEY_CTRL: u32 = 17;
pub const KEY_ALT: u32 = 18;
pub const KEY_SPACE: u32 = 32;
pub const KEY_META_LEFT: u32 = 91;
pub const KEY_META_RIGHT: u32 = 93;
pub const KEY_META_FIREFOX: u32 = 224;

/// 수정자 키인지 확인한다.
pub fn is_modifier_key(key_code: u32) -> bool {
    matches!(
        key_code,
        KEY_SHIFT | KEY_CTRL | KEY_ALT | KEY_META_LEFT | KEY_META_RIGHT | KEY_META_FIREFOX
    )
}

/// keydown 키 코드를 표시 문자열로 변환한다.
pub fn key_code_to_string(key_code: u32) -> String {
    let named = match key_code {
        KEY_BACKSPACE => "Backspace",
        KEY_TAB => "Tab",
        KEY_ENTER => "Enter",
        KEY_SHIFT => "Shift",
        KEY_CTRL => "Ctrl",
        KEY_ALT => "Alt",
        20 => "CapsLock",
        27 => "Esc",
        KEY_SPACE => "Space",
        33 => "PageUp",
        34 => "PageDown",
        35 => "End",
        36 => "Home",
        37 => "Left",
        38 => "Up",
        39 => "Right",
        40 => "Down",
        45 => "Insert",
        46 => "Delete",
        KEY_META_LEFT | KEY_META_RIGHT | KEY_META_FIREFOX => "Cmd",
        186 => ";",
        187 => "=",
        188 => ",",
        189 => "-",
        190 => ".",
        191 => "/",
        192 => "`",
        219 => "[",
        220 => "\\",
        221 => "]",
        222 => "'",
        _ => "",
    };
    if !named.is_empty() {
        return named.to_string();
    }
    match key_code {
        48..=57 | 65..=90 => char::from_u32(key_code)
            .map(|c| c.to_string())
            .unwrap_or_default(),
        96..=105 => format!("Num{}", key_code - 96),
        112..=123 => format!("F{}", key_code - 111),
        other => format!("Key{other}"),
    }
}

/// keypress 문자 코드를 표시 문자열로 변환한다.
pub fn char_code_to_string(char_code: u32) -> String {
    match char_code {
        KEY_ENTER => "Enter".to_string(),
        KEY_SPACE => "Space".to_string(),
        other => char::from_u32(other)
            .filter(|c| !c.is_control())
            .map(|c| c.to_string())
            .unwrap_or_else(|| format!("Char{other}")),
    }
}

/// keypress 문자가 keydown 키 코드로 입력된 것인지 확인한다.
pub fn char_matches_key_code(char_code: u32, key_code: u32) -> bool {
    if char_code == key_code && matches!(char_code, KEY_ENTER | KEY_SPACE) {
        return true;
    }
    let Some(ch) = char::from_u32(char_code) else {
        return false;
    };
    if ch.is_ascii_alphanumeric() {
        return ch.to_ascii_uppercase() as u32 == key_code;
    }
    let shifted_digit = match ch {
        ')' => Some('0'),
        '!' => Some('1'),
        '@' => Some('2'),
        '#' => Some('3'),
        '$' => Some('4'),
        '%' => Some('5'),
        '^' => Some('6'),
        '&' => Some('7'),
        '*' => Some('8'),
        '(' => Some('9'),
        _ => None,
    };
    if let Some(digit) = shifted_digit {
        return digit as u32 == key_code;
    }
    let punctuation = match ch {
        ';' | ':' => 186,
        '=' | '+' => 187,
        ',' | '<' => 188,
        '-' | '_' => 189,
        '.' | '>' => 190,
        '/' | '?' => 191,
        '`' | '~' => 192,
        '[' | '{' => 219,
        '\\' | '|' => 220,
        ']' | '}' => 221,
        '\'' | '"' => 222,
        _ => return false,
    };
    punctuation == key_code
}
