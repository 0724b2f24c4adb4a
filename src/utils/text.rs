//! 文本规范化工具
//!
//! 门户上的法院名称和单元格文本带有重音、不间断空格、零宽字符，
//! 比较之前统一在这里处理。

use phf::phf_map;

/// 带重音字母 → 基本字母（希腊文 tonos / dialytika 以及常见拉丁重音）
static ACCENT_FOLD: phf::Map<char, char> = phf_map! {
    'ά' => 'α', 'έ' => 'ε', 'ή' => 'η', 'ί' => 'ι', 'ό' => 'ο', 'ύ' => 'υ', 'ώ' => 'ω',
    'ϊ' => 'ι', 'ϋ' => 'υ', 'ΐ' => 'ι', 'ΰ' => 'υ',
    'Ά' => 'Α', 'Έ' => 'Ε', 'Ή' => 'Η', 'Ί' => 'Ι', 'Ό' => 'Ο', 'Ύ' => 'Υ', 'Ώ' => 'Ω',
    'Ϊ' => 'Ι', 'Ϋ' => 'Υ',
    'à' => 'a', 'á' => 'a', 'â' => 'a', 'ä' => 'a', 'ã' => 'a', 'å' => 'a',
    'è' => 'e', 'é' => 'e', 'ê' => 'e', 'ë' => 'e',
    'ì' => 'i', 'í' => 'i', 'î' => 'i', 'ï' => 'i',
    'ò' => 'o', 'ó' => 'o', 'ô' => 'o', 'ö' => 'o', 'õ' => 'o',
    'ù' => 'u', 'ú' => 'u', 'û' => 'u', 'ü' => 'u',
    'ç' => 'c', 'ñ' => 'n',
    'À' => 'A', 'Á' => 'A', 'Â' => 'A', 'Ä' => 'A', 'Ã' => 'A', 'Å' => 'A',
    'È' => 'E', 'É' => 'E', 'Ê' => 'E', 'Ë' => 'E',
    'Ì' => 'I', 'Í' => 'I', 'Î' => 'I', 'Ï' => 'I',
    'Ò' => 'O', 'Ó' => 'O', 'Ô' => 'O', 'Ö' => 'O', 'Õ' => 'O',
    'Ù' => 'U', 'Ú' => 'U', 'Û' => 'U', 'Ü' => 'U',
    'Ç' => 'C', 'Ñ' => 'N',
};

/// 表头中同时出现的两个短语（已规范化）
const HEADER_PHRASES: [&str; 2] = ["αριθμος αποφασης", "ειδος διατακτικου"];

/// 是否为组合用附加符号（U+0300..U+036F）
fn is_combining_mark(ch: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&ch)
}

fn is_zero_width(ch: char) -> bool {
    matches!(ch, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
}

/// 规范化标签，用于法院名称比较
///
/// 去掉重音和零宽字符，标点换成空格，合并空白，转小写。
pub fn normalize_label(text: &str) -> String {
    let folded: String = text
        .chars()
        .filter(|ch| !is_combining_mark(*ch) && !is_zero_width(*ch))
        .map(|ch| ACCENT_FOLD.get(&ch).copied().unwrap_or(ch))
        .map(|ch| {
            if ch.is_alphanumeric() || ch == '_' || ch.is_whitespace() {
                ch
            } else {
                ' '
            }
        })
        .collect();

    collapse_whitespace(&folded).to_lowercase()
}

/// 合并空白（包括不间断空格）并去掉首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    text.split(|ch: char| ch.is_whitespace() || ch == '\u{00A0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 文本看起来是不是结果表的表头
pub fn looks_like_header(text: &str) -> bool {
    let normalized = normalize_label(text);
    HEADER_PHRASES
        .iter()
        .all(|phrase| normalized.contains(phrase))
}

/// 结果是否有意义：非空且不是表头文本
pub fn is_meaningful_result(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !looks_like_header(trimmed)
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
