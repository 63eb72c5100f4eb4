//! Hanzi → Hanyu Pinyin (tone diacritics, space-separated), copy non-Chinese as-is.
//!
//! Bank items loaded from TOML may omit their pinyin; it is filled in here
//! before the item joins the pool.
//!
//! Example:
//!   输入: "我想喝水。"
//!   输出: "wǒ xiǎng hē shuǐ。"
use pinyin::ToPinyin;

use crate::domain::QuizItem;

/// Convert Chinese text into Hanyu Pinyin with tone diacritics, space-separated.
/// Non-Chinese characters are copied as-is.
///
/// Per-character conversion (no word segmentation), so polyphonic
/// characters use their default reading.
pub fn to_pinyin_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);

    // Insert spaces only between consecutive Hanzi syllables.
    let mut last_was_hanzi = false;

    for ch in text.chars() {
        if let Some(py) = ch.to_pinyin() {
            if last_was_hanzi {
                out.push(' ');
            }
            out.push_str(py.with_tone());
            last_was_hanzi = true;
        } else {
            out.push(ch);
            last_was_hanzi = false;
        }
    }

    out
}

/// Fill `item.pinyin` from its prompt when it is blank.
pub fn ensure_pinyin(item: &mut QuizItem) {
    if item.pinyin.trim().is_empty() {
        item.pinyin = to_pinyin_diacritics(&item.prompt);
    }
}
