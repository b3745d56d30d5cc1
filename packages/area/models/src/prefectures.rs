//! JIS X 0401 prefecture code utilities.
//!
//! Provides mappings between two-digit prefecture codes, Japanese names,
//! and romanized names for the 47 prefectures.

/// `(code, Japanese name, romanized name)` for every prefecture.
const PREFECTURES: &[(&str, &str, &str)] = &[
    ("01", "北海道", "Hokkaido"),
    ("02", "青森県", "Aomori"),
    ("03", "岩手県", "Iwate"),
    ("04", "宮城県", "Miyagi"),
    ("05", "秋田県", "Akita"),
    ("06", "山形県", "Yamagata"),
    ("07", "福島県", "Fukushima"),
    ("08", "茨城県", "Ibaraki"),
    ("09", "栃木県", "Tochigi"),
    ("10", "群馬県", "Gunma"),
    ("11", "埼玉県", "Saitama"),
    ("12", "千葉県", "Chiba"),
    ("13", "東京都", "Tokyo"),
    ("14", "神奈川県", "Kanagawa"),
    ("15", "新潟県", "Niigata"),
    ("16", "富山県", "Toyama"),
    ("17", "石川県", "Ishikawa"),
    ("18", "福井県", "Fukui"),
    ("19", "山梨県", "Yamanashi"),
    ("20", "長野県", "Nagano"),
    ("21", "岐阜県", "Gifu"),
    ("22", "静岡県", "Shizuoka"),
    ("23", "愛知県", "Aichi"),
    ("24", "三重県", "Mie"),
    ("25", "滋賀県", "Shiga"),
    ("26", "京都府", "Kyoto"),
    ("27", "大阪府", "Osaka"),
    ("28", "兵庫県", "Hyogo"),
    ("29", "奈良県", "Nara"),
    ("30", "和歌山県", "Wakayama"),
    ("31", "鳥取県", "Tottori"),
    ("32", "島根県", "Shimane"),
    ("33", "岡山県", "Okayama"),
    ("34", "広島県", "Hiroshima"),
    ("35", "山口県", "Yamaguchi"),
    ("36", "徳島県", "Tokushima"),
    ("37", "香川県", "Kagawa"),
    ("38", "愛媛県", "Ehime"),
    ("39", "高知県", "Kochi"),
    ("40", "福岡県", "Fukuoka"),
    ("41", "佐賀県", "Saga"),
    ("42", "長崎県", "Nagasaki"),
    ("43", "熊本県", "Kumamoto"),
    ("44", "大分県", "Oita"),
    ("45", "宮崎県", "Miyazaki"),
    ("46", "鹿児島県", "Kagoshima"),
    ("47", "沖縄県", "Okinawa"),
];

/// Returns the two-digit codes of all 47 prefectures in ascending order.
pub fn prefecture_codes() -> impl Iterator<Item = &'static str> {
    PREFECTURES.iter().map(|(code, _, _)| *code)
}

/// Whether `code` is one of the 47 prefecture codes.
#[must_use]
pub fn is_prefecture_code(code: &str) -> bool {
    PREFECTURES.iter().any(|(c, _, _)| *c == code)
}

/// Maps a two-digit code to the Japanese prefecture name (`"14"` -> `"神奈川県"`).
#[must_use]
pub fn prefecture_name(code: &str) -> Option<&'static str> {
    PREFECTURES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, name, _)| *name)
}

/// Maps a two-digit code to the romanized prefecture name (`"14"` -> `"Kanagawa"`).
#[must_use]
pub fn prefecture_name_en(code: &str) -> Option<&'static str> {
    PREFECTURES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, _, name)| *name)
}

/// Resolves a prefecture name to its code.
///
/// Accepts the full Japanese name (`"大阪府"`), the name without its
/// 都/道/府/県 suffix (`"大阪"`), or the romanized name in any case
/// (`"osaka"`).
#[must_use]
pub fn code_for_name(name: &str) -> Option<&'static str> {
    let name = name.trim();
    PREFECTURES
        .iter()
        .find(|(_, ja, en)| {
            *ja == name
                || strip_suffix(ja) == name
                || en.eq_ignore_ascii_case(name)
        })
        .map(|(code, _, _)| *code)
}

fn strip_suffix(name: &str) -> &str {
    name.strip_suffix(['都', '道', '府', '県']).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefecture_count() {
        assert_eq!(prefecture_codes().count(), 47);
    }

    #[test]
    fn codes_are_sequential() {
        for (i, code) in prefecture_codes().enumerate() {
            assert_eq!(code, format!("{:02}", i + 1));
        }
    }

    #[test]
    fn name_roundtrip() {
        for code in prefecture_codes() {
            let name = prefecture_name(code).unwrap();
            assert_eq!(code_for_name(name), Some(code), "roundtrip failed for {code}");
            let en = prefecture_name_en(code).unwrap();
            assert_eq!(code_for_name(en), Some(code), "roundtrip failed for {en}");
        }
    }

    #[test]
    fn short_names() {
        assert_eq!(code_for_name("大阪"), Some("27"));
        assert_eq!(code_for_name("神奈川"), Some("14"));
        assert_eq!(code_for_name("東京"), Some("13"));
        assert_eq!(code_for_name("北海道"), Some("01"));
        assert_eq!(code_for_name("KANAGAWA"), Some("14"));
    }

    #[test]
    fn unknown_codes() {
        assert_eq!(prefecture_name("00"), None);
        assert_eq!(prefecture_name("48"), None);
        assert!(!is_prefecture_code("00"));
        assert!(is_prefecture_code("47"));
        assert_eq!(code_for_name("Atlantis"), None);
    }
}
