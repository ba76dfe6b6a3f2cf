//! JIS X 0401 prefecture codes.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prefecture {
    pub code: &'static str,
    pub name: &'static str,
}

const fn pref(code: &'static str, name: &'static str) -> Prefecture {
    Prefecture { code, name }
}

/// All 47 prefectures in code order.
pub const PREFECTURES: [Prefecture; 47] = [
    pref("01", "北海道"),
    pref("02", "青森県"),
    pref("03", "岩手県"),
    pref("04", "宮城県"),
    pref("05", "秋田県"),
    pref("06", "山形県"),
    pref("07", "福島県"),
    pref("08", "茨城県"),
    pref("09", "栃木県"),
    pref("10", "群馬県"),
    pref("11", "埼玉県"),
    pref("12", "千葉県"),
    pref("13", "東京都"),
    pref("14", "神奈川県"),
    pref("15", "新潟県"),
    pref("16", "富山県"),
    pref("17", "石川県"),
    pref("18", "福井県"),
    pref("19", "山梨県"),
    pref("20", "長野県"),
    pref("21", "岐阜県"),
    pref("22", "静岡県"),
    pref("23", "愛知県"),
    pref("24", "三重県"),
    pref("25", "滋賀県"),
    pref("26", "京都府"),
    pref("27", "大阪府"),
    pref("28", "兵庫県"),
    pref("29", "奈良県"),
    pref("30", "和歌山県"),
    pref("31", "鳥取県"),
    pref("32", "島根県"),
    pref("33", "岡山県"),
    pref("34", "広島県"),
    pref("35", "山口県"),
    pref("36", "徳島県"),
    pref("37", "香川県"),
    pref("38", "愛媛県"),
    pref("39", "高知県"),
    pref("40", "福岡県"),
    pref("41", "佐賀県"),
    pref("42", "長崎県"),
    pref("43", "熊本県"),
    pref("44", "大分県"),
    pref("45", "宮崎県"),
    pref("46", "鹿児島県"),
    pref("47", "沖縄県"),
];

pub fn find_by_code(code: &str) -> Option<&'static Prefecture> {
    PREFECTURES.iter().find(|p| p.code == code)
}

/// Prefecture name for `code`, or an empty string when unknown or absent.
pub fn name_for_code(code: Option<&str>) -> &'static str {
    code.and_then(find_by_code).map(|p| p.name).unwrap_or("")
}

pub fn code_for_name(name: &str) -> Option<&'static str> {
    PREFECTURES.iter().find(|p| p.name == name).map(|p| p.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_sequential() {
        for (i, p) in PREFECTURES.iter().enumerate() {
            assert_eq!(p.code, format!("{:02}", i + 1));
        }
    }

    #[test]
    fn lookup_by_code_and_name() {
        assert_eq!(name_for_code(Some("13")), "東京都");
        assert_eq!(name_for_code(Some("99")), "");
        assert_eq!(name_for_code(None), "");
        assert_eq!(code_for_name("沖縄県"), Some("47"));
    }
}
