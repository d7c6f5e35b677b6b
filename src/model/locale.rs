//! Month names and the handful of built-in UI strings, per language tag.

use super::timeline::ViewMode;

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const MONTHS_DE: [&str; 12] = [
    "januar", "februar", "märz", "april", "mai", "juni", "juli", "august", "september",
    "oktober", "november", "dezember",
];
const MONTHS_FR: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];
const MONTHS_ES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];
const MONTHS_ZH: [&str; 12] = [
    "一月", "二月", "三月", "四月", "五月", "六月", "七月", "八月", "九月", "十月", "十一月",
    "十二月",
];

/// Language used for month names and toolbar labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    De,
    Fr,
    Es,
    Zh,
}

impl Language {
    /// Resolve a BCP-47-ish tag (`"en"`, `"en-US"`, `"zh-CN"`). Unknown tags fall back to English.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "de" => Language::De,
            "fr" => Language::Fr,
            "es" => Language::Es,
            "zh" => Language::Zh,
            _ => Language::En,
        }
    }

    /// Long month name with the first letter capitalized. `month0` is zero-based.
    pub fn month_long(self, month0: u32) -> String {
        let table = match self {
            Language::En => &MONTHS_EN,
            Language::De => &MONTHS_DE,
            Language::Fr => &MONTHS_FR,
            Language::Es => &MONTHS_ES,
            Language::Zh => &MONTHS_ZH,
        };
        capitalize(table[(month0 % 12) as usize])
    }

    /// Short month name: the English three-letter table, or the first three
    /// characters of the long name elsewhere.
    pub fn month_short(self, month0: u32) -> String {
        match self {
            Language::En => MONTHS_EN[(month0 % 12) as usize][..3].to_string(),
            Language::Zh => self.month_long(month0),
            _ => self.month_long(month0).chars().take(3).collect(),
        }
    }

    pub fn today_label(self) -> &'static str {
        match self {
            Language::Zh => "今天",
            Language::De => "Heute",
            Language::Fr => "Aujourd'hui",
            Language::Es => "Hoy",
            Language::En => "Today",
        }
    }

    pub fn mode_label(self, mode: ViewMode) -> &'static str {
        match self {
            Language::Zh => match mode {
                ViewMode::Hour => "时",
                ViewMode::QuarterDay => "季时",
                ViewMode::HalfDay => "半天",
                ViewMode::Day => "日",
                ViewMode::Week => "周",
                ViewMode::Month => "月",
                ViewMode::QuarterYear => "季",
                ViewMode::Year => "年",
            },
            _ => mode.name(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_resolve_with_region_suffix() {
        assert_eq!(Language::from_tag("zh-CN"), Language::Zh);
        assert_eq!(Language::from_tag("fr_FR"), Language::Fr);
        assert_eq!(Language::from_tag("xx"), Language::En);
    }

    #[test]
    fn month_names_are_capitalized() {
        assert_eq!(Language::De.month_long(2), "März");
        assert_eq!(Language::Fr.month_short(1), "Fév");
        assert_eq!(Language::En.month_short(8), "Sep");
    }
}
