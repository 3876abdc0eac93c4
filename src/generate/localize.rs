//! Bilingual name-card handling.
//!
//! A name card is a one-word English concept plus the same concept in the
//! destination's local language, stored as two lines. When a model only
//! produces the English half, a small lookup table backfills the local one
//! for the destinations that ship with sample data.

/// Split a bilingual name card into (english, local).
pub fn split_name_card(name_card: &str) -> (String, Option<String>) {
    match name_card.split_once('\n') {
        Some((app, local)) => {
            let local = local.trim();
            (
                app.trim().to_string(),
                if local.is_empty() {
                    None
                } else {
                    Some(local.to_string())
                },
            )
        }
        None => (name_card.trim().to_string(), None),
    }
}

/// Local-language rendering of an English concept for a given country.
pub fn local_name(concept: &str, country: &str) -> Option<&'static str> {
    let entry = match (country.to_lowercase().as_str(), concept.to_lowercase().as_str()) {
        ("japan", "respect") => "尊敬",
        ("japan", "protocol") => "礼儀",
        ("japan", "courtesy") => "礼節",
        ("japan", "dining") => "食事",
        ("japan", "gifting") => "贈り物",
        ("japan", "rank") => "序列",
        ("japan", "dialogue") => "対話",
        ("japan", "time") => "時間",

        ("germany", "respect") => "Respekt",
        ("germany", "protocol") => "Protokoll",
        ("germany", "courtesy") => "Höflichkeit",
        ("germany", "dining") => "Speisen",
        ("germany", "gifting") => "Geschenke",
        ("germany", "rank") => "Rang",
        ("germany", "dialogue") => "Dialog",
        ("germany", "time") => "Zeit",

        ("china", "respect") => "尊重",
        ("china", "protocol") => "礼仪",
        ("china", "courtesy") => "礼貌",
        ("china", "dining") => "用餐",
        ("china", "gifting") => "送礼",
        ("china", "rank") => "等级",
        ("china", "dialogue") => "对话",
        ("china", "time") => "时间",

        ("korea", "respect") => "존중",
        ("korea", "protocol") => "예절",
        ("korea", "courtesy") => "예의",
        ("korea", "dining") => "식사",
        ("korea", "gifting") => "선물",
        ("korea", "rank") => "서열",
        ("korea", "dialogue") => "대화",
        ("korea", "time") => "시간",

        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_bilingual() {
        let (app, local) = split_name_card("Respect\n尊敬");
        assert_eq!(app, "Respect");
        assert_eq!(local.as_deref(), Some("尊敬"));
    }

    #[test]
    fn test_split_single_line() {
        let (app, local) = split_name_card("Courtesy");
        assert_eq!(app, "Courtesy");
        assert!(local.is_none());
    }

    #[test]
    fn test_split_trailing_newline() {
        let (app, local) = split_name_card("Time\n");
        assert_eq!(app, "Time");
        assert!(local.is_none());
    }

    #[test]
    fn test_lookup_known_pairs() {
        assert_eq!(local_name("Respect", "Japan"), Some("尊敬"));
        assert_eq!(local_name("Time", "Germany"), Some("Zeit"));
        assert_eq!(local_name("dining", "GERMANY"), Some("Speisen"));
    }

    #[test]
    fn test_lookup_unknown_country() {
        assert_eq!(local_name("Respect", "Brazil"), None);
    }
}
