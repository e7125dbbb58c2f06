const TRUE_FLAGS: [&str; 4] = ["1", "true", "yes", "on"];
const FALSE_FLAGS: [&str; 4] = ["0", "false", "no", "off"];

/// Parse a boolean flag from a string value, or return the given default otherwise.
///
/// The payment provider sends its `Success` flag as a JSON boolean or as one of several string spellings,
/// depending on which notification channel produced the callback.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    let normalized = value.trim().to_ascii_lowercase();
    if TRUE_FLAGS.contains(&normalized.as_str()) {
        true
    } else if FALSE_FLAGS.contains(&normalized.as_str()) {
        false
    } else {
        default
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepts_common_spellings() {
        assert!(parse_boolean_flag(Some("true".into()), false));
        assert!(parse_boolean_flag(Some("1".into()), false));
        assert!(parse_boolean_flag(Some(" ON ".into()), false));
        assert!(!parse_boolean_flag(Some("false".into()), true));
        assert!(!parse_boolean_flag(Some("0".into()), true));
    }

    #[test]
    fn falls_back_to_default() {
        assert!(parse_boolean_flag(None, true));
        assert!(!parse_boolean_flag(Some("banana".into()), false));
    }
}
