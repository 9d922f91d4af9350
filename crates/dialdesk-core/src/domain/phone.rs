use serde::{Deserialize, Serialize};

/// How phone numbers are reduced to match keys.
///
/// Both sides of every comparison (CDR `src`/`dst` and caller/receiver
/// numbers from uploads) go through the same rule, so formatting, the
/// international `+`/`00` prefix, the configured country code and trunk
/// zeros never affect whether two numbers match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneMatchRule {
    pub country_code: Option<String>,
}

impl PhoneMatchRule {
    pub fn with_country_code(code: impl Into<String>) -> Self {
        let code: String = code.into().chars().filter(char::is_ascii_digit).collect();
        Self {
            country_code: (!code.is_empty()).then_some(code),
        }
    }

    pub fn key(&self, value: &str) -> Option<String> {
        normalize_phone_for_match(value, self.country_code.as_deref())
    }
}

pub fn normalize_phone_for_match(value: &str, country_code: Option<&str>) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut digits = String::new();
    for ch in trimmed.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        if matches!(ch, 'x' | 'X' | '#' | ';' | ',') {
            if digits.is_empty() {
                return None;
            }
            break;
        }
    }

    let mut rest = digits.as_str();
    let international = if trimmed.starts_with('+') {
        true
    } else if let Some(stripped) = rest.strip_prefix("00") {
        rest = stripped;
        true
    } else {
        false
    };

    if international {
        if let Some(code) = country_code.filter(|code| !code.is_empty()) {
            if let Some(stripped) = rest.strip_prefix(code) {
                rest = stripped;
            }
        }
    }

    let rest = rest.trim_start_matches('0');
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_string())
}
