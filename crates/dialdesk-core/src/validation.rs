/// True for names that can be spliced into SQL as an identifier: an ASCII
/// letter or underscore followed by letters, digits or underscores.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::is_plain_identifier;

    #[test]
    fn plain_identifiers_only() {
        assert!(is_plain_identifier("cdr"));
        assert!(is_plain_identifier("_cdr_2024"));
        assert!(!is_plain_identifier("2cdr"));
        assert!(!is_plain_identifier("cdr-x"));
        assert!(!is_plain_identifier("cdr; DROP TABLE x"));
        assert!(!is_plain_identifier(""));
    }
}
