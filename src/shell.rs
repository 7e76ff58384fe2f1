//! POSIX shell quoting for commands written into other programs' config.

/// Quote `arg` for `sh`. Plain words are returned unchanged; anything else is
/// wrapped in single quotes with embedded `'` written as `'\''`.
pub fn quote(arg: &str) -> String {
    let is_plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:@,=".contains(c));
    if is_plain {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path_unchanged() {
        assert_eq!(
            quote("/home/u/.cargo/bin/claude-statusbar"),
            "/home/u/.cargo/bin/claude-statusbar"
        );
    }

    #[test]
    fn test_path_with_space() {
        assert_eq!(
            quote("/home/u/My Tools/claude-statusbar"),
            "'/home/u/My Tools/claude-statusbar'"
        );
    }

    #[test]
    fn test_embedded_single_quote() {
        assert_eq!(quote("/opt/it's/bin"), r"'/opt/it'\''s/bin'");
    }

    #[test]
    fn test_empty_and_metacharacters() {
        assert_eq!(quote(""), "''");
        assert_eq!(quote("/tmp/$HOME;rm"), "'/tmp/$HOME;rm'");
        assert_eq!(quote("/tmp/50%"), "'/tmp/50%'");
    }
}
