//! Text renderings of values whose `Debug` output is ambiguous.

/// Renders bytes as a Rust byte-string literal, escaping anything non-printable.
pub fn bytes(value: &[u8]) -> String {
    let mut out = String::with_capacity(value.len() + 3);
    out.push_str("b\"");
    for byte in value {
        out.extend(std::ascii::escape_default(*byte).map(char::from));
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_render_as_byte_literals() {
        assert_eq!(bytes(b"\x5b"), "b\"[\"");
        assert_eq!(bytes(&[0xff, b'a']), "b\"\\xffa\"");
        assert_ne!(bytes("Z".as_bytes()), format!("{:?}", "Z"));
    }
}
