/// Receiver prefix of an explicit field access.
pub const THIS_DOT: &str = "this.";

/// Strips a leading `this.` from a variable reference.
pub fn normalize_name(name: &str) -> &str {
    name.strip_prefix(THIS_DOT).unwrap_or(name)
}

/// When both names are dotted and share everything up to their last `.`,
/// returns the two trailing segments. Otherwise returns the names unchanged.
///
/// `a.b.count` / `a.b.total` become `count` / `total`; `x.count` / `y.total`
/// are left alone.
pub fn strip_common_dotted_prefix<'a>(before: &'a str, after: &'a str) -> (&'a str, &'a str) {
    match (before.rfind('.'), after.rfind('.')) {
        (Some(i), Some(j)) if before[..=i] == after[..=j] => (&before[i + 1..], &after[j + 1..]),
        _ => (before, after),
    }
}
