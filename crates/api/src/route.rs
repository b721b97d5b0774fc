//! Route building.

/// Joins route parts with `/`, dropping empty parts.
///
/// An optional part such as a deploy label simply disappears when empty,
/// so `route(["void", "snakes", "deploy", ""])` is `void/snakes/deploy`.
pub fn route<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref().trim_matches('/');
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(part);
    }
    out
}
