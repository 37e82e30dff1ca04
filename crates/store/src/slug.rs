/// Derives a URL-safe identifier from a display name: ASCII lowercase,
/// non-alphanumeric runs collapsed to a single `-`, separators stripped from
/// both ends. An empty result falls back to the fixed token `lead`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        "lead".to_string()
    } else {
        slug
    }
}
