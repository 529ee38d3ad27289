/// Lowercase, hyphen separated form of a product name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("  Kemeja Batik -- Pria! "), "kemeja-batik-pria");
        assert_eq!(slugify("***"), "");
    }
}
