//! Text rendering utilities for human-friendly error messages.
//!
//! Helpers to format resolution paths, shorten type names and
//! build "did you mean?" hints.

/// Renders a resolution path as a readable string.
///
/// # Examples
/// ```
/// use sanad_support::rendering::render_path;
///
/// let path = vec!["UserService", "UserRepo", "UserService"];
/// assert_eq!(render_path(&path), "UserService → UserRepo → UserService");
/// ```
pub fn render_path(path: &[impl AsRef<str>]) -> String {
    let mut rendered = String::new();
    for (i, step) in path.iter().enumerate() {
        if i > 0 {
            rendered.push_str(" → ");
        }
        rendered.push_str(step.as_ref());
    }
    rendered
}

/// Shortens a fully qualified type name for display.
///
/// Every path prefix is dropped, generic arguments included.
///
/// ```
/// use sanad_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("app::greeting::English"), "English");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn app::greeting::Greeter>"),
///     "Arc<dyn Greeter>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut short = String::with_capacity(full_name.len());
    let mut segment_start = 0;

    for (i, ch) in full_name.char_indices() {
        match ch {
            ':' => segment_start = i + 1,
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                short.push_str(&full_name[segment_start..i]);
                short.push(ch);
                segment_start = i + 1;
            }
            _ => {}
        }
    }

    short.push_str(&full_name[segment_start..]);
    short
}

/// Picks up to `limit` names from `available` that look like `requested`.
///
/// Names are compared on their shortened form; a substring match ranks
/// above a shared prefix of at least three characters.
pub fn suggest_similar<'a>(requested: &str, available: &[&'a str], limit: usize) -> Vec<&'a str> {
    let wanted = shorten_type_name(requested).to_lowercase();

    let mut ranked: Vec<(usize, &'a str)> = available
        .iter()
        .filter_map(|&candidate| {
            let short = shorten_type_name(candidate).to_lowercase();
            if short == wanted {
                return None;
            }
            if short.contains(&wanted) || wanted.contains(&short) {
                return Some((usize::MAX, candidate));
            }
            let prefix = short
                .chars()
                .zip(wanted.chars())
                .take_while(|(a, b)| a == b)
                .count();
            (prefix >= 3).then_some((prefix, candidate))
        })
        .collect();

    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    ranked.dedup_by(|a, b| a.1 == b.1);
    ranked.into_iter().take(limit).map(|(_, name)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_cycle_path() {
        assert_eq!(render_path(&["A", "B", "A"]), "A → B → A");
    }

    #[test]
    fn render_empty_path() {
        let path: Vec<String> = Vec::new();
        assert_eq!(render_path(&path), "");
    }

    #[test]
    fn shorten_nested_generics() {
        assert_eq!(
            shorten_type_name("sanad_container::provider::ProviderRef<app::db::Pool>"),
            "ProviderRef<Pool>"
        );
        assert_eq!(
            shorten_type_name("core::option::Option<alloc::sync::Arc<app::Cache>>"),
            "Option<Arc<Cache>>"
        );
    }

    #[test]
    fn shorten_plain_name() {
        assert_eq!(shorten_type_name("u32"), "u32");
    }

    #[test]
    fn suggests_close_names_first() {
        let available = ["app::UserService", "app::UserRepository", "app::Mailer"];
        let suggestions = suggest_similar("app::UserServ", &available, 2);
        assert_eq!(suggestions.first(), Some(&"app::UserService"));
        assert!(!suggestions.contains(&"app::Mailer"));
    }

    #[test]
    fn does_not_suggest_the_requested_type() {
        let available = ["app::Mailer"];
        assert!(suggest_similar("other::Mailer", &available, 3).is_empty());
    }

    #[test]
    fn unrelated_names_are_not_suggested() {
        let available = ["app::Database"];
        assert!(suggest_similar("XyzAbc", &available, 3).is_empty());
    }
}
