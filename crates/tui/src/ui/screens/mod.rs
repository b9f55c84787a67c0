pub mod config;
pub mod expenses;
pub mod service;

/// Identity strings are long; the lists show the first few characters only,
/// enough to tell recorders apart.
fn short_user(user: &str) -> String {
    let mut chars = user.chars();
    let prefix: String = chars.by_ref().take(8).collect();
    if chars.next().is_some() {
        format!("{prefix}…")
    } else {
        prefix
    }
}
