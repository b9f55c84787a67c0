/// Identity used when no deployment id is configured.
pub const DEFAULT_ANON_USER: &str = "anon-default-user";

/// Derives the stable pseudo-identity stamped into `recordedBy`.
///
/// This is an attribution label, not a credential.
pub fn anonymous_user_id(deployment_id: Option<&str>) -> String {
    match deployment_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("{id}-anon-user"),
        None => DEFAULT_ANON_USER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_from_deployment_id() {
        assert_eq!(anonymous_user_id(Some("garage-7")), "garage-7-anon-user");
        assert_eq!(anonymous_user_id(Some("  garage-7  ")), "garage-7-anon-user");
    }

    #[test]
    fn falls_back_without_deployment_id() {
        assert_eq!(anonymous_user_id(None), DEFAULT_ANON_USER);
        assert_eq!(anonymous_user_id(Some("")), DEFAULT_ANON_USER);
        assert_eq!(anonymous_user_id(Some("   ")), DEFAULT_ANON_USER);
    }
}
