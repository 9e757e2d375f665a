//! Manager reference normalization.

/// Convert a directory name such as `cn=Jane_Doe,l=amer,dc=example,dc=com`
/// into `jane.doe@<email_domain>`.
///
/// Takes the first comma-separated component, keeps the value after `=`
/// (or the whole component when there is no `=`), lower-cases it and turns
/// underscores into dots. Empty input yields an empty string.
pub fn convert_manager_reference_to_email(reference: &str, email_domain: &str) -> String {
    let reference = reference.trim();
    if reference.is_empty() {
        return String::new();
    }

    let first = reference.split(',').next().unwrap_or_default();
    let name = match first.split_once('=') {
        Some((_, value)) => value,
        None => first,
    };
    let local = name.trim().to_lowercase().replace('_', ".");
    if local.is_empty() {
        return String::new();
    }
    format!("{local}@{}", email_domain.trim_start_matches('@'))
}
