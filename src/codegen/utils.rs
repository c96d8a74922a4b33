//! Identifier transformation utilities for generated Go code
//!
//! Plugins derive file paths and package names from design names the same way
//! the primary generator does, so these helpers must stay in step with it.

/// Converts a string to snake_case.
///
/// Handles camelCase, PascalCase, kebab-case and space separated input.
///
/// # Examples
/// ```
/// use layergen::codegen::utils::to_snake_case;
///
/// assert_eq!(to_snake_case("findPetsByStatus"), "find_pets_by_status");
/// assert_eq!(to_snake_case("find-pets-by-status"), "find_pets_by_status");
/// assert_eq!(to_snake_case("calc svc"), "calc_svc");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_is_lowercase = false;

    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 && prev_is_lowercase {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
            prev_is_lowercase = false;
        } else if ch.is_alphanumeric() {
            result.push(ch);
            prev_is_lowercase = ch.is_lowercase() || ch.is_ascii_digit();
        } else if ch == '-' || ch == '_' || ch == ' ' || ch == '.' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            prev_is_lowercase = false;
        }
    }

    result.trim_matches('_').to_string()
}

/// Converts a string to an exported Go identifier (PascalCase).
///
/// # Examples
/// ```
/// use layergen::codegen::utils::goify;
///
/// assert_eq!(goify("calc"), "Calc");
/// assert_eq!(goify("find_pets-by status"), "FindPetsByStatus");
/// ```
pub fn goify(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

/// Converts a string to an unexported Go identifier (camelCase).
pub fn to_camel_case(s: &str) -> String {
    let pascal = goify(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Package directory name used by the primary generator for a design name
pub fn package_dir(name: &str) -> String {
    to_snake_case(&goify(name))
}

/// Join Go import path segments with `/`, ignoring empty segments
pub fn import_path(base: &str, segments: &[&str]) -> String {
    std::iter::once(base.trim_end_matches('/'))
        .chain(segments.iter().map(|s| s.trim_matches('/')))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Render `text` as a Go line comment block
pub fn comment(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                "//".to_string()
            } else {
                format!("// {}", line.trim_end())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
