//! Role classification.
//!
//! Role strings come from identity-provider metadata or the employee row and
//! are free text ("Engineering Manager", "designer, Director", ...). A caller
//! may review requests when any comma-separated token contains one of the
//! privileged phrases as whole words.

const MANAGER_ROLE_TOKENS: [&str; 4] = ["manager", "director", "admin", "people ops"];

/// Role data as delivered by the various sources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoleInput {
    #[default]
    Missing,
    One(String),
    Many(Vec<String>),
}

impl From<&str> for RoleInput {
    fn from(value: &str) -> Self {
        RoleInput::One(value.to_string())
    }
}

impl From<String> for RoleInput {
    fn from(value: String) -> Self {
        RoleInput::One(value)
    }
}

impl From<Option<&str>> for RoleInput {
    fn from(value: Option<&str>) -> Self {
        value.map_or(RoleInput::Missing, RoleInput::from)
    }
}

impl From<Option<String>> for RoleInput {
    fn from(value: Option<String>) -> Self {
        value.map_or(RoleInput::Missing, RoleInput::One)
    }
}

impl From<Vec<String>> for RoleInput {
    fn from(value: Vec<String>) -> Self {
        RoleInput::Many(value)
    }
}

impl From<&[&str]> for RoleInput {
    fn from(value: &[&str]) -> Self {
        RoleInput::Many(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Lower-cased, comma-split, trimmed, non-empty role tokens.
pub fn normalize_role_tokens(input: &RoleInput) -> Vec<String> {
    let raw: Vec<&str> = match input {
        RoleInput::Missing => Vec::new(),
        RoleInput::One(value) => vec![value.as_str()],
        RoleInput::Many(values) => values.iter().map(String::as_str).collect(),
    };

    raw.into_iter()
        .flat_map(|value| value.split(','))
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}

fn words(token: &str) -> Vec<&str> {
    token
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect()
}

fn token_grants_manager(token: &str) -> bool {
    let token_words = words(token);
    MANAGER_ROLE_TOKENS.iter().any(|phrase| {
        let phrase_words = words(phrase);
        token_words
            .windows(phrase_words.len())
            .any(|window| window == phrase_words.as_slice())
    })
}

/// True when the role input grants manager-level permission.
pub fn is_manager(input: impl Into<RoleInput>) -> bool {
    normalize_role_tokens(&input.into())
        .iter()
        .any(|token| token_grants_manager(token))
}
