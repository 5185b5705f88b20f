use std::path::PathBuf;
use std::sync::LazyLock;

// $VAR, ${VAR} and %VAR%
static ENV_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_()]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)|%([A-Za-z_][A-Za-z0-9_()]*)%")
        .unwrap()
});

/// Expand environment variables in a user-supplied path string.
/// Unknown variables are left as written.
pub fn interpolate_env(value: &str) -> String {
    ENV_REGEX
        .replace_all(value, |caps: &regex::Captures| {
            let var_name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Expand a leading `~` and any environment variables into a path.
pub fn expand_path(value: &str) -> PathBuf {
    let value = interpolate_env(value.trim());

    if value == "~" {
        if let Some(home) = home_dir() {
            return home;
        }
    } else if let Some(rest) = value
        .strip_prefix("~/")
        .or_else(|| value.strip_prefix("~\\"))
    {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }

    PathBuf::from(value)
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}
