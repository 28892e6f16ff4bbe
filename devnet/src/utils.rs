//! Naming and quoting helpers.

const ALPHANUMERIC: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Appends a random suffix to `prefix` so repeated runs never collide on container names.
pub fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!(8, ALPHANUMERIC))
}

/// Builds the service name for a participant's client, e.g. `el-0-geth`.
pub fn service_name(layer: &str, ordinal: usize, kind: impl std::fmt::Display) -> String {
    format!("{layer}-{ordinal}-{kind}")
}

/// Quotes `value` as a single POSIX shell word.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Placeholder for the service's own private IP inside launch arguments.
///
/// The IP is only known once the service runs, so [`shell_script`] resolves it with
/// `hostname -i` at startup.
pub const PRIVATE_IP: &str = "{{PRIVATE_IP}}";

/// Argument that chains two commands in [`shell_script`]. Emitted unquoted.
pub const AND_THEN: &str = "&&";

/// Joins `args` into one shell command line, quoting every argument and expanding
/// [`PRIVATE_IP`].
pub fn shell_script(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg == AND_THEN {
                return arg.clone();
            }
            arg.split(PRIVATE_IP).map(shell_quote).collect::<Vec<_>>().join("\"$(hostname -i)\"")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_suffix() {
        let name = unique_name("cl-1-teku");
        assert!(name.starts_with("cl-1-teku-"));
        assert_eq!(name.len(), "cl-1-teku-".len() + 8);
        assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_service_name() {
        assert_eq!(service_name("el", 3, "besu"), "el-3-besu");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("giant issue aisle"), "'giant issue aisle'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn test_shell_script_expands_private_ip() {
        let args = vec!["geth".to_string(), format!("--nat=extip:{PRIVATE_IP}"), "a b".to_string()];
        assert_eq!(shell_script(&args), "'geth' '--nat=extip:'\"$(hostname -i)\"'' 'a b'");
    }

    #[test]
    fn test_shell_script_chains_commands() {
        let args: Vec<String> =
            ["mkdir", "/data", AND_THEN, "exec", "node"].iter().map(|s| s.to_string()).collect();
        assert_eq!(shell_script(&args), "'mkdir' '/data' && 'exec' 'node'");
    }
}
