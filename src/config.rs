// Directive-based configuration file loader: `name value;` lines, with
// `listen` and `root` scoped inside a nested `http { server { ... } }`
// block. A missing file is not an error — it yields the built-in defaults.

use std::path::Path;

#[derive(Debug, Clone)]
pub struct Config {
    pub worker_processes: usize, // 0 means auto-detect
    pub worker_connections: usize,
    pub listen_host: String,
    pub listen_port: u16,
    pub error_log: String, // path, or "stderr"
    pub access_log: Option<String>,
    pub document_root: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_processes: 0,
            worker_connections: 1024,
            listen_host: "0.0.0.0".to_string(),
            listen_port: 8080,
            error_log: "stderr".to_string(),
            access_log: None,
            document_root: None,
        }
    }
}

fn strip_semicolon(s: &str) -> &str {
    s.trim().trim_end_matches(';').trim()
}

fn parse_worker_count(value: &str) -> usize {
    if value.eq_ignore_ascii_case("auto") {
        0
    } else {
        value.parse().unwrap_or(0)
    }
}

/// Parse a config file at `path`. Missing file is not an error: it
/// returns `Config::default()`. Malformed directive lines are skipped
/// rather than treated as a hard parse error, since the line-oriented
/// grammar has no recoverable parse point to report against.
pub fn load(path: impl AsRef<Path>) -> Config {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return Config::default(),
    };
    parse_str(&text)
}

pub fn parse_str(text: &str) -> Config {
    let mut config = Config::default();
    let mut in_http = false;
    let mut in_server = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line == "http {" {
            in_http = true;
            continue;
        }
        if line == "server {" && in_http {
            in_server = true;
            continue;
        }
        if line == "}" {
            if in_server {
                in_server = false;
            } else if in_http {
                in_http = false;
            }
            continue;
        }

        let Some((directive, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let value = strip_semicolon(rest);

        match directive {
            "worker_processes" => config.worker_processes = parse_worker_count(value),
            "worker_connections" => {
                if let Ok(n) = value.parse() {
                    config.worker_connections = n;
                }
            }
            "listen" if in_server => {
                if let Ok(port) = value.parse() {
                    config.listen_port = port;
                }
            }
            "error_log" => config.error_log = value.to_string(),
            "access_log" => config.access_log = Some(value.to_string()),
            "root" if in_server => config.document_root = Some(value.to_string()),
            _ => {}
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_worker_count_listen_and_root_inside_blocks() {
        let text = "worker_processes 2;\n# a comment\nhttp {\n    server {\n        listen 9090;\n        root /srv;\n    }\n}\n";
        let config = parse_str(text);
        assert_eq!(config.worker_processes, 2);
        assert_eq!(config.listen_port, 9090);
        assert_eq!(config.document_root.as_deref(), Some("/srv"));
    }

    #[test]
    fn listen_outside_server_block_is_ignored() {
        let text = "listen 9999;\n";
        let config = parse_str(text);
        assert_eq!(config.listen_port, 8080);
    }

    #[test]
    fn auto_worker_processes_means_zero() {
        let config = parse_str("worker_processes auto;\n");
        assert_eq!(config.worker_processes, 0);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load("/nonexistent/path/to/proton.conf");
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.worker_connections, 1024);
    }
}
