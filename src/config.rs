//!
//! userdir server configuration
//! -----------------------------
//! Settings come from environment variables, overridden by command-line flags.
//! Every malformed value is reported at once, in the same `{field:kind}` form
//! the request decoders use.
//!
//! | flag                | environment               | default   |
//! |---------------------|---------------------------|-----------|
//! | `--http-port N`     | `USERDIR_HTTP_PORT`       | 7878      |
//! | `--bind-host HOST`  | `USERDIR_BIND_HOST`       | 0.0.0.0   |
//! | `--jwt-secret S`    | `USERDIR_JWT_SECRET`      | (none)    |
//! | `--jwt-secret-file` | `USERDIR_JWT_SECRET_FILE` | (none)    |
//!
//! The signing secret must come from exactly one of the value or file sources.
//! When the secret is the only problem its typed error is returned
//! (`SecretNotConfigured`, `SecretAlreadySet`, unreadable file); otherwise
//! all problems, the secret's included, come back as one violation list.

use std::path::PathBuf;

use crate::decode::{ViolationKind, Violations};
use crate::identity::{SigningSecret, TokenError};

pub const DEFAULT_HTTP_PORT: u16 = 7878;
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

pub const ENV_HTTP_PORT: &str = "USERDIR_HTTP_PORT";
pub const ENV_BIND_HOST: &str = "USERDIR_BIND_HOST";
pub const ENV_JWT_SECRET: &str = "USERDIR_JWT_SECRET";
pub const ENV_JWT_SECRET_FILE: &str = "USERDIR_JWT_SECRET_FILE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(Violations),
    #[error(transparent)]
    Secret(#[from] TokenError),
    #[error("cannot read secret file {path}: {source}")]
    SecretFile { path: PathBuf, source: std::io::Error },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub bind_host: String,
    pub secret: SigningSecret,
}

/// A command-line flag lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arg<'a> {
    Absent,
    /// Flag given with nothing (or another flag) after it.
    Missing,
    Value(&'a str),
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Arg<'a> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            return match args.get(i + 1) {
                Some(next) if !next.starts_with("--") => Arg::Value(next.as_str()),
                _ => Arg::Missing,
            };
        }
        i += 1;
    }
    Arg::Absent
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Flag value, else environment value. A flag without a value records `{field:empty}`.
fn lookup<F>(args: &[String], flag: &str, env: &F, var: &str, field: &'static str, v: &mut Violations) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    match arg_value(args, flag) {
        Arg::Value(s) => Some(s.to_string()),
        Arg::Missing => {
            v.push(field, ViolationKind::Empty);
            None
        }
        Arg::Absent => env(var),
    }
}

fn parse_port(raw: &str, v: &mut Violations) -> Option<u16> {
    match raw.trim().parse::<u16>() {
        Ok(p) if p != 0 => Some(p),
        _ => {
            v.push("http-port", ViolationKind::Invalid);
            None
        }
    }
}

impl Config {
    /// Build from `args` (flags) over `env` (variable lookup). Nothing here reads
    /// the process environment directly, so tests can supply both.
    pub fn from_sources<F>(args: &[String], env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut v = Violations::new();

        let http_port = lookup(args, "--http-port", &env, ENV_HTTP_PORT, "http-port", &mut v)
            .and_then(|raw| parse_port(&raw, &mut v))
            .unwrap_or(DEFAULT_HTTP_PORT);

        let bind_host = match lookup(args, "--bind-host", &env, ENV_BIND_HOST, "bind-host", &mut v) {
            Some(raw) => raw.trim().to_string(),
            None => DEFAULT_BIND_HOST.to_string(),
        };
        if bind_host.is_empty() {
            v.push("bind-host", ViolationKind::Empty);
        }

        let inline = lookup(args, "--jwt-secret", &env, ENV_JWT_SECRET, "jwt-secret", &mut v);
        let file = lookup(args, "--jwt-secret-file", &env, ENV_JWT_SECRET_FILE, "jwt-secret-file", &mut v).map(PathBuf::from);
        let other_problems = v.len();

        // on failure: the field to report and the typed error for when it stands alone
        let resolved: Result<SigningSecret, (&'static str, ViolationKind, ConfigError)> = match (inline, file) {
            (Some(_), Some(_)) => Err(("jwt-secret", ViolationKind::Invalid, TokenError::SecretAlreadySet.into())),
            (Some(s), None) => SigningSecret::new(s).map_err(|e| ("jwt-secret", ViolationKind::Empty, e.into())),
            (None, Some(path)) => match std::fs::read_to_string(&path) {
                Ok(raw) => SigningSecret::new(raw.trim_end_matches(['\r', '\n']))
                    .map_err(|e| ("jwt-secret-file", ViolationKind::Empty, e.into())),
                Err(source) => Err(("jwt-secret-file", ViolationKind::Invalid, ConfigError::SecretFile { path, source })),
            },
            (None, None) => Err(("jwt-secret", ViolationKind::Empty, TokenError::SecretNotConfigured.into())),
        };

        match resolved {
            Ok(secret) if v.is_empty() => Ok(Config { http_port, bind_host, secret }),
            Ok(_) => Err(ConfigError::Invalid(v)),
            Err((_, _, err)) if other_problems == 0 => Err(err),
            Err((field, kind, _)) => {
                v.push(field, kind);
                Err(ConfigError::Invalid(v))
            }
        }
    }

    /// Process arguments over the process environment.
    pub fn from_env_and_args(args: &[String]) -> Result<Self, ConfigError> {
        Self::from_sources(args, |name| std::env::var(name).ok())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.http_port)
    }
}
