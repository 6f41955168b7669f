//! Descriptions of the files the agent bakery deploys along with the agent: the agent plugins
//! themselves and their configuration files.
//!
//! Nothing here touches the filesystem. The descriptors are plain data handed to whatever
//! packages the agent.
//!
//! ```rust
//! # use mk_plugins::bakery::{self, Artifact, SesamBakeryConfig};
//! let files = bakery::sesam_backup_state_files(&SesamBakeryConfig::default());
//! let Artifact::Config(config) = &files[1] else { unreachable!() };
//! assert_eq!(config.lines[0], "[SESAM]");
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const HEADER: &str = "# Created by the agent bakery.\n\
                      # This file has been created automatically and will be overwritten.";

pub const DEFAULT_USERNAME: &str = "monitoring";
pub const DEFAULT_SESAM_URL: &str = "https://localhost:11401";
pub const DEFAULT_INTERVAL: u64 = 3600;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    Windows,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Artifact {
    Plugin(PluginFile),
    Config(ConfigFile),
}

/// An agent plugin, optionally run asynchronously every `interval` seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct PluginFile {
    pub base_os: Os,
    pub source: PathBuf,
    pub interval: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfigFile {
    pub base_os: Os,
    pub target: PathBuf,
    pub lines: Vec<String>,
    pub include_header: bool,
}

impl ConfigFile {
    /// The file contents, one line per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.include_header {
            out.push_str(HEADER);
            out.push('\n');
        }
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default = "default_username")]
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(password: &str) -> Self {
        Credentials {
            username: default_username(),
            password: password.to_owned(),
        }
    }
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_owned()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SesamBakeryConfig {
    pub interval: Option<u64>,
    pub credentials: Option<Credentials>,
    pub sesam_url: Option<String>,
}

impl Default for SesamBakeryConfig {
    fn default() -> Self {
        SesamBakeryConfig {
            interval: Some(DEFAULT_INTERVAL),
            credentials: None,
            sesam_url: Some(DEFAULT_SESAM_URL.to_owned()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvirtBakeryConfig {
    pub interval: Option<u64>,
    pub credentials: Option<Credentials>,
    pub engine_fqdn: Option<String>,
    pub engine_url: Option<String>,
    pub generate_piggyback: Option<bool>,
}

impl Default for OvirtBakeryConfig {
    fn default() -> Self {
        OvirtBakeryConfig {
            interval: Some(DEFAULT_INTERVAL),
            credentials: None,
            engine_fqdn: None,
            engine_url: None,
            generate_piggyback: None,
        }
    }
}

/// Config lines are written verbatim, so values must not break out of their line.
fn sanitize(s: &str) -> String {
    ["\r\n", "\n", "\r"]
        .iter()
        .fold(s.to_string(), |acc, c| acc.replace(c, " "))
}

fn push_setting(lines: &mut Vec<String>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        lines.push(format!("{}={}", key, sanitize(value)));
    }
}

fn push_credentials(lines: &mut Vec<String>, credentials: Option<&Credentials>) {
    if let Some(credentials) = credentials {
        push_setting(lines, "username", Some(&credentials.username));
        push_setting(lines, "password", Some(&credentials.password));
    }
}

pub fn sesam_backup_state_files(conf: &SesamBakeryConfig) -> Vec<Artifact> {
    let mut lines = vec!["[SESAM]".to_owned()];
    push_credentials(&mut lines, conf.credentials.as_ref());
    push_setting(&mut lines, "sesam_url", conf.sesam_url.as_deref());

    vec![
        Artifact::Plugin(PluginFile {
            base_os: Os::Linux,
            source: PathBuf::from("sesam_backup_state.py"),
            interval: conf.interval,
        }),
        Artifact::Config(ConfigFile {
            base_os: Os::Linux,
            target: PathBuf::from("sesam_backup_state.cfg"),
            lines,
            include_header: true,
        }),
    ]
}

pub fn ovirt_plugin_files(conf: &OvirtBakeryConfig) -> Vec<Artifact> {
    let mut lines = vec!["[OVIRT]".to_owned()];
    push_credentials(&mut lines, conf.credentials.as_ref());
    push_setting(&mut lines, "engine_fqdn", conf.engine_fqdn.as_deref());
    push_setting(&mut lines, "engine_url", conf.engine_url.as_deref());
    if let Some(generate_piggyback) = conf.generate_piggyback {
        lines.push(format!("generate_piggyback={}", generate_piggyback));
    }

    vec![
        Artifact::Plugin(PluginFile {
            base_os: Os::Linux,
            source: PathBuf::from("ovirt_plugin.py"),
            interval: conf.interval,
        }),
        Artifact::Config(ConfigFile {
            base_os: Os::Linux,
            target: PathBuf::from("ovirt_plugin.cfg"),
            lines,
            include_header: true,
        }),
    ]
}

pub fn mk_puppet_files() -> Vec<Artifact> {
    vec![
        Artifact::Plugin(PluginFile {
            base_os: Os::Linux,
            source: PathBuf::from("mk_puppet"),
            interval: None,
        }),
        Artifact::Plugin(PluginFile {
            base_os: Os::Windows,
            source: PathBuf::from("mk_puppet.ps1"),
            interval: None,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(artifacts: &[Artifact]) -> &ConfigFile {
        artifacts
            .iter()
            .find_map(|a| match a {
                Artifact::Config(c) => Some(c),
                Artifact::Plugin(_) => None,
            })
            .unwrap()
    }

    #[test]
    fn test_sesam() {
        let conf = SesamBakeryConfig {
            credentials: Some(Credentials::new("secret")),
            ..Default::default()
        };
        let files = sesam_backup_state_files(&conf);
        assert_eq!(
            files[0],
            Artifact::Plugin(PluginFile {
                base_os: Os::Linux,
                source: PathBuf::from("sesam_backup_state.py"),
                interval: Some(3600),
            })
        );

        let cfg = config(&files);
        assert_eq!(cfg.target, PathBuf::from("sesam_backup_state.cfg"));
        assert_eq!(
            cfg.lines,
            vec![
                "[SESAM]",
                "username=monitoring",
                "password=secret",
                "sesam_url=https://localhost:11401"
            ]
        );
        assert!(cfg.render().starts_with("# Created by the agent bakery."));
        assert!(cfg.render().ends_with("sesam_url=https://localhost:11401\n"));
    }

    #[test]
    fn test_ovirt() {
        let conf: OvirtBakeryConfig = serde_json::from_str(
            r#"{"credentials": {"username": "admin@internal", "password": "pw"},
                "engine_fqdn": "engine.example.com", "generate_piggyback": false}"#,
        )
        .unwrap();
        let files = ovirt_plugin_files(&conf);
        assert_eq!(
            config(&files).lines,
            vec![
                "[OVIRT]",
                "username=admin@internal",
                "password=pw",
                "engine_fqdn=engine.example.com",
                "generate_piggyback=false"
            ]
        );
    }

    #[test]
    fn test_values_stay_on_their_line() {
        let conf = OvirtBakeryConfig {
            engine_url: Some("https://engine\nusername=root".to_owned()),
            ..Default::default()
        };
        let cfg = config(&ovirt_plugin_files(&conf)).clone();
        assert_eq!(cfg.lines[1], "engine_url=https://engine username=root");

        let cfg = ConfigFile {
            include_header: false,
            ..cfg
        };
        assert_eq!(cfg.render(), "[OVIRT]\nengine_url=https://engine username=root\n");
    }

    #[test]
    fn test_mk_puppet() {
        let files = mk_puppet_files();
        assert_eq!(files.len(), 2);
        assert!(matches!(
            &files[1],
            Artifact::Plugin(PluginFile { base_os: Os::Windows, .. })
        ));
    }
}
