use crate::error_handling::types::ConfigError;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Runtime parameters of the proxy.
///
/// Every value can be given on the command line or through a
/// `TCPIP_PROXY_*` environment variable. The three target/listen values are
/// mandatory; a missing or unknown flag makes clap print the usage and exit
/// with a non-zero status.
///
/// # Fields Overview
///
/// - `host`, `port`: where every accepted connection is forwarded to
/// - `listen_port`: local port accepting inbound connections
/// - `bind_address`: local interface to listen on, all interfaces by default
/// - `log_dir`: directory receiving the trace and binary capture files
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "tcpip-proxy")]
#[command(version)]
#[command(about = "Transparent TCP proxy recording a trace and a binary capture of each connection")]
pub struct Config {
    /// Target host or address.
    #[arg(long, env = "TCPIP_PROXY_HOST")]
    pub host: String,

    /// Target port.
    #[arg(long, env = "TCPIP_PROXY_PORT")]
    pub port: u16,

    /// Local port to listen on.
    #[arg(long, alias = "listenPort", env = "TCPIP_PROXY_LISTEN_PORT")]
    pub listen_port: u16,

    /// Local address the listener binds to.
    #[arg(long, env = "TCPIP_PROXY_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Directory where log files are created.
    ///
    /// Must already exist, log file creation failures are fatal.
    #[arg(long, env = "TCPIP_PROXY_LOG_DIR", default_value = ".")]
    pub log_dir: PathBuf,
}

impl Config {
    /// Parses the process arguments, exiting with the usage text on error.
    pub fn from_args() -> Self {
        Config::parse()
    }

    /// Parses an explicit argument list, `args[0]` being the program name.
    pub fn try_from_iter<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Config::try_parse_from(args)
    }

    /// Checks what clap cannot: the log directory exists and the bind
    /// address is an IP literal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.log_dir.is_dir() {
            return Err(ConfigError::DirectoryDoesNotExist(format!(
                "{} is not a directory",
                self.log_dir.display()
            )));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// The `host:port` the proxy dials for every accepted connection.
    ///
    /// IPv6 literals are bracketed so the result stays parseable.
    pub fn target(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            ConfigError::InvalidAddress(format!("bad bind address {}", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.listen_port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        for key in [
            "TCPIP_PROXY_HOST",
            "TCPIP_PROXY_PORT",
            "TCPIP_PROXY_LISTEN_PORT",
            "TCPIP_PROXY_BIND_ADDRESS",
            "TCPIP_PROXY_LOG_DIR",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_args() {
        clear_env();
        let config = Config::try_from_iter([
            "tcpip-proxy",
            "--host",
            "example.org",
            "--port",
            "80",
            "--listen-port",
            "8080",
        ])
        .unwrap_or_else(|e| panic!("{}", e));

        assert_eq!(config.host, "example.org");
        assert_eq!(config.port, 80);
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.log_dir, PathBuf::from("."));
        assert_eq!(config.target(), "example.org:80");
    }

    #[test]
    #[serial]
    fn test_legacy_listen_port_spelling() {
        clear_env();
        let config = Config::try_from_iter([
            "tcpip-proxy",
            "--host",
            "localhost",
            "--port",
            "25",
            "--listenPort",
            "2525",
        ])
        .unwrap();

        assert_eq!(config.listen_port, 2525);
    }

    #[test]
    #[serial]
    fn test_missing_flag_is_rejected() {
        clear_env();
        let result = Config::try_from_iter(["tcpip-proxy", "--host", "localhost", "--port", "25"]);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_extra_flag_is_rejected() {
        clear_env();
        let result = Config::try_from_iter([
            "tcpip-proxy",
            "--host",
            "localhost",
            "--port",
            "25",
            "--listen-port",
            "2525",
            "--verbose",
        ]);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_values_from_environment() {
        clear_env();
        std::env::set_var("TCPIP_PROXY_HOST", "10.0.0.1");
        std::env::set_var("TCPIP_PROXY_PORT", "443");
        std::env::set_var("TCPIP_PROXY_LISTEN_PORT", "4443");

        let config = Config::try_from_iter(["tcpip-proxy"]);
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.target(), "10.0.0.1:443");
        assert_eq!(config.listen_port, 4443);
    }

    #[test]
    #[serial]
    fn test_ipv6_target_is_bracketed() {
        clear_env();
        let config = Config::try_from_iter([
            "tcpip-proxy",
            "--host",
            "::1",
            "--port",
            "22",
            "--listen-port",
            "2222",
        ])
        .unwrap();

        assert_eq!(config.target(), "[::1]:22");
    }

    #[test]
    #[serial]
    fn test_validate() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let mut config = Config::try_from_iter([
            "tcpip-proxy",
            "--host",
            "localhost",
            "--port",
            "25",
            "--listen-port",
            "2525",
        ])
        .unwrap();

        config.log_dir = dir.path().to_path_buf();
        assert!(config.validate().is_ok());

        config.bind_address = "not-an-ip".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAddress(_))
        ));

        config.bind_address = "127.0.0.1".to_string();
        config.log_dir = dir.path().join("missing");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DirectoryDoesNotExist(_))
        ));
    }
}
