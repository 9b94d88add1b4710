// Configuration module entry point
// Loads layered configuration and derives the immutable runtime state

mod state;
mod types;

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, RouteHandler, RoutesConfig, ServerConfig,
    SiteConfig,
};

impl Config {
    /// Load configuration from the default "config.toml" next to the process
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; defaults reproduce the site's fixed behavior
    /// (all interfaces, port 8080, page routes for the shop site).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("AUTOWORKS"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Resolve the Base Directory all lookups are anchored to.
    ///
    /// Uses `site.root` when configured, otherwise the directory containing
    /// the running executable. The result is canonicalized once here; the
    /// containment check in the file handlers relies on that.
    pub fn resolve_site_root(&self) -> io::Result<PathBuf> {
        let root = match &self.site.root {
            Some(path) => PathBuf::from(path),
            None => std::env::current_exe()?
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        "executable has no parent directory",
                    )
                })?,
        };
        root.canonicalize().map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("site root '{}' is not accessible: {e}", root.display()),
            )
        })
    }
}
