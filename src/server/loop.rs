// Server loop module
// Accepts connections until a shutdown signal arrives

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Accept loop for the website server
///
/// Runs until `shutdown` is notified. Each accepted connection is served on
/// its own task; must run inside a `LocalSet`.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = shutdown.notified() => {
                logger::log_shutdown(active_connections.load(Ordering::SeqCst));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppState, Config};
    use crate::server::listener::create_listener;
    use std::fs as std_fs;
    use std::net::SocketAddr;
    use std::path::{Path, PathBuf};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn temp_site(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "autoworks-web-loop-{tag}-{}",
            std::process::id()
        ));
        let _ = std_fs::remove_dir_all(&root);
        std_fs::create_dir_all(root.join("admin")).unwrap();
        std_fs::write(root.join("index.html"), "<html>Home</html>").unwrap();
        std_fs::write(root.join("booking.html"), "<html>Booking</html>").unwrap();
        std_fs::write(root.join("admin/index.html"), "<html>Admin</html>").unwrap();
        root
    }

    fn test_state(root: &Path) -> Arc<AppState> {
        let mut cfg = Config::load_from("does-not-exist").unwrap();
        cfg.site.root = Some(root.to_string_lossy().into_owned());
        cfg.logging.access_log = false;
        let site_root = cfg.resolve_site_root().unwrap();
        Arc::new(AppState::new(&cfg, site_root))
    }

    /// Issue one raw HTTP/1.1 request and return (status, body)
    async fn request(addr: SocketAddr, method: &str, target: &str) -> (u16, Vec<u8>) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let req =
            format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(req.as_bytes()).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();

        let text = String::from_utf8_lossy(&raw);
        let status: u16 = text
            .split_whitespace()
            .nth(1)
            .expect("status line")
            .parse()
            .expect("numeric status");
        let body_start = text.find("\r\n\r\n").map_or(raw.len(), |i| i + 4);
        (status, raw[body_start..].to_vec())
    }

    #[tokio::test]
    async fn test_serves_the_site_end_to_end() {
        let root = temp_site("e2e");
        let state = test_state(&root);
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let connections = Arc::new(AtomicUsize::new(0));

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                tokio::task::spawn_local(start_server_loop(
                    listener,
                    state,
                    connections,
                    Arc::clone(&shutdown),
                ));

                // Homepage byte-for-byte
                let (status, body) = request(addr, "GET", "/").await;
                assert_eq!(status, 200);
                assert_eq!(body, b"<html>Home</html>");

                // Booking page
                let (status, body) = request(addr, "GET", "/booking.html").await;
                assert_eq!(status, 200);
                assert_eq!(body, b"<html>Booking</html>");

                // Both admin paths resolve to the same file
                let (status_a, body_a) = request(addr, "GET", "/admin/").await;
                let (status_b, body_b) = request(addr, "GET", "/admin/index.html").await;
                assert_eq!(status_a, 200);
                assert_eq!(status_b, 200);
                assert_eq!(body_a, body_b);

                // Missing file
                let (status, _) = request(addr, "GET", "/missing.html").await;
                assert_eq!(status, 404);

                // Traversal attempt never leaves the site root
                let (status, body) = request(addr, "GET", "/../secret.txt").await;
                assert_eq!(status, 404);
                assert_ne!(body, b"top secret");

                // HEAD carries headers but no body
                let (status, body) = request(addr, "HEAD", "/").await;
                assert_eq!(status, 200);
                assert!(body.is_empty());

                // Unsupported method
                let (status, _) = request(addr, "POST", "/").await;
                assert_eq!(status, 405);

                shutdown.notify_one();
            })
            .await;

        let _ = std_fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_traversal_cannot_reach_sibling_file() {
        let root = temp_site("contain");
        // A real file right next to the site root
        let secret = root.parent().unwrap().join(format!(
            "autoworks-web-loop-secret-{}.txt",
            std::process::id()
        ));
        std_fs::write(&secret, "top secret").unwrap();

        let state = test_state(&root);
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let connections = Arc::new(AtomicUsize::new(0));

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                tokio::task::spawn_local(start_server_loop(
                    listener,
                    state,
                    connections,
                    Arc::clone(&shutdown),
                ));

                let name = secret.file_name().unwrap().to_str().unwrap();
                let (status, body) = request(addr, "GET", &format!("/../{name}")).await;
                assert_eq!(status, 404);
                assert_ne!(body, b"top secret");

                shutdown.notify_one();
            })
            .await;

        let _ = std_fs::remove_file(&secret);
        let _ = std_fs::remove_dir_all(&root);
    }
}
