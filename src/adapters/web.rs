//! Embedded web server manager.
//!
//! Routes are registered up front as `(method, path) → handler`; `start`
//! snapshots the table and serves it with warp on a background thread
//! with its own single-threaded tokio runtime. Handlers are plain
//! synchronous closures, so application code never touches async.
//!
//! ```text
//!   WebServer::start ──▶ thread "web" ──▶ tokio (current thread)
//!                                           └─ warp::serve(dispatch)
//!   WebServer::stop  ──▶ oneshot ──▶ graceful shutdown ──▶ join
//! ```

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::oneshot;
use warp::Filter;
use warp::http::{Method, StatusCode};
use warp::hyper::body::Bytes;

use crate::config::WebConfig;
use crate::device::Device;
use crate::error::{CommsError, Error, Result};

// ── Request / response ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: String,
    pub body: Vec<u8>,
}

impl Request {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// First value of `name` in the query string. No percent-decoding.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Response {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/plain; charset=utf-8".into(),
            body: body.into().into_bytes(),
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self {
            content_type: "text/html; charset=utf-8".into(),
            ..Self::text(body)
        }
    }

    /// Serialize `value` as JSON. Serialization failure yields a 500.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status: 200,
                content_type: "application/json".into(),
                body,
            },
            Err(e) => {
                warn!("Web: JSON encoding failed: {}", e);
                Self::text("internal error").with_status(500)
            }
        }
    }

    pub fn not_found() -> Self {
        Self::text("404 Not found").with_status(404)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

pub type Handler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

type RouteTable = HashMap<(String, String), Handler>;

// ── Server ────────────────────────────────────────────────────

struct Running {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    thread: JoinHandle<()>,
}

pub struct WebServer {
    host: IpAddr,
    port: u16,
    max_body_bytes: u64,
    routes: RouteTable,
    running: Option<Running>,
}

impl WebServer {
    pub fn new(cfg: &WebConfig) -> Self {
        Self {
            host: cfg.host,
            port: cfg.port,
            max_body_bytes: cfg.max_body_bytes,
            routes: HashMap::new(),
            running: None,
        }
    }

    /// Register `handler` for `method` (case-insensitive) and exact `path`.
    /// Routes added while running take effect on the next `start`.
    pub fn route<F>(&mut self, method: &str, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.routes
            .insert((method.to_ascii_uppercase(), path.to_owned()), Arc::new(handler));
        self
    }

    pub fn get<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.route("GET", path, handler)
    }

    pub fn post<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.route("POST", path, handler)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Bound address while running. Useful with port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.addr)
    }

    /// Bind and serve on a background thread. Returns once the socket is bound.
    pub fn start(&mut self) -> Result<SocketAddr> {
        if self.running.is_some() {
            return Err(CommsError::WebAlreadyRunning.into());
        }

        let addr = SocketAddr::new(self.host, self.port);
        let routes = Arc::new(self.routes.clone());
        let limit = self.max_body_bytes;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<SocketAddr>>();

        let thread = thread::Builder::new()
            .name("web".into())
            .spawn(move || serve(addr, routes, limit, shutdown_rx, ready_tx))
            .map_err(|e| {
                error!("Web: thread spawn failed: {}", e);
                Error::Init("web server thread")
            })?;

        let bound = match ready_rx.recv() {
            Ok(result) => result,
            Err(_) => Err(CommsError::WebBindFailed.into()),
        };
        let bound = match bound {
            Ok(bound) => bound,
            Err(e) => {
                if thread.join().is_err() {
                    warn!("Web: server thread panicked");
                }
                return Err(e);
            }
        };

        info!("Web: listening on http://{}", bound);
        self.running = Some(Running {
            addr: bound,
            shutdown: shutdown_tx,
            thread,
        });
        Ok(bound)
    }

    /// Graceful shutdown; waits for the server thread. No-op when stopped.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        // The receiver is gone only if the server already exited.
        let _ = running.shutdown.send(());
        if running.thread.join().is_err() {
            warn!("Web: server thread panicked");
        }
        info!("Web: stopped");
    }
}

impl Drop for WebServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Device for WebServer {
    fn name(&self) -> &str {
        "web"
    }

    fn release(&mut self) -> Result<()> {
        self.stop();
        Ok(())
    }
}

fn serve(
    addr: SocketAddr,
    routes: Arc<RouteTable>,
    limit: u64,
    shutdown: oneshot::Receiver<()>,
    ready: mpsc::Sender<Result<SocketAddr>>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Web: runtime init failed: {}", e);
            let _ = ready.send(Err(Error::Init("web server runtime")));
            return;
        }
    };

    rt.block_on(async move {
        let signal = async move {
            let _ = shutdown.await;
        };
        match warp::serve(dispatch(routes, limit)).try_bind_with_graceful_shutdown(addr, signal) {
            Ok((bound, server)) => {
                let _ = ready.send(Ok(bound));
                server.await;
            }
            Err(e) => {
                error!("Web: bind {} failed: {}", addr, e);
                let _ = ready.send(Err(CommsError::WebBindFailed.into()));
            }
        }
    });
}

/// Request body capped at `limit` bytes. Requests without `Content-Length`
/// get an empty body.
fn body(limit: u64) -> impl Filter<Extract = (Bytes,), Error = warp::Rejection> + Clone {
    let sized = warp::body::content_length_limit(limit).and(warp::body::bytes());
    let empty = warp::header::optional::<u64>("content-length").and_then(
        |len: Option<u64>| async move {
            match len {
                None => Ok(Bytes::new()),
                Some(_) => Err(warp::reject()),
            }
        },
    );
    sized.or(empty).unify()
}

fn dispatch(
    routes: Arc<RouteTable>,
    limit: u64,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone + Send + Sync + 'static {
    let query = warp::query::raw()
        .or(warp::any().map(String::new))
        .unify();

    warp::method()
        .and(warp::path::full())
        .and(query)
        .and(body(limit))
        .map(move |method: Method, path: warp::path::FullPath, query: String, body: Bytes| {
            let request = Request {
                method: method.as_str().to_owned(),
                path: path.as_str().to_owned(),
                query,
                body: body.to_vec(),
            };
            let response = match routes.get(&(request.method.clone(), request.path.clone())) {
                Some(handler) => handler(&request),
                None => Response::not_found(),
            };
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            warp::reply::with_status(
                warp::reply::with_header(response.body, "content-type", response.content_type),
                status,
            )
        })
}
