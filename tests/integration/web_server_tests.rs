//! WebServer over a real loopback socket.

use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;

use rpi_app_framework::adapters::web::{Response, WebServer};
use rpi_app_framework::config::WebConfig;
use rpi_app_framework::error::{CommsError, Error};

fn loopback() -> WebServer {
    WebServer::new(&WebConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        ..WebConfig::default()
    })
}

fn http(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).unwrap();
    reply
}

fn get(addr: SocketAddr, path: &str) -> String {
    http(
        addr,
        &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
    )
}

#[test]
fn serves_registered_routes_and_404s_the_rest() {
    let mut server = loopback();
    server
        .get("/", |_| Response::html("<h1>ok</h1>"))
        .get("/echo", |req| {
            Response::text(req.query_param("msg").unwrap_or("none").to_owned())
        });
    let addr = server.start().unwrap();
    assert!(server.is_running());
    assert_eq!(server.local_addr(), Some(addr));

    let index = get(addr, "/");
    assert!(index.starts_with("HTTP/1.1 200"), "{index}");
    assert!(index.to_ascii_lowercase().contains("content-type: text/html"));
    assert!(index.ends_with("<h1>ok</h1>"));

    let echo = get(addr, "/echo?msg=hello");
    assert!(echo.ends_with("hello"), "{echo}");

    let missing = get(addr, "/nope");
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

    server.stop();
    assert!(!server.is_running());
    assert!(TcpStream::connect(addr).is_err());
}

#[test]
fn post_body_reaches_the_handler() {
    let mut server = loopback();
    server.post("/led", |req| match req.body_text().as_str() {
        "on" | "off" => Response::text("done"),
        _ => Response::text("bad state").with_status(400),
    });
    let addr = server.start().unwrap();

    let ok = http(
        addr,
        "POST /led HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2\r\nConnection: close\r\n\r\non",
    );
    assert!(ok.starts_with("HTTP/1.1 200"), "{ok}");

    let bad = http(
        addr,
        "POST /led HTTP/1.1\r\nHost: localhost\r\nContent-Length: 4\r\nConnection: close\r\n\r\nblue",
    );
    assert!(bad.starts_with("HTTP/1.1 400"), "{bad}");

    // Same path, wrong method.
    let wrong = get(addr, "/led");
    assert!(wrong.starts_with("HTTP/1.1 404"), "{wrong}");
}

#[test]
fn second_start_is_rejected() {
    let mut server = loopback();
    server.start().unwrap();
    assert_eq!(
        server.start(),
        Err(Error::Comms(CommsError::WebAlreadyRunning))
    );
}

#[test]
fn oversized_body_is_refused() {
    let mut server = WebServer::new(&WebConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        max_body_bytes: 8,
    });
    server.post("/upload", |req| Response::text(format!("{} bytes", req.body.len())));
    let addr = server.start().unwrap();

    let small = http(
        addr,
        "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: 4\r\nConnection: close\r\n\r\nabcd",
    );
    assert!(small.ends_with("4 bytes"), "{small}");

    let body = "x".repeat(64);
    let big = http(
        addr,
        &format!(
            "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    );
    assert!(big.starts_with("HTTP/1.1 413"), "{big}");

    // Body-less GETs carry no Content-Length and still get through.
    server.stop();
    server.get("/", |_| Response::text("up"));
    let addr = server.start().unwrap();
    assert!(get(addr, "/").ends_with("up"));
}

#[test]
fn port_in_use_fails_to_bind() {
    let mut first = loopback();
    let addr = first.start().unwrap();

    let mut second = WebServer::new(&WebConfig {
        host: addr.ip(),
        port: addr.port(),
        ..WebConfig::default()
    });
    assert_eq!(
        second.start(),
        Err(Error::Comms(CommsError::WebBindFailed))
    );
    assert!(!second.is_running());
}

#[test]
fn restart_after_stop() {
    let mut server = loopback();
    server.get("/ping", |_| Response::text("pong"));
    server.start().unwrap();
    server.stop();

    let addr = server.start().unwrap();
    assert!(get(addr, "/ping").ends_with("pong"));
}
