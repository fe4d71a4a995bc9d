use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use bat_remote::{MainThreadExecutor, RemoteConfig, RemoteError, RemoteServer, ServerOptions};
use bat_scene::camera::RenderSettings;
use bat_scene::Scene;

fn options() -> ServerOptions {
    ServerOptions {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        request_timeout: Duration::from_millis(200),
    }
}

fn post(addr: SocketAddr, body: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    write!(
        stream,
        "POST / HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    let mut response = String::new();
    stream.read_to_string(&mut response)?;
    Ok(response)
}

#[test]
fn server_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let executor = MainThreadExecutor::new(Scene::new(RenderSettings::new(32, 24)));
    let config = RemoteConfig {
        http_enable: true,
        http_port: 47311,
    };
    let mut server = RemoteServer::new(executor.handle(), config, options());
    assert!(!server.is_running());

    server.start()?;
    let addr = server.local_addr().ok_or("server is not running")?;
    assert_eq!(addr.port(), 47311);

    // starting twice is a no-op
    server.start()?;
    assert_eq!(server.local_addr(), Some(addr));

    let response = post(addr, "{}")?;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("The request doesn't contain any valid keys."));

    server.stop()?;
    assert!(!server.is_running());
    server.stop()?;

    // the port is released and can be bound again
    server.start()?;
    assert!(post(addr, "[]")?.contains("The request body must be a JSON object."));

    // a new port restarts the server
    server.apply_config(RemoteConfig {
        http_enable: true,
        http_port: 47312,
    })?;
    assert_eq!(server.local_addr().map(|a| a.port()), Some(47312));
    assert!(post(server.local_addr().ok_or("not running")?, "{}").is_ok());

    // an invalid port is rejected without touching the server
    assert!(matches!(
        server.apply_config(RemoteConfig {
            http_enable: true,
            http_port: 80,
        }),
        Err(RemoteError::InvalidPort(80))
    ));
    assert_eq!(server.config().http_port, 47312);
    assert!(server.is_running());

    server.apply_config(RemoteConfig {
        http_enable: false,
        http_port: 47312,
    })?;
    assert!(!server.is_running());
    Ok(())
}

#[test]
fn port_in_use() -> Result<(), Box<dyn std::error::Error>> {
    let _listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 47313))?;

    let executor = MainThreadExecutor::new(Scene::new(RenderSettings::new(32, 24)));
    let config = RemoteConfig {
        http_enable: true,
        http_port: 47313,
    };
    let mut server = RemoteServer::new(executor.handle(), config, options());
    assert!(matches!(server.start(), Err(RemoteError::Bind { .. })));
    assert!(!server.is_running());
    Ok(())
}

#[test]
fn disabled_server_does_not_start() -> Result<(), Box<dyn std::error::Error>> {
    let executor = MainThreadExecutor::new(Scene::new(RenderSettings::new(32, 24)));
    let config = RemoteConfig {
        http_enable: false,
        http_port: 47314,
    };
    let mut server = RemoteServer::new(executor.handle(), config, options());

    server.start()?;
    assert!(!server.is_running());
    server.restart()?;
    assert_eq!(server.local_addr(), None);

    // enabling through the preferences starts it
    server.apply_config(RemoteConfig {
        http_enable: true,
        http_port: 47314,
    })?;
    assert!(server.is_running());
    server.stop()?;
    Ok(())
}
