//! Shared helpers for the HTTP-level integration tests.
//!
//! Every test stands up its own mockito server on 127.0.0.1 and points the
//! clients at its port, so tests never share device state.

#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use mockito::{Matcher, Mock, Server};
use reqwest::Client;
use tunepoint_core::{BluOsClient, Config, SonosClient};

pub const AV_TRANSPORT: &str = "/MediaRenderer/AVTransport/Control";
pub const RENDERING_CONTROL: &str = "/MediaRenderer/RenderingControl/Control";
pub const CONTENT_DIRECTORY: &str = "/MediaServer/ContentDirectory/Control";

/// Loads a captured device response from `tests/fixtures`.
pub fn fixture(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name]
        .iter()
        .collect();
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {}", path.display(), e))
}

/// The port the mock server listens on.
pub fn port(server: &Server) -> u16 {
    let host = server.host_with_port();
    host.rsplit(':')
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(|| panic!("no port in {host}"))
}

pub fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client")
}

/// Core config whose device ports both point at `server`.
pub fn config_for(server: &Server) -> Config {
    let port = port(server);
    Config {
        bluos_port: port,
        sonos_port: port,
        ..Config::default()
    }
}

pub fn bluos_client(server: &Server) -> BluOsClient {
    BluOsClient::new(http_client(), Ipv4Addr::LOCALHOST, port(server))
}

pub fn sonos_client(server: &Server) -> SonosClient {
    SonosClient::new(http_client(), Ipv4Addr::LOCALHOST, &config_for(server))
}

/// Matches the `SOAPAction` header of a single UPnP action.
pub fn soap_action(action: &str) -> Matcher {
    Matcher::Regex(format!("#{}\"$", action))
}

/// Mocks one SOAP action on `endpoint`.
pub async fn soap_mock(
    server: &mut Server,
    endpoint: &str,
    action: &str,
    status: usize,
    body: &str,
) -> Mock {
    server
        .mock("POST", endpoint)
        .match_header("SOAPAction", soap_action(action))
        .with_status(status)
        .with_header("content-type", "text/xml; charset=\"utf-8\"")
        .with_body(body)
        .create_async()
        .await
}

/// Mocks a `Browse` of one content-directory container.
pub async fn browse_mock(server: &mut Server, object_id: &str, body: &str) -> Mock {
    server
        .mock("POST", CONTENT_DIRECTORY)
        .match_header("SOAPAction", soap_action("Browse"))
        .match_body(Matcher::Regex(format!("<ObjectID>{}</ObjectID>", object_id)))
        .with_status(200)
        .with_header("content-type", "text/xml; charset=\"utf-8\"")
        .with_body(body)
        .create_async()
        .await
}
