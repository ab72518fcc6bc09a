use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::{TEST_TIMEOUT, bind_listener, config_for, run_async_test};
use crate::domain::Scheme;
use crate::driver::{HttpDriver, ProtocolDriver};
use crate::engine::{CycleBytes, Failure};
use crate::error::{AppError, AppResult};

const HEADER_END: &[u8] = b"\r\n\r\n";

/// Raw request as seen by the mock server.
struct SeenRequest {
    head: String,
    body: Vec<u8>,
}

/// Answers every request with `status` and `body`, reporting each request on
/// the returned channel.
fn spawn_http_server(
    listener: TcpListener,
    status: &'static str,
    body: &'static str,
) -> mpsc::UnboundedReceiver<SeenRequest> {
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let seen_tx = seen_tx.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(stream, status, body).await {
                    drop(seen_tx.send(request));
                }
            });
        }
    });
    seen_rx
}

async fn read_request(
    mut stream: TcpStream,
    status: &'static str,
    body: &'static str,
) -> Option<SeenRequest> {
    let mut raw = Vec::with_capacity(1024);
    let mut chunk = [0_u8; 1024];
    let head_len = loop {
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        raw.extend_from_slice(chunk.get(..read)?);
        if let Some(position) = raw.windows(HEADER_END.len()).position(|bytes| bytes == HEADER_END) {
            break position.saturating_add(HEADER_END.len());
        }
    };
    let head = String::from_utf8_lossy(raw.get(..head_len)?).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut request_body = raw.get(head_len..)?.to_vec();
    while request_body.len() < content_length {
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        request_body.extend_from_slice(chunk.get(..read)?);
    }

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await.ok()?;
    Some(SeenRequest {
        head,
        body: request_body,
    })
}

async fn next_request(seen_rx: &mut mpsc::UnboundedReceiver<SeenRequest>) -> AppResult<SeenRequest> {
    timeout(TEST_TIMEOUT, seen_rx.recv())
        .await
        .map_err(|_err| AppError::validation("Timed out waiting for HTTP request"))?
        .ok_or_else(|| AppError::validation("HTTP server stopped"))
}

#[test]
fn get_without_data_counts_response_body() -> AppResult<()> {
    run_async_test(async {
        let Some((listener, addr)) = bind_listener("http").await? else {
            return Ok(());
        };
        let mut seen_rx = spawn_http_server(listener, "200 OK", "hello");

        let mut driver = HttpDriver::new(Arc::new(config_for(Scheme::Http, addr)?))?;
        driver
            .connect()
            .await
            .map_err(|failure| AppError::validation(format!("Connect failed: {}", failure)))?;
        let bytes = driver
            .cycle()
            .await
            .map_err(|failure| AppError::validation(format!("Cycle failed: {}", failure)))?;
        if bytes != CycleBytes::new(0, 5) {
            return Err(AppError::validation(format!("Unexpected bytes {:?}", bytes)));
        }

        let request = next_request(&mut seen_rx).await?;
        if !request.head.starts_with("GET / HTTP/1.1") {
            return Err(AppError::validation(format!(
                "Expected a GET request, got {}",
                request.head
            )));
        }
        let host_line = format!("host: {}", addr);
        if !request.head.to_ascii_lowercase().contains(&host_line) {
            return Err(AppError::validation(format!(
                "Expected {} in {}",
                host_line, request.head
            )));
        }
        Ok(())
    })
}

#[test]
fn data_is_posted_as_form_body() -> AppResult<()> {
    run_async_test(async {
        let Some((listener, addr)) = bind_listener("http").await? else {
            return Ok(());
        };
        let mut seen_rx = spawn_http_server(listener, "200 OK", "ok");

        let config = config_for(Scheme::Http, addr)?.with_payload(b"name=bench".to_vec());
        let mut driver = HttpDriver::new(Arc::new(config))?;
        let bytes = driver
            .cycle()
            .await
            .map_err(|failure| AppError::validation(format!("Cycle failed: {}", failure)))?;
        if bytes != CycleBytes::new(10, 2) {
            return Err(AppError::validation(format!("Unexpected bytes {:?}", bytes)));
        }

        let request = next_request(&mut seen_rx).await?;
        let head = request.head.to_ascii_lowercase();
        if !head.starts_with("post / http/1.1")
            || !head.contains("content-type: application/x-www-form-urlencoded")
        {
            return Err(AppError::validation(format!(
                "Unexpected request head {}",
                request.head
            )));
        }
        if request.body != b"name=bench" {
            return Err(AppError::validation("Unexpected request body"));
        }
        Ok(())
    })
}

#[test]
fn not_found_reports_the_url() -> AppResult<()> {
    run_async_test(async {
        let Some((listener, addr)) = bind_listener("http").await? else {
            return Ok(());
        };
        drop(spawn_http_server(listener, "404 Not Found", "missing"));

        let config = config_for(Scheme::Http, addr)?;
        let expected_url = config.target.url();
        let mut driver = HttpDriver::new(Arc::new(config))?;
        let result = driver.cycle().await;
        if result == Err(Failure::NotFound { url: expected_url }) {
            return Ok(());
        }
        Err(AppError::validation(format!("Expected 404 failure, got {:?}", result)))
    })
}

#[test]
fn other_error_statuses_still_count_as_responses() -> AppResult<()> {
    run_async_test(async {
        let Some((listener, addr)) = bind_listener("http").await? else {
            return Ok(());
        };
        drop(spawn_http_server(listener, "500 Internal Server Error", "boom"));

        let mut driver = HttpDriver::new(Arc::new(config_for(Scheme::Http, addr)?))?;
        let bytes = driver
            .cycle()
            .await
            .map_err(|failure| AppError::validation(format!("Cycle failed: {}", failure)))?;
        if bytes.received != 4 {
            return Err(AppError::validation(format!("Unexpected bytes {:?}", bytes)));
        }
        Ok(())
    })
}

#[test]
fn closed_port_is_connection_refused() -> AppResult<()> {
    run_async_test(async {
        let Some((listener, addr)) = bind_listener("http").await? else {
            return Ok(());
        };
        drop(listener);

        let mut driver = HttpDriver::new(Arc::new(config_for(Scheme::Http, addr)?))?;
        let result = driver.cycle().await;
        if matches!(result, Err(Failure::ConnectRefused { .. })) {
            return Ok(());
        }
        Err(AppError::validation(format!(
            "Expected connection refused, got {:?}",
            result
        )))
    })
}
