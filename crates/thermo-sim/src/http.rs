//! HTTP delivery to the collector
//!
//! Requests are executed by a blocking `reqwest` client on a dedicated worker
//! thread. The async [`Transport::deliver`] only hands the request over and
//! waits for the answer on an embassy [`Signal`], so a slow or hung
//! collector stalls the reporter but never the sampling task sharing the
//! executor.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thermo_core::delivery::{DeliveryError, Transport};

use crate::error::AppError;

type DeliverySignal = Signal<CriticalSectionRawMutex, Result<(), DeliveryError>>;

struct DeliveryRequest {
    url: String,
    payload: String,
}

/// [`Transport`] that POSTs payloads as `application/json`
pub struct HttpTransport {
    requests: Sender<DeliveryRequest>,
    done: Arc<DeliverySignal>,
}

impl HttpTransport {
    /// Build the HTTP client and start the delivery worker thread
    pub fn spawn() -> Result<Self, AppError> {
        let client = Client::builder().build()?;
        let (requests, inbox) = mpsc::channel();
        let done = Arc::new(DeliverySignal::new());

        let worker_done = Arc::clone(&done);
        thread::Builder::new()
            .name("http-delivery".into())
            .spawn(move || run_worker(client, inbox, worker_done))
            .map_err(AppError::Worker)?;

        info!("HTTP delivery worker started");
        Ok(Self { requests, done })
    }
}

impl Transport for HttpTransport {
    async fn deliver(&mut self, url: &str, payload: &str) -> Result<(), DeliveryError> {
        self.done.reset();
        self.requests
            .send(DeliveryRequest {
                url: url.to_owned(),
                payload: payload.to_owned(),
            })
            .map_err(|_| DeliveryError::Transport("delivery worker has stopped".into()))?;

        self.done.wait().await
    }
}

fn run_worker(client: Client, inbox: Receiver<DeliveryRequest>, done: Arc<DeliverySignal>) {
    // Ends when the transport (and with it the sender) is dropped
    while let Ok(request) = inbox.recv() {
        let result = post(&client, &request.url, request.payload);
        done.signal(result);
    }
    debug!("HTTP delivery worker exiting");
}

/// POST one payload and classify the answer
pub fn post(client: &Client, url: &str, payload: String) -> Result<(), DeliveryError> {
    debug!("POST {} ({} bytes)", url, payload.len());
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .map_err(|e| DeliveryError::Transport(e.to_string()))?;

    match DeliveryError::from_status(response.status().as_u16()) {
        None => Ok(()),
        Some(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    /// Serve exactly one request with `status`, handing back what was received
    fn one_shot_server(status: &'static str) -> (String, thread::JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/temperature", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                head.push_str(&line);
            }

            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            )
            .unwrap();
            stream.flush().unwrap();

            (head, String::from_utf8(body).unwrap())
        });

        (url, handle)
    }

    #[test]
    fn test_post_success_sends_json() {
        let (url, server) = one_shot_server("200 OK");
        let client = Client::new();

        let result = post(&client, &url, "{\"min\":1.00}".into());
        let (head, body) = server.join().unwrap();

        assert_eq!(result, Ok(()));
        assert!(head.starts_with("POST /temperature HTTP/1.1"));
        assert!(head.to_ascii_lowercase().contains("content-type: application/json"));
        assert_eq!(body, "{\"min\":1.00}");
    }

    #[test]
    fn test_post_classifies_server_error() {
        let (url, server) = one_shot_server("500 Internal Server Error");
        let client = Client::new();

        let result = post(&client, &url, "{}".into());
        server.join().unwrap();

        assert_eq!(result, Err(DeliveryError::Server { status: 500 }));
    }

    #[test]
    fn test_post_classifies_client_error() {
        let (url, server) = one_shot_server("404 Not Found");
        let client = Client::new();

        let result = post(&client, &url, "{}".into());
        server.join().unwrap();

        assert_eq!(result, Err(DeliveryError::Rejected { status: 404 }));
    }

    #[test]
    fn test_post_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/temperature", listener.local_addr().unwrap());
        drop(listener);

        let result = post(&Client::new(), &url, "{}".into());
        assert!(matches!(result, Err(DeliveryError::Transport(_))));
    }

    #[test]
    fn test_transport_round_trip_through_worker() {
        let (url, server) = one_shot_server("503 Service Unavailable");
        let mut transport = HttpTransport::spawn().unwrap();

        let result = embassy_futures::block_on(transport.deliver(&url, "{\"avg\":0.00}"));
        let (_, body) = server.join().unwrap();

        assert_eq!(result, Err(DeliveryError::Server { status: 503 }));
        assert_eq!(body, "{\"avg\":0.00}");
    }
}
