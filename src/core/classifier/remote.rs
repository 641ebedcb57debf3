//! Optional remote second opinion for uploads that pass the local checks.

use crate::core::input::ImageBytes;
use crate::error::ClassifyError;
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A classifier that can confirm whether an image shows a vehicle.
///
/// Implementations may block; callers bound them with a timeout.
pub trait ImageClassifierDelegate: Send + Sync {
    fn is_vehicle(&self, image: &ImageBytes) -> Result<bool, ClassifyError>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "remote"
    }
}

/// Run the delegate on a worker thread and wait at most `timeout`.
///
/// A late answer is discarded; the worker finishes on its own.
pub(crate) fn ask_with_timeout(
    delegate: &Arc<dyn ImageClassifierDelegate>,
    image: &ImageBytes,
    timeout: Duration,
) -> Result<bool, ClassifyError> {
    let (tx, rx) = bounded(1);
    let delegate = Arc::clone(delegate);
    let image = image.clone();

    thread::Builder::new()
        .name("remote-classifier".to_string())
        .spawn(move || {
            let _ = tx.send(delegate.is_vehicle(&image));
        })
        .map_err(|e| ClassifyError::RemoteClassifierUnavailable {
            reason: format!("failed to spawn worker: {}", e),
        })?;

    match rx.recv_timeout(timeout) {
        Ok(answer) => answer,
        Err(RecvTimeoutError::Timeout) => Err(ClassifyError::RemoteClassifierUnavailable {
            reason: format!("timed out after {} ms", timeout.as_millis()),
        }),
        Err(RecvTimeoutError::Disconnected) => Err(ClassifyError::RemoteClassifierUnavailable {
            reason: "worker exited without an answer".to_string(),
        }),
    }
}

#[cfg(feature = "remote")]
pub use http::HttpClassifierDelegate;

#[cfg(feature = "remote")]
mod http {
    use super::ImageClassifierDelegate;
    use crate::core::input::ImageBytes;
    use crate::error::ClassifyError;
    use reqwest::blocking::Client;
    use reqwest::header::CONTENT_TYPE;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Deserialize)]
    struct RemoteVerdict {
        is_vehicle: bool,
    }

    /// POSTs the raw image to an HTTP endpoint answering `{"is_vehicle": bool}`
    #[derive(Debug, Clone)]
    pub struct HttpClassifierDelegate {
        client: Client,
        endpoint: String,
    }

    impl HttpClassifierDelegate {
        pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClassifyError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| unavailable(format!("failed to build HTTP client: {}", e)))?;

            Ok(Self {
                client,
                endpoint: endpoint.into(),
            })
        }

        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }
    }

    impl ImageClassifierDelegate for HttpClassifierDelegate {
        fn is_vehicle(&self, image: &ImageBytes) -> Result<bool, ClassifyError> {
            let response = self
                .client
                .post(&self.endpoint)
                .header(CONTENT_TYPE, image.mime_type())
                .body(image.as_bytes().to_vec())
                .send()
                .map_err(|e| unavailable(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(unavailable(format!("endpoint returned {}", status)));
            }

            let verdict: RemoteVerdict = response
                .json()
                .map_err(|e| unavailable(format!("malformed response: {}", e)))?;
            Ok(verdict.is_vehicle)
        }

        fn name(&self) -> &str {
            "http"
        }
    }

    fn unavailable(reason: String) -> ClassifyError {
        ClassifyError::RemoteClassifierUnavailable { reason }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::io::{Read, Write};
        use std::net::TcpListener;
        use std::thread;

        /// Serve one canned HTTP response and return the request head
        fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let url = format!("http://{}/classify", listener.local_addr().unwrap());

            let handle = thread::spawn(move || {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = Vec::new();
                let mut buffer = [0u8; 4096];
                // Read until the head and the declared body have arrived
                loop {
                    let n = stream.read(&mut buffer).unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buffer[..n]);
                    let text = String::from_utf8_lossy(&request).to_string();
                    if let Some(head_end) = text.find("\r\n\r\n") {
                        let length = text
                            .lines()
                            .find_map(|l| {
                                l.to_ascii_lowercase()
                                    .strip_prefix("content-length:")
                                    .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                            })
                            .unwrap_or(0);
                        if request.len() >= head_end + 4 + length {
                            break;
                        }
                    }
                }

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
                let text = String::from_utf8_lossy(&request).to_string();
                text.split("\r\n\r\n").next().unwrap_or_default().to_string()
            });

            (url, handle)
        }

        fn payload() -> ImageBytes {
            ImageBytes::new(vec![1u8, 2, 3, 4], "image/jpeg")
        }

        #[test]
        fn posts_bytes_and_reads_verdict() {
            let (url, server) = serve_once("200 OK", r#"{"is_vehicle": true}"#);
            let delegate = HttpClassifierDelegate::new(url, Duration::from_secs(5)).unwrap();

            assert!(delegate.is_vehicle(&payload()).unwrap());

            let head = server.join().unwrap().to_ascii_lowercase();
            assert!(head.starts_with("post /classify"));
            assert!(head.contains("content-type: image/jpeg"));
        }

        #[test]
        fn negative_verdict() {
            let (url, server) = serve_once("200 OK", r#"{"is_vehicle": false}"#);
            let delegate = HttpClassifierDelegate::new(url, Duration::from_secs(5)).unwrap();
            assert!(!delegate.is_vehicle(&payload()).unwrap());
            server.join().unwrap();
        }

        #[test]
        fn server_error_is_unavailable() {
            let (url, server) = serve_once("503 Service Unavailable", "{}");
            let delegate = HttpClassifierDelegate::new(url, Duration::from_secs(5)).unwrap();
            let err = delegate.is_vehicle(&payload()).unwrap_err();
            assert!(err.to_string().contains("503"));
            server.join().unwrap();
        }

        #[test]
        fn malformed_body_is_unavailable() {
            let (url, server) = serve_once("200 OK", r#"{"label": "car"}"#);
            let delegate = HttpClassifierDelegate::new(url, Duration::from_secs(5)).unwrap();
            let err = delegate.is_vehicle(&payload()).unwrap_err();
            assert!(err.to_string().contains("malformed response"));
            server.join().unwrap();
        }

        #[test]
        fn unreachable_endpoint_is_unavailable() {
            // Bind then drop to get a port nobody listens on
            let port = TcpListener::bind("127.0.0.1:0")
                .unwrap()
                .local_addr()
                .unwrap()
                .port();
            let delegate = HttpClassifierDelegate::new(
                format!("http://127.0.0.1:{}/classify", port),
                Duration::from_secs(2),
            )
            .unwrap();
            assert!(matches!(
                delegate.is_vehicle(&payload()),
                Err(ClassifyError::RemoteClassifierUnavailable { .. })
            ));
        }
    }
}
