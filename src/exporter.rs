use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;

use log::{debug, info, warn};

use crate::error::ExporterError;
use crate::metrics::TreeMetrics;

/// Prometheus text exposition format, version 0.0.4.
const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Pull-based metrics endpoint. Scrape handling lives on its own threads so
/// a scrape never blocks on a tree mutation and vice versa; the only shared
/// state are the atomic instruments inside [`TreeMetrics`].
#[derive(Debug)]
pub struct MetricsExporter {
    listener: TcpListener,
    metrics: TreeMetrics,
}

impl MetricsExporter {
    /// Binds the exposition socket. Failing to bind is reported to the
    /// caller, which keeps driving the tree regardless.
    pub fn bind(metrics: TreeMetrics, port: u16) -> Result<MetricsExporter, ExporterError> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .map_err(|source| ExporterError::Bind { port, source })?;
        Ok(MetricsExporter { listener, metrics })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop; every connection gets a short-lived handler thread that
    /// answers any request with the current metrics text. Never returns in
    /// normal operation.
    pub fn serve(self) {
        if let Ok(addr) = self.local_addr() {
            info!("metrics exporter listening on {}", addr);
        }
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let metrics = self.metrics.clone();
                    thread::spawn(move || {
                        if let Err(e) = handle_scrape(stream, &metrics) {
                            debug!("scrape handler failed: {}", e);
                        }
                    });
                }
                Err(e) => warn!("failed to accept scrape connection: {}", e),
            }
        }
    }
}

fn handle_scrape(mut stream: TcpStream, metrics: &TreeMetrics) -> std::io::Result<()> {
    // Drain the request head; path and method are irrelevant, every request
    // is answered with the full exposition.
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 || line.trim_end().is_empty() {
            break;
        }
    }

    match metrics.gather() {
        Ok(body) => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                CONTENT_TYPE,
                body.len()
            );
            stream.write_all(head.as_bytes())?;
            stream.write_all(body.as_bytes())?;
        }
        Err(e) => {
            warn!("metrics encoding failed during scrape: {}", e);
            let body = "metrics encoding failed\n";
            let head = format!(
                "HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes())?;
            stream.write_all(body.as_bytes())?;
        }
    }
    stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn scrape_returns_the_registered_families() {
        let metrics = TreeMetrics::new().unwrap();
        metrics.record_cycle();
        metrics.record_add();

        let exporter = MetricsExporter::bind(metrics, 0).unwrap();
        let addr = exporter.local_addr().unwrap();
        thread::spawn(move || exporter.serve());

        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("text/plain; version=0.0.4"));
        assert!(response.contains("tree_number_of_iterations 1"));
        assert!(response.contains("tree_number_of_nodes 1"));
    }

    #[test]
    fn bind_failure_is_reported_not_fatal() {
        let metrics = TreeMetrics::new().unwrap();
        let first = MetricsExporter::bind(metrics.clone(), 0).unwrap();
        let port = first.local_addr().unwrap().port();
        // Second bind on the same port must surface as ExporterError::Bind.
        let err = MetricsExporter::bind(metrics, port).unwrap_err();
        assert!(matches!(err, ExporterError::Bind { .. }));
    }
}
