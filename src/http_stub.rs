//! Scripted HTTP server for exercising the remote clients in tests.
//!
//! Each scripted response answers exactly one connection, in order, and the
//! server thread hands back what it received once the script runs out.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use reqwest::blocking::Client;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    /// Header lines, lowercased.
    pub head: String,
    pub body: String,
}

pub struct Stub {
    listener: TcpListener,
    pub base: String,
}

impl Stub {
    pub fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
        let base = format!("http://{}", listener.local_addr().expect("stub addr"));
        Stub { listener, base }
    }

    pub fn serve(self, responses: Vec<(u16, String)>) -> JoinHandle<Vec<Recorded>> {
        thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (stream, _) = self.listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

                let mut line = String::new();
                reader.read_line(&mut line).expect("request line");
                let mut parts = line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let target = parts.next().unwrap_or_default().to_string();

                let mut head = String::new();
                let mut length = 0usize;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).expect("header line");
                    let header = header.trim_end().to_lowercase();
                    if header.is_empty() {
                        break;
                    }
                    if let Some(v) = header.strip_prefix("content-length:") {
                        length = v.trim().parse().unwrap_or(0);
                    }
                    head.push_str(&header);
                    head.push('\n');
                }
                let mut raw = vec![0u8; length];
                reader.read_exact(&mut raw).expect("request body");
                seen.push(Recorded { method, target, head, body: String::from_utf8_lossy(&raw).into_owned() });

                let mut stream = stream;
                write!(
                    stream,
                    "HTTP/1.1 {status} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .expect("write response");
                stream.flush().expect("flush response");
            }
            seen
        })
    }
}

/// Client that never routes through a proxy from the environment.
pub fn direct_client() -> Client {
    Client::builder().no_proxy().build().expect("client")
}
