use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::domain::job_record::{AssociationRef, GresAllocation, JobRecord, PartitionRef, QosRef};
use crate::domain::job_state::JobState;

/// Job 42 of user 7: 600s on c1/p1 with billing 10 under qos `normal` (1.5).
pub fn sample_record() -> JobRecord {
    JobRecord {
        job_id: 42,
        user_id: 7,
        job_state: JobState::COMPLETED,
        start_time: 1000,
        end_time: 1600,
        priority: 4294,
        assoc: Some(AssociationRef {
            cluster: Some("c1".to_string()),
            account: Some("physics".to_string()),
        }),
        partition: Some(PartitionRef {
            name: Some("p1".to_string()),
        }),
        qos: Some(QosRef {
            name: Some("normal".to_string()),
            usage_factor: 1.5,
        }),
        tres_alloc_cnt: Some(vec![4, 8192, 0, 1, 10]),
        gres_list_alloc: Some(vec![GresAllocation::new("gpu", 1)]),
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then_some(value.trim())
        })
    }
}

/// Accepts a single HTTP request on a loopback port, answers with `status_line`
/// and hands the captured request back through the returned channel.
pub fn spawn_one_shot_responder(
    status_line: &'static str,
) -> (String, mpsc::Receiver<CapturedRequest>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("responder should bind");
    let port = listener
        .local_addr()
        .expect("addr should be available")
        .port();
    let (sender, receiver) = mpsc::channel();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("responder should accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout should be configurable");

        let mut raw = Vec::new();
        let mut buffer = [0_u8; 1024];
        let captured = loop {
            let size = stream.read(&mut buffer).expect("request should be readable");
            raw.extend_from_slice(&buffer[..size]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some((head, body)) = text.split_once("\r\n\r\n") {
                let request = CapturedRequest {
                    head: head.to_string(),
                    body: body.to_string(),
                };
                let expected = request
                    .header("content-length")
                    .and_then(|value| value.parse::<usize>().ok())
                    .unwrap_or(0);
                if request.body.len() >= expected || size == 0 {
                    break request;
                }
            } else if size == 0 {
                panic!("connection closed before request head was complete");
            }
        };

        let response = format!(
            "{status_line}\r\ncontent-length: 12\r\nconnection: close\r\n\r\nnot relevant"
        );
        stream
            .write_all(response.as_bytes())
            .expect("response should be writable");
        sender.send(captured).expect("captured request should be sent");
    });

    (format!("http://127.0.0.1:{port}/jobs"), receiver, handle)
}

/// A loopback URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("probe should bind");
    let port = listener
        .local_addr()
        .expect("addr should be available")
        .port();
    drop(listener);
    format!("http://127.0.0.1:{port}/jobs")
}
