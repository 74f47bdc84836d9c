//! Shared harness for simulation server tests
//!
//! Boots a [`MockProvider`] on ephemeral ports and offers the three ways of
//! talking to it: the real API client, raw HTTP calls, and DNS over UDP.

#![allow(dead_code)]

use acme_dns_beget::BegetClient;
use acme_dns_core::{ClientConfig, Credentials};
use acme_dns_mock::MockProvider;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RData, RecordType};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

pub const LOGIN: &str = "testl";
pub const PASSWD: &str = "testp";

/// A provider with both surfaces running
pub struct TestProvider {
    pub provider: MockProvider,
    pub http_addr: SocketAddr,
    pub dns_addr: SocketAddr,
}

impl TestProvider {
    /// Start HTTP and DNS on ephemeral loopback ports
    pub async fn start() -> Self {
        let provider = MockProvider::new(LOGIN, PASSWD);
        let any_port = SocketAddr::from(([127, 0, 0, 1], 0));

        let http_addr = provider.start_http(any_port).await.expect("HTTP starts");
        let dns_addr = provider.start_dns(any_port).await.expect("DNS starts");

        Self {
            provider,
            http_addr,
            dns_addr,
        }
    }

    /// Base URL of the HTTP surface
    pub fn base_url(&self) -> String {
        format!("http://{}", self.http_addr)
    }

    /// A client pointed at this provider
    pub fn client(&self) -> BegetClient {
        BegetClient::new(&ClientConfig::new(self.base_url())).expect("client builds")
    }

    /// Send a raw POST to `path` with the given query string and multipart fields
    pub async fn raw_call(
        &self,
        path: &str,
        query: &[(&str, &str)],
        fields: &[(&str, &str)],
    ) -> (u16, String) {
        let mut request = reqwest::Client::new()
            .post(format!("{}{}", self.base_url(), path))
            .query(query);

        if !fields.is_empty() {
            let mut form = reqwest::multipart::Form::new();
            for (name, value) in fields {
                form = form.text(name.to_string(), value.to_string());
            }
            request = request.multipart(form);
        }

        let response = request.send().await.expect("request is sent");

        let status = response.status().as_u16();
        let body = response.text().await.expect("body is readable");
        (status, body)
    }

    /// Stop both surfaces
    pub async fn shutdown(self) {
        self.provider
            .stop_http(Duration::from_secs(5))
            .await
            .expect("HTTP stops");
        self.provider.stop_dns().await.expect("DNS stops");
    }
}

/// Credentials matching the provider
pub fn creds() -> Credentials {
    Credentials::new(LOGIN, PASSWD)
}

/// Standard query parameters with valid credentials
pub fn auth_query() -> Vec<(&'static str, &'static str)> {
    vec![
        ("login", LOGIN),
        ("passwd", PASSWD),
        ("input_format", "json"),
        ("output_format", "json"),
    ]
}

/// Send one DNS query over UDP and wait for the reply
pub async fn dns_query(server: SocketAddr, name: &str, query_type: RecordType) -> Message {
    let mut request = Message::new();
    request
        .set_id(query_id(name))
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(
            Name::from_ascii(name).expect("valid name"),
            query_type,
        ));

    let socket = UdpSocket::bind("127.0.0.1:0").await.expect("socket binds");
    socket
        .send_to(&request.to_vec().expect("query encodes"), server)
        .await
        .expect("query is sent");

    let mut buf = vec![0u8; 4096];
    let (len, _) = tokio::time::timeout(Duration::from_secs(5), socket.recv_from(&mut buf))
        .await
        .expect("reply arrives in time")
        .expect("reply is received");

    let reply = Message::from_vec(&buf[..len]).expect("reply decodes");
    assert_eq!(reply.id(), request.id());
    reply
}

/// TXT strings carried by the answers of `message`
pub fn txt_values(message: &Message) -> Vec<String> {
    message
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            Some(RData::TXT(txt)) => Some(String::from_utf8_lossy(&txt.txt_data().concat()).into_owned()),
            _ => None,
        })
        .collect()
}

fn query_id(name: &str) -> u16 {
    name.bytes()
        .fold(0x5a5au16, |acc, b| acc.rotate_left(3) ^ u16::from(b))
}
