//! DNS query surface
//!
//! A read-only UDP responder over the record store. Every datagram is handled
//! on its own task.
//!
//! | Query | Answer                                                      |
//! |-------|-------------------------------------------------------------|
//! | A     | `127.0.0.1` for any name                                    |
//! | TXT   | `txtdata` of the first stored TXT entry, NXDOMAIN otherwise |
//! | NS    | `ns.example-acme-webook.invalid.`                           |
//! | SOA   | fixed placeholder authority                                 |
//! | other | SERVFAIL                                                    |
//!
//! TXT lookups use the queried name verbatim, trailing dot included.

use std::net::Ipv4Addr;
use std::sync::Arc;

use acme_dns_core::{Error, RecordStore, Records, Result};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::{A, NS, SOA, TXT};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};

/// TTL of every synthesized record
pub const RECORD_TTL: u32 = 5;

/// Name server placed in NS and SOA answers
pub const AUTHORITY_NAME: &str = "ns.example-acme-webook.invalid.";

const SOA_SERIAL: u32 = 20;
const SOA_TIMER: i32 = 5;
const SOA_MINIMUM: u32 = 5;

/// Longest character-string a TXT record can carry
const MAX_CHARACTER_STRING: usize = 255;

/// Largest datagram read off the socket
const MAX_DATAGRAM: usize = 4096;

/// Serve queries on `socket` until `shutdown` fires
///
/// Reply tasks are tracked so that none of them outlives the listener; the
/// socket is closed when this function returns.
pub(crate) async fn serve(
    socket: UdpSocket,
    store: Arc<dyn RecordStore>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let socket = Arc::new(socket);
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut replies = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!(in_flight = replies.len(), "DNS listener shutting down");
                break;
            }
            Some(_) = replies.join_next(), if !replies.is_empty() => {}
            received = socket.recv_from(&mut buf) => {
                let (len, peer) = match received {
                    Ok(received) => received,
                    Err(e) => {
                        warn!("DNS receive failed: {}", e);
                        continue;
                    }
                };

                let datagram = buf[..len].to_vec();
                let socket = Arc::clone(&socket);
                let store = Arc::clone(&store);

                replies.spawn(async move {
                    let Some(reply) = handle_datagram(&datagram, store.as_ref()).await else {
                        return;
                    };
                    if let Err(e) = socket.send_to(&reply, peer).await {
                        warn!(%peer, "DNS send failed: {}", e);
                    }
                });
            }
        }
    }

    replies.shutdown().await;
}

/// Decode one datagram and encode the reply; `None` drops it
async fn handle_datagram(datagram: &[u8], store: &dyn RecordStore) -> Option<Vec<u8>> {
    let request = match Message::from_vec(datagram) {
        Ok(request) => request,
        Err(e) => {
            warn!(len = datagram.len(), "Dropping undecodable DNS datagram: {}", e);
            return None;
        }
    };

    let response = respond(&request, store).await;

    match response.to_vec() {
        Ok(reply) => Some(reply),
        Err(e) => {
            warn!(id = request.id(), "Failed to encode DNS reply, answering SERVFAIL: {}", e);
            match server_failure(&request).to_vec() {
                Ok(reply) => Some(reply),
                Err(e) => {
                    error!(id = request.id(), "Failed to encode SERVFAIL reply: {}", e);
                    None
                }
            }
        }
    }
}

/// An answerless SERVFAIL reply echoing the request's queries
fn server_failure(request: &Message) -> Message {
    let mut response = Message::error_msg(request.id(), request.op_code(), ResponseCode::ServFail);
    response
        .set_recursion_desired(request.recursion_desired())
        .set_authoritative(true);
    response.add_queries(request.queries().iter().cloned());
    response
}

/// Build the reply to `request`
///
/// Queries are echoed back. Only the `Query` opcode gets answers. The first
/// query that cannot be answered turns the reply into SERVFAIL and stops
/// processing; answers already added are kept.
pub async fn respond(request: &Message, store: &dyn RecordStore) -> Message {
    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_authoritative(true);
    response.add_queries(request.queries().iter().cloned());

    if request.op_code() != OpCode::Query {
        debug!(op_code = ?request.op_code(), "Ignoring non-query DNS message");
        return response;
    }

    for query in request.queries() {
        match answer(query, store).await {
            Ok(Some(records)) => {
                response.add_answers(records);
            }
            Ok(None) => {
                response.set_response_code(ResponseCode::NXDomain);
            }
            Err(e) => {
                warn!(name = %query.name(), query_type = %query.query_type(), "DNS query failed: {}", e);
                response.set_response_code(ResponseCode::ServFail);
                break;
            }
        }
    }

    response
}

/// Answer one query; `Ok(None)` means NXDOMAIN
async fn answer(query: &Query, store: &dyn RecordStore) -> Result<Option<Vec<Record>>> {
    let name = query.name().clone();

    let rdata = match query.query_type() {
        RecordType::A => RData::A(A(Ipv4Addr::LOCALHOST)),
        RecordType::TXT => {
            let key = name.to_string();
            let records = store.get(&key).await?;

            let Some(value) = records.as_ref().and_then(Records::first_txt_value) else {
                trace!(name = %key, "No TXT record");
                return Ok(None);
            };

            RData::TXT(txt_rdata(value))
        }
        RecordType::NS => RData::NS(NS(authority_name()?)),
        RecordType::SOA => {
            let authority = authority_name()?;
            let soa = SOA::new(
                authority.clone(),
                authority.clone(),
                SOA_SERIAL,
                SOA_TIMER,
                SOA_TIMER,
                SOA_TIMER,
                SOA_MINIMUM,
            );
            return Ok(Some(vec![Record::from_rdata(
                authority,
                RECORD_TTL,
                RData::SOA(soa),
            )]));
        }
        other => {
            return Err(Error::invalid_input(format!(
                "unimplemented record type {other}"
            )));
        }
    };

    Ok(Some(vec![Record::from_rdata(name, RECORD_TTL, rdata)]))
}

/// TXT data for `value`, split into character-strings of at most 255 bytes
fn txt_rdata(value: &str) -> TXT {
    TXT::from_bytes(value.as_bytes().chunks(MAX_CHARACTER_STRING).collect())
}

fn authority_name() -> Result<Name> {
    Name::from_ascii(AUTHORITY_NAME)
        .map_err(|e| Error::invalid_input(format!("invalid authority name {AUTHORITY_NAME}: {e}")))
}
