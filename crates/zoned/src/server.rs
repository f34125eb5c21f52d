use crate::lifecycle::{Activity, ShutdownSubscription};
use crate::resolver::QueryResolver;
use anyhow::Context;
use hickory_proto::op::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

const MAX_DATAGRAM_SIZE: usize = 65_536;

/// The UDP front end. Every datagram is handled by its own short-lived
/// task; each task builds exactly one response and writes it before
/// finishing, so shutdown never tears a response in half.
pub struct UdpServer {
    socket: Arc<UdpSocket>,
    resolver: Arc<QueryResolver>,
}

impl UdpServer {
    pub async fn bind(addr: SocketAddr, resolver: Arc<QueryResolver>) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("binding udp listener on {addr}"))?;
        tracing::info!("listening for DNS queries on {}", socket.local_addr()?);
        Ok(Self {
            socket: Arc::new(socket),
            resolver,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Accept datagrams until shutdown is signalled. In-flight handlers
    /// hold an [`Activity`] and are drained by the life cycle.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut shutdown = ShutdownSubscription::get();
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            tokio::select! {
                _ = shutdown.shutting_down() => {
                    tracing::info!("no longer accepting datagrams");
                    return Ok(());
                }
                received = self.socket.recv_from(&mut buf) => {
                    let (len, peer) = received.context("receiving datagram")?;
                    let Ok(activity) = Activity::get(format!("query from {peer}")) else {
                        return Ok(());
                    };
                    let datagram = buf[..len].to_vec();
                    let socket = self.socket.clone();
                    let resolver = self.resolver.clone();
                    tokio::spawn(async move {
                        let _activity = activity;
                        handle_datagram(resolver, socket, datagram, peer).await;
                    });
                }
            }
        }
    }
}

async fn handle_datagram(
    resolver: Arc<QueryResolver>,
    socket: Arc<UdpSocket>,
    datagram: Vec<u8>,
    peer: SocketAddr,
) {
    let request = match Message::from_vec(&datagram) {
        Ok(message) => message,
        Err(err) => {
            tracing::debug!("dropping unparseable datagram from {peer}: {err}");
            return;
        }
    };

    let response = resolver.respond(&request).await;

    let bytes = match response.to_vec() {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!("failed to encode response for {peer}: {err}");
            return;
        }
    };
    if let Err(err) = socket.send_to(&bytes, peer).await {
        tracing::error!("failed to write response to {peer}: {err}");
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lifecycle::LifeCycle;
    use dns_record::{Document, IpAddress, RecordSet};
    use dns_store::{MemoryStore, RecordStore};
    use hickory_proto::op::{MessageType, Query, ResponseCode};
    use hickory_proto::rr::{Name, RecordType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Full round trip over a real socket, followed by a graceful
    /// shutdown. This is the only test that touches the process-global
    /// life cycle.
    #[tokio::test]
    async fn serves_a_query_over_udp_and_shuts_down() {
        let mut life_cycle = LifeCycle::new();

        let store = Arc::new(MemoryStore::new());
        let mut doc = Document::new("example.com");
        let mut addr = IpAddress::new("10.0.0.1".parse().unwrap());
        addr.attrs.ttl = 60;
        doc.a = Some(RecordSet {
            weighted: false,
            addresses: vec![addr],
        });
        store.put("web.example.com", &doc).await.unwrap();

        let resolver = Arc::new(QueryResolver::new(
            store,
            "ns.test.example",
            StdRng::seed_from_u64(0),
        ));
        let server = UdpServer::bind("127.0.0.1:0".parse().unwrap(), resolver)
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();
        let server_task = tokio::spawn(async move { server.run().await });

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut request = Message::new();
        request
            .set_id(99)
            .set_message_type(MessageType::Query)
            .set_recursion_desired(true);
        request.add_query(Query::query(
            Name::from_utf8("web.example.com.").unwrap(),
            RecordType::A,
        ));
        client
            .send_to(&request.to_vec().unwrap(), server_addr)
            .await
            .unwrap();

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let (len, _) = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            client.recv_from(&mut buf),
        )
        .await
        .expect("response within deadline")
        .unwrap();

        let response = Message::from_vec(&buf[..len]).unwrap();
        assert_eq!(response.id(), 99);
        assert!(response.authoritative());
        assert!(!response.recursion_available());
        assert_eq!(response.response_code(), ResponseCode::NoError);
        assert_eq!(response.answers().len(), 1);
        assert_eq!(
            response.answers()[0].data().as_a().unwrap().0.to_string(),
            "10.0.0.1"
        );

        LifeCycle::request_shutdown().await;
        life_cycle.wait_for_shutdown().await;
        server_task.await.unwrap().unwrap();
    }
}
