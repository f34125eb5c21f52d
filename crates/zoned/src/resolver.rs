use dns_record::{
    fully_qualify, selector, Address, Document, IpAddress, MxAddress, NameAddress, RecordKind,
    RecordSet,
};
use dns_store::RecordStore;
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::rdata::{SOA, TXT};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};

const SOA_TTL: u32 = 60;
const SOA_REFRESH: i32 = 86400;
const SOA_RETRY: i32 = 7200;
const SOA_EXPIRE: i32 = 3600;
const SOA_MINTTL: u32 = 60;

/// Answers one DNS message at a time out of the record store.
///
/// The store handle, the zone-authority name used for NXDOMAIN responses
/// and the RNG driving weighted selection are all constructor parameters so
/// tests can substitute each of them.
pub struct QueryResolver {
    store: Arc<dyn RecordStore>,
    authority: String,
    rng: Mutex<StdRng>,
}

impl QueryResolver {
    pub fn new(store: Arc<dyn RecordStore>, authority: impl Into<String>, rng: StdRng) -> Self {
        Self {
            store,
            authority: authority.into(),
            rng: Mutex::new(rng),
        }
    }

    /// Build the one response for a request. Questions that fail (store
    /// errors, malformed documents, unknown types) are skipped; when no
    /// question produced an answer the response is NXDOMAIN with a
    /// synthetic SOA rooted at `.`.
    pub async fn respond(&self, request: &Message) -> Message {
        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(request.op_code())
            .set_recursion_desired(request.recursion_desired())
            .set_authoritative(true)
            .set_recursion_available(false)
            .set_response_code(ResponseCode::NoError);

        let mut answers = Vec::new();
        for query in request.queries() {
            response.add_query(query.clone());
            self.answer_question(query, &mut answers).await;
        }

        if answers.is_empty() {
            response.set_response_code(ResponseCode::NXDomain);
            if let Some(soa) = self.nxdomain_soa().await {
                answers.push(soa);
            }
        }

        response.add_answers(answers);
        response
    }

    async fn answer_question(&self, query: &Query, answers: &mut Vec<Record>) {
        let qtype = query.query_type();
        let name = query.name().clone();
        let lookup_name = normalize_qname(&name);

        let doc = match self.store.lookup(&lookup_name).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                tracing::warn!("no record found for {qtype} {lookup_name}");
                return;
            }
            Err(err) => {
                tracing::error!("error finding record for {qtype} {lookup_name}: {err:#}");
                return;
            }
        };

        match qtype {
            RecordType::A => answers.extend(self.answer_a(&name, &doc)),
            RecordType::AAAA => answers.extend(self.answer_aaaa(&name, &doc)),
            RecordType::CNAME => answers.extend(self.answer_cname(&name, &doc)),
            RecordType::NS => answers.extend(self.emit(
                &name,
                &active(&doc.ns),
                NameAddress::to_ns,
            )),
            RecordType::TXT => answers.extend(self.answer_txt(&name, &doc)),
            RecordType::MX => answers.extend(self.emit(&name, &active(&doc.mx), MxAddress::to_mx)),
            RecordType::SRV => answers.extend(self.answer_srv(&name, &doc)),
            RecordType::SOA => {
                let serial = self.serial().await;
                answers.extend(self.synthesize_soa(&name, &doc, serial));
            }
            other => {
                tracing::warn!("invalid question type {other} for {lookup_name}");
            }
        }
    }

    fn answer_a(&self, name: &Name, doc: &Document) -> Vec<Record> {
        let active_a = active(&doc.a);
        if active_a.is_empty() {
            if !doc.section_is_empty(RecordKind::Cname) {
                return self.answer_cname(name, doc);
            }
            return Vec::new();
        }
        self.emit(name, &active_a, IpAddress::to_a)
    }

    fn answer_aaaa(&self, name: &Name, doc: &Document) -> Vec<Record> {
        let active_aaaa = active(&doc.aaaa);
        if active_aaaa.is_empty() {
            if !doc.section_is_empty(RecordKind::Cname) {
                return self.answer_cname(name, doc);
            }
            return Vec::new();
        }
        self.emit(name, &active_aaaa, IpAddress::to_aaaa)
    }

    fn answer_cname(&self, name: &Name, doc: &Document) -> Vec<Record> {
        self.emit(name, &active(&doc.cname), NameAddress::to_cname)
    }

    /// TXT answers aggregate every active value into one record, a
    /// character-string per value. A weighted section still answers with a
    /// single selected value.
    fn answer_txt(&self, name: &Name, doc: &Document) -> Vec<Record> {
        let active_txt = active(&doc.txt);
        if active_txt.weighted && active_txt.addresses.len() > 1 {
            return self.emit(name, &active_txt, NameAddress::to_txt);
        }
        let Some(first) = active_txt.addresses.first() else {
            return Vec::new();
        };
        let values: Vec<String> = active_txt
            .addresses
            .iter()
            .map(|a| a.value.clone())
            .collect();
        vec![Record::from_rdata(
            name.clone(),
            first.attrs.ttl,
            RData::TXT(TXT::new(values)),
        )]
    }

    /// SRV answers carry every active address; clients select on the
    /// priority and weight on each record.
    fn answer_srv(&self, name: &Name, doc: &Document) -> Vec<Record> {
        let Some(srv) = &doc.srv else {
            return Vec::new();
        };
        srv.active()
            .addresses
            .iter()
            .filter_map(|addr| {
                addr.to_srv()
                    .map(|rdata| Record::from_rdata(name.clone(), addr.attrs.ttl, rdata))
            })
            .collect()
    }

    /// One record chosen by weighted selection when the section asks for
    /// it, otherwise one record per active address in stored order.
    fn emit<A: Address>(
        &self,
        name: &Name,
        active: &RecordSet<A>,
        to_rdata: impl Fn(&A) -> Option<RData>,
    ) -> Vec<Record> {
        if active.weighted && active.addresses.len() > 1 {
            let mut rng = self.rng.lock().unwrap();
            let Some(addr) = selector::pick_weighted(&active.addresses, &mut *rng) else {
                return Vec::new();
            };
            return to_rdata(addr)
                .map(|rdata| vec![Record::from_rdata(name.clone(), addr.attrs().ttl, rdata)])
                .unwrap_or_default();
        }

        active
            .addresses
            .iter()
            .filter_map(|addr| {
                to_rdata(addr)
                    .map(|rdata| Record::from_rdata(name.clone(), addr.attrs().ttl, rdata))
            })
            .collect()
    }

    /// SOA is synthesised, never stored: the primary NS is the first active
    /// NS value and the mbox is the first active MX server, if any.
    fn synthesize_soa(&self, name: &Name, doc: &Document, serial: u32) -> Vec<Record> {
        let ns_active = active(&doc.ns);
        let Some(primary) = ns_active.addresses.first() else {
            return Vec::new();
        };
        let Ok(mname) = fully_qualify(&primary.value) else {
            tracing::warn!("unusable NS value '{}' for SOA", primary.value);
            return Vec::new();
        };

        let rname = active(&doc.mx)
            .addresses
            .first()
            .and_then(|mx| fully_qualify(&mx.server).ok())
            .unwrap_or_else(Name::root);

        vec![Record::from_rdata(
            name.clone(),
            SOA_TTL,
            RData::SOA(SOA::new(
                mname,
                rname,
                serial,
                SOA_REFRESH,
                SOA_RETRY,
                SOA_EXPIRE,
                SOA_MINTTL,
            )),
        )]
    }

    async fn nxdomain_soa(&self) -> Option<Record> {
        let mname = match fully_qualify(&self.authority) {
            Ok(name) => name,
            Err(err) => {
                tracing::error!("authority '{}' is not a valid name: {err}", self.authority);
                return None;
            }
        };
        let serial = self.serial().await;
        Some(Record::from_rdata(
            Name::root(),
            SOA_TTL,
            RData::SOA(SOA::new(
                mname,
                Name::root(),
                serial,
                SOA_REFRESH,
                SOA_RETRY,
                SOA_EXPIRE,
                SOA_MINTTL,
            )),
        ))
    }

    async fn serial(&self) -> u32 {
        match self.store.serial_number().await {
            Ok(serial) => serial,
            Err(err) => {
                tracing::error!("error reading serial number from the store: {err:#}");
                0
            }
        }
    }
}

fn active<A: Address>(section: &Option<RecordSet<A>>) -> RecordSet<A> {
    section.as_ref().map(|s| s.active()).unwrap_or_default()
}

/// Strip the single trailing dot and fold case before any store lookup.
fn normalize_qname(name: &Name) -> String {
    let mut qname = name.to_utf8().to_ascii_lowercase();
    if qname.ends_with('.') {
        qname.pop();
    }
    qname
}
