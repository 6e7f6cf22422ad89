//! Scripted web service, echo signer and recording sleeper shared by the
//! workflow tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use nota::core::*;

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub operation: String,
    pub payload: Payload,
    pub hints: RoutingHints,
}

/// Replies queued per operation; every invocation is recorded. An
/// operation with no queued reply fails like a dropped connection.
#[derive(Default)]
pub struct Sefaz {
    replies: RefCell<HashMap<String, VecDeque<RawResponse>>>,
    pub calls: RefCell<Vec<Call>>,
}

impl Sefaz {
    /// Queue `body` inside a SOAP 1.2 envelope and an `{operation}Result`
    /// wrapper.
    pub fn reply(&self, operation: &str, body: &str) -> &Self {
        self.reply_raw(operation, soap(operation, body))
    }

    pub fn reply_raw(&self, operation: &str, raw: RawResponse) -> &Self {
        self.replies
            .borrow_mut()
            .entry(operation.to_string())
            .or_default()
            .push_back(raw);
        self
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.operation.clone()).collect()
    }

    pub fn call(&self, index: usize) -> Call {
        self.calls.borrow()[index].clone()
    }
}

struct Client<'a> {
    url: String,
    sefaz: &'a Sefaz,
}

impl SoapClient for Client<'_> {
    fn invoke(
        &mut self,
        operation: &str,
        payload: &Payload,
        hints: &RoutingHints,
    ) -> Result<RawResponse, EdocError> {
        self.sefaz.calls.borrow_mut().push(Call {
            url: self.url.clone(),
            operation: operation.to_string(),
            payload: payload.clone(),
            hints: hints.clone(),
        });
        self.sefaz
            .replies
            .borrow_mut()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| EdocError::Transport(format!("connection reset on {operation}")))
    }
}

impl Transport for Sefaz {
    fn open(&self, url: &str) -> Result<Box<dyn SoapClient + '_>, EdocError> {
        Ok(Box::new(Client {
            url: url.to_string(),
            sefaz: self,
        }))
    }
}

/// Returns the document untouched, as if signed; PKCS#1 yields fixed bytes.
pub struct EchoSigner;

impl Signer for EchoSigner {
    fn sign(&self, xml: &str, _element_id: &str) -> Result<String, EdocError> {
        Ok(xml.to_string())
    }

    fn sign_pkcs1_sha1(&self, data: &[u8]) -> Result<Vec<u8>, EdocError> {
        Ok(data.iter().rev().copied().collect())
    }
}

/// Records the waits instead of sleeping.
#[derive(Clone, Default)]
pub struct Naps(pub Rc<RefCell<Vec<Duration>>>);

impl Naps {
    pub fn taken(&self) -> Vec<Duration> {
        self.0.borrow().clone()
    }
}

impl Sleeper for Naps {
    fn sleep(&self, duration: Duration) {
        self.0.borrow_mut().push(duration);
    }
}

pub fn soap(operation: &str, body: &str) -> RawResponse {
    RawResponse::http(
        200,
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><soap:Envelope xmlns:soap=\"http://www.w3.org/2003/05/soap-envelope\"><soap:Body><{operation}Result>{body}</{operation}Result></soap:Body></soap:Envelope>"
        ),
    )
}
