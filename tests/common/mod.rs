//! Shared test fixtures: an in-memory transport and canned documents.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use limskit::{Session, Transport, TransportError};

pub const ROOT_URI: &str = "http://localhost/api/v2";

/// One recorded request: method, URI, body.
pub type Request = (String, String, String);

#[derive(Default)]
pub struct MockState {
    get_responses: HashMap<String, String>,
    post_responses: HashMap<String, String>,
    requests: Vec<Request>,
}

/// A blocking in-memory transport. Cloning shares the underlying state, so
/// tests keep a handle after giving one to the session.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Builds a session over this transport.
    pub fn session(&self) -> Session {
        Session::new(ROOT_URI, Box::new(self.clone())).expect("builtin registry is valid")
    }

    pub fn stub_get(&self, uri: impl Into<String>, body: impl Into<String>) {
        self.state
            .borrow_mut()
            .get_responses
            .insert(uri.into(), body.into());
    }

    pub fn stub_post(&self, uri: impl Into<String>, body: impl Into<String>) {
        self.state
            .borrow_mut()
            .post_responses
            .insert(uri.into(), body.into());
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.borrow().requests.clone()
    }

    pub fn request_count(&self, method: &str) -> usize {
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|(m, _, _)| m == method)
            .count()
    }

    fn record(&self, method: &str, uri: &str, body: &str) {
        self.state
            .borrow_mut()
            .requests
            .push((method.to_owned(), uri.to_owned(), body.to_owned()));
    }
}

impl Transport for MockTransport {
    fn get(&self, uri: &str) -> Result<String, TransportError> {
        self.record("GET", uri, "");
        self.state
            .borrow()
            .get_responses
            .get(uri)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(uri.to_owned()))
    }

    fn put(&self, uri: &str, body: &str) -> Result<String, TransportError> {
        self.record("PUT", uri, body);
        // The server echoes the updated document back.
        Ok(body.to_owned())
    }

    fn post(&self, uri: &str, body: &str) -> Result<String, TransportError> {
        self.record("POST", uri, body);
        self.state
            .borrow()
            .post_responses
            .get(uri)
            .cloned()
            .ok_or_else(|| TransportError::Other(format!("no stubbed POST response for {uri}")))
    }
}

/// A minimal artifact document with the given extra body XML spliced in.
pub fn artifact_xml(limsid: &str, extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<art:artifact xmlns:art="http://genologics.com/ri/artifact" uri="{ROOT_URI}/artifacts/{limsid}" limsid="{limsid}" name="Specimen {limsid}">
  <type>Analyte</type>
  <output-type>Sample</output-type>
  <location>
    <container uri="{ROOT_URI}/containers/27-100" limsid="27-100"/>
    <value>A:1</value>
  </location>
{extra}</art:artifact>"#
    )
}

pub fn artifact_uri(limsid: &str) -> String {
    format!("{ROOT_URI}/artifacts/{limsid}")
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
