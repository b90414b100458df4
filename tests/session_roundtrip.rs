//! End-to-end behavior through the mock transport: lazy fetching, saves,
//! batch operations, querying, and wire-format checks.

mod common;

use chrono::NaiveDate;
use limskit::prelude::*;
use limskit::ElementError;

use common::{artifact_uri, artifact_xml, init_logging, MockTransport, ROOT_URI};

fn process_xml(limsid: &str) -> String {
    format!(
        r#"<prc:process xmlns:prc="http://genologics.com/ri/process" uri="{ROOT_URI}/processes/{limsid}" limsid="{limsid}">
  <type>PCR Amplification</type>
  <date-run>2024-05-01</date-run>
  <technician uri="{ROOT_URI}/researchers/3"/>
</prc:process>"#
    )
}

#[test]
fn documents_fetch_lazily_and_memoize() {
    init_logging();
    let transport = MockTransport::new();
    transport.stub_get(artifact_uri("ADM1"), artifact_xml("ADM1", ""));
    let session = transport.session();

    let artifact = session.artifacts().from_limsid("ADM1");
    assert_eq!(transport.request_count("GET"), 0);

    assert_eq!(artifact.artifact_type().unwrap().as_deref(), Some("Analyte"));
    assert_eq!(transport.request_count("GET"), 1);

    assert_eq!(artifact.output_type().unwrap().as_deref(), Some("Sample"));
    assert_eq!(transport.request_count("GET"), 1);
}

#[test]
fn save_skips_clean_documents_and_puts_dirty_ones() {
    let transport = MockTransport::new();
    transport.stub_get(artifact_uri("ADM1"), artifact_xml("ADM1", ""));
    let session = transport.session();

    let artifact = session.artifacts().get("ADM1").unwrap();
    session.artifacts().save(&artifact).unwrap();
    assert_eq!(transport.request_count("PUT"), 0);

    artifact.set_qc(Some(false)).unwrap();
    session.artifacts().save(&artifact).unwrap();
    assert_eq!(transport.request_count("PUT"), 1);
    assert!(!artifact.is_dirty());

    let (_, uri, body) = transport
        .requests()
        .into_iter()
        .find(|(m, _, _)| m == "PUT")
        .expect("a PUT was recorded");
    assert_eq!(uri, artifact_uri("ADM1"));
    assert!(body.contains("<qc-flag>FAILED</qc-flag>"));
    assert!(body.contains("xmlns:art=\"http://genologics.com/ri/artifact\""));
}

#[test]
fn batch_update_sends_only_dirty_documents() {
    let transport = MockTransport::new();
    transport.stub_get(artifact_uri("ADM1"), artifact_xml("ADM1", ""));
    transport.stub_get(artifact_uri("ADM2"), artifact_xml("ADM2", ""));
    transport.stub_post(
        format!("{ROOT_URI}/artifacts/batch/update"),
        r#"<ri:details xmlns:ri="http://genologics.com/ri"/>"#,
    );
    let session = transport.session();

    let dirty = session.artifacts().get("ADM1").unwrap();
    let clean = session.artifacts().get("ADM2").unwrap();
    dirty.set_location_value("H:12").unwrap();

    let sent = session.artifacts().batch_update(&[&dirty, &clean]).unwrap();
    assert_eq!(sent, 1);
    assert!(!dirty.is_dirty());

    let (_, uri, body) = transport
        .requests()
        .into_iter()
        .find(|(m, _, _)| m == "POST")
        .expect("a POST was recorded");
    assert!(uri.ends_with("artifacts/batch/update"));
    assert!(body.contains("ADM1"));
    assert!(!body.contains("ADM2"));
}

#[test]
fn batch_get_retrieves_hydrated_documents_in_one_request() {
    let transport = MockTransport::new();
    let details = format!(
        r#"<art:details xmlns:art="http://genologics.com/ri/artifact">
  <art:artifact uri="{0}" limsid="ADM1"><type>Analyte</type></art:artifact>
  <art:artifact uri="{1}" limsid="ADM2"><type>ResultFile</type></art:artifact>
</art:details>"#,
        artifact_uri("ADM1"),
        artifact_uri("ADM2"),
    );
    transport.stub_post(format!("{ROOT_URI}/artifacts/batch/retrieve"), details);
    let session = transport.session();

    let artifacts = session.artifacts().batch_get(&["ADM1", "ADM2"]).unwrap();
    assert_eq!(artifacts.len(), 2);
    assert_eq!(artifacts[0].artifact_type().unwrap().as_deref(), Some("Analyte"));
    assert_eq!(artifacts[1].limsid().as_deref(), Some("ADM2"));
    // Hydrated from the batch response; no per-record GETs.
    assert_eq!(transport.request_count("GET"), 0);

    let (_, _, body) = transport
        .requests()
        .into_iter()
        .find(|(m, _, _)| m == "POST")
        .expect("a POST was recorded");
    assert!(body.contains(&artifact_uri("ADM1")));
    assert!(body.contains(&artifact_uri("ADM2")));
    assert!(body.contains("rel=\"artifacts\""));
}

#[test]
fn batch_get_falls_back_to_individual_fetches() {
    init_logging();
    let transport = MockTransport::new();
    transport.stub_get(format!("{ROOT_URI}/processes/24-1"), process_xml("24-1"));
    transport.stub_get(format!("{ROOT_URI}/processes/24-2"), process_xml("24-2"));
    let session = transport.session();

    // Processes do not declare BATCH_GET, so each record is fetched alone.
    let processes = session.processes().batch_get(&["24-1", "24-2"]).unwrap();
    assert_eq!(processes.len(), 2);
    assert_eq!(transport.request_count("GET"), 2);
    assert_eq!(transport.request_count("POST"), 0);
    assert_eq!(
        processes[0].process_type().unwrap().as_deref(),
        Some("PCR Amplification")
    );
    assert_eq!(
        processes[0].date_run().unwrap(),
        NaiveDate::from_ymd_opt(2024, 5, 1)
    );
}

#[test]
fn query_follows_pagination() {
    let transport = MockTransport::new();
    transport.stub_get(
        format!("{ROOT_URI}/artifacts?type=Analyte"),
        format!(
            r#"<art:artifacts xmlns:art="http://genologics.com/ri/artifact">
  <artifact uri="{0}" limsid="A1"/>
  <artifact uri="{1}" limsid="A2"/>
  <next-page uri="{ROOT_URI}/artifacts?type=Analyte&amp;start-index=500"/>
</art:artifacts>"#,
            artifact_uri("A1"),
            artifact_uri("A2"),
        ),
    );
    transport.stub_get(
        format!("{ROOT_URI}/artifacts?type=Analyte&start-index=500"),
        format!(
            r#"<art:artifacts xmlns:art="http://genologics.com/ri/artifact">
  <previous-page uri="{ROOT_URI}/artifacts?type=Analyte"/>
  <artifact uri="{0}" limsid="A3"/>
</art:artifacts>"#,
            artifact_uri("A3"),
        ),
    );
    let session = transport.session();

    let hits = session.artifacts().query(&[("type", "Analyte")]).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[2].limsid().as_deref(), Some("A3"));
    assert_eq!(transport.request_count("GET"), 2);
}

#[test]
fn query_is_refused_without_the_capability() {
    let transport = MockTransport::new();
    let session = transport.session();

    let err = session.stages().query(&[]).unwrap_err();
    assert!(matches!(err, ElementError::Unsupported { .. }));
    assert_eq!(transport.request_count("GET"), 0);
}

#[test]
fn create_attaches_the_server_response() {
    let transport = MockTransport::new();
    transport.stub_post(
        format!("{ROOT_URI}/containers"),
        format!(
            r#"<con:container xmlns:con="http://genologics.com/ri/container" uri="{ROOT_URI}/containers/27-200" limsid="27-200">
  <name>Plate 9</name>
  <occupied-wells>0</occupied-wells>
</con:container>"#
        ),
    );
    let session = transport.session();

    let container = session.containers().new_shell();
    container.set_name("Plate 9").unwrap();
    assert_eq!(container.uri(), None);

    session.containers().create(&container).unwrap();
    assert_eq!(container.limsid().as_deref(), Some("27-200"));
    assert_eq!(container.occupied_wells().unwrap(), Some(0));
    assert!(!container.is_dirty());

    let (_, _, body) = transport
        .requests()
        .into_iter()
        .find(|(m, _, _)| m == "POST")
        .expect("a POST was recorded");
    assert!(body.contains("<name>Plate 9</name>"));
    assert!(body.contains("xmlns:con=\"http://genologics.com/ri/container\""));
}

#[test]
fn mismatched_root_tag_is_rejected() {
    let transport = MockTransport::new();
    transport.stub_get(
        artifact_uri("ADM1"),
        format!(
            r#"<smp:sample xmlns:smp="http://genologics.com/ri/sample" uri="{}"/>"#,
            artifact_uri("ADM1")
        ),
    );
    let session = transport.session();

    let artifact = session.artifacts().from_limsid("ADM1");
    let err = artifact.artifact_type().unwrap_err();
    assert!(matches!(err, ElementError::RootTagMismatch { .. }));
}

#[test]
fn transport_failures_propagate_unmodified() {
    let transport = MockTransport::new();
    let session = transport.session();

    let artifact = session.artifacts().from_limsid("MISSING");
    match artifact.artifact_type().unwrap_err() {
        ElementError::Transport(TransportError::NotFound(uri)) => {
            assert_eq!(uri, artifact_uri("MISSING"));
        }
        other => panic!("expected a transport error, got {other:?}"),
    }
}

#[test]
fn refresh_rereads_the_server_state() {
    let transport = MockTransport::new();
    transport.stub_get(artifact_uri("ADM1"), artifact_xml("ADM1", ""));
    let session = transport.session();

    let artifact = session.artifacts().get("ADM1").unwrap();
    artifact.set_qc(Some(true)).unwrap();
    assert!(artifact.is_dirty());

    transport.stub_get(
        artifact_uri("ADM1"),
        artifact_xml("ADM1", "  <qc-flag>FAILED</qc-flag>\n"),
    );
    artifact.refresh().unwrap();

    // Descriptors re-derive from the replaced tree immediately.
    assert_eq!(artifact.qc().unwrap(), Some(false));
    assert!(!artifact.is_dirty());
}

#[test]
fn sample_dates_round_trip_through_chrono() {
    let transport = MockTransport::new();
    transport.stub_get(
        format!("{ROOT_URI}/samples/S1"),
        format!(
            r#"<smp:sample xmlns:smp="http://genologics.com/ri/sample" uri="{ROOT_URI}/samples/S1" limsid="S1">
  <date-received>2023-11-30</date-received>
</smp:sample>"#
        ),
    );
    let session = transport.session();

    let sample = session.samples().get("S1").unwrap();
    assert_eq!(
        sample.date_received().unwrap(),
        NaiveDate::from_ymd_opt(2023, 11, 30)
    );

    let date = NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date");
    sample.set_date_received(date).unwrap();
    assert_eq!(sample.date_received().unwrap(), Some(date));
    assert!(sample.is_dirty());
}
