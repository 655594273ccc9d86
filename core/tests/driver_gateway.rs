use std::path::Path;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use vulnscout_core::AttemptTier;
use vulnscout_core::Driver;
use vulnscout_core::Error;
use vulnscout_core::ScanConfig;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn test_config(endpoint: String) -> ScanConfig {
    ScanConfig {
        endpoint,
        connect_timeout: Duration::from_secs(1),
        request_timeout: Duration::from_secs(5),
        max_output_tokens: 512,
        slice_count: 2,
        ..ScanConfig::default()
    }
}

fn finding_body(path: &str) -> String {
    json!([{
        "path": path,
        "cwe_guess": "CWE-89",
        "severity": "High",
        "confidence": 0.9,
        "lines": [2],
        "snippet": "query(input)",
        "evidence": "user input reaches the query",
        "reasoning": "no sanitization on the way",
        "fix": "bind parameters",
    }])
    .to_string()
}

const CONTENT: &str = "alpha\nbeta\ngamma\ndelta";

#[tokio::test]
async fn success_on_first_attempt_yields_findings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(200).set_body_string(finding_body("src/app.py")))
        .expect(1)
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let outcome = driver.scan_content("src/app.py", CONTENT).await;

    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings[0].path, "src/app.py");
    assert_eq!(outcome.tier, Some(AttemptTier::Full));
    assert!(!outcome.repair_attempted);
    assert_eq!(outcome.failure, None);
}

#[tokio::test]
async fn garbage_body_is_salvaged_by_the_repair_pass() {
    let server = MockServer::start().await;
    // The repair request quotes the prior reply; the first scan request
    // does not, so it falls through to the garbage mock below.
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .and(body_string_contains("Previous reply"))
        .respond_with(ResponseTemplate::new(200).set_body_string(finding_body("src/app.py")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(200).set_body_string("I found some bugs, trust me"))
        .expect(1)
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let outcome = driver.scan_content("src/app.py", CONTENT).await;

    assert_eq!(outcome.findings.len(), 1);
    assert!(outcome.repair_attempted);
    assert_eq!(outcome.tier, Some(AttemptTier::Full));
    assert_eq!(outcome.failure, None);
}

#[tokio::test]
async fn failed_repair_degrades_to_zero_findings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .expect(2)
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let outcome = driver.scan_content("src/app.py", CONTENT).await;

    assert!(outcome.findings.is_empty());
    assert!(outcome.repair_attempted);
    // Unusable content is zero findings, not an error.
    assert_eq!(outcome.failure, None);
    assert_eq!(outcome.tier, Some(AttemptTier::Full));
}

#[tokio::test]
async fn clean_empty_array_skips_the_repair_pass() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let outcome = driver.scan_content("src/app.py", CONTENT).await;

    assert!(outcome.findings.is_empty());
    assert!(!outcome.repair_attempted);
    assert_eq!(outcome.failure, None);
}

#[tokio::test]
async fn overload_descends_to_the_halved_rung() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(200).set_body_string(finding_body("src/app.py")))
        .expect(1)
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let outcome = driver.scan_content("src/app.py", CONTENT).await;

    assert_eq!(outcome.tier, Some(AttemptTier::Halved));
    assert_eq!(outcome.findings.len(), 1);
}

#[tokio::test]
async fn two_overloads_then_the_first_slice_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(200).set_body_string(finding_body("src/app.py")))
        .expect(1)
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let outcome = driver.scan_content("src/app.py", CONTENT).await;

    assert_eq!(outcome.tier, Some(AttemptTier::Slice { index: 0, total: 2 }));
    assert_eq!(outcome.findings.len(), 1);

    // The successful attempt carried only the first half of the file.
    let requests = server.received_requests().await.expect("recorded requests");
    let last_body = String::from_utf8_lossy(&requests[2].body).into_owned();
    assert!(last_body.contains("1: alpha"));
    assert!(last_body.contains("2: beta"));
    assert!(!last_body.contains("3: gamma"));
}

#[tokio::test]
async fn exhausted_ladder_reports_a_terminal_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let outcome = driver.scan_content("src/app.py", CONTENT).await;

    assert!(outcome.findings.is_empty());
    assert_eq!(outcome.tier, None);
    let failure = outcome.failure.expect("terminal failure");
    assert!(failure.contains("exhausted"), "failure: {failure}");
    assert!(failure.contains("503"), "failure: {failure}");
}

#[tokio::test]
async fn byte_floor_cuts_the_ladder_to_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(server.uri());
    // Halving 3000 would cross the 2000-byte floor.
    config.byte_cap = 3000;
    config.min_byte_cap = 2000;

    let driver = Driver::new(config).expect("driver");
    let outcome = driver.scan_content("src/app.py", CONTENT).await;

    assert!(outcome.failure.is_some());
    assert!(outcome.findings.is_empty());
}

#[tokio::test]
async fn non_transient_status_fails_without_descending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let outcome = driver.scan_content("src/app.py", CONTENT).await;

    let failure = outcome.failure.expect("terminal failure");
    assert!(failure.contains("400"), "failure: {failure}");
    assert_eq!(outcome.tier, None);
}

#[tokio::test]
async fn missing_path_is_injected_end_to_end() {
    let server = MockServer::start().await;
    let pathless = json!([{
        "cwe_guess": "CWE-79",
        "severity": "Medium",
        "confidence": 0.6,
        "lines": [1, 2],
        "snippet": "echo input",
        "evidence": "reflected output",
        "reasoning": "unescaped",
        "fix": "escape it",
    }])
    .to_string();
    Mock::given(method("POST"))
        .and(path("/v1/crs/run"))
        .respond_with(ResponseTemplate::new(200).set_body_string(pathless))
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let outcome = driver.scan_content("src/page.php", CONTENT).await;

    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings[0].path, "src/page.php");
}

#[tokio::test]
async fn unreadable_input_is_a_hard_error() {
    let server = MockServer::start().await;
    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let result = driver
        .scan_file(Path::new("/nonexistent/vulnscout/input.c"))
        .await;
    assert!(matches!(result, Err(Error::Io { .. })));
}

#[tokio::test]
async fn healthz_probe_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    driver.client().healthz().await.expect("healthy gateway");
}

#[tokio::test]
async fn healthz_failure_surfaces_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let driver = Driver::new(test_config(server.uri())).expect("driver");
    let result = driver.client().healthz().await;
    assert!(matches!(
        result,
        Err(Error::UnexpectedStatus { status, .. }) if status.as_u16() == 500
    ));
}
