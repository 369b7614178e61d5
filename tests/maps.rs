//! Map service capabilities tests against a wiremock server.

use eodhapi::{Auth, EodhClient, EodhError, MapService};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WMTS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Capabilities xmlns="http://www.opengis.net/wmts/1.0" version="1.0.0">
  <Contents><Layer><ows:Identifier>sentinel2_ard</ows:Identifier></Layer></Contents>
</Capabilities>"#;

fn client(server: &MockServer) -> EodhClient {
    EodhClient::new(&server.uri(), Auth::Bearer("test-token".to_string())).unwrap()
}

#[tokio::test]
async fn test_get_wmts_capabilities() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/titiler/core/WMTSCapabilities.xml"))
        .and(query_param("SERVICE", "WMTS"))
        .and(query_param("REQUEST", "GetCapabilities"))
        .and(query_param("VERSION", "1.0.0"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(WMTS_XML),
        )
        .expect(1)
        .mount(&server)
        .await;

    let caps = client(&server).get_wmts().await.unwrap();

    assert_eq!(caps.service, MapService::Wmts);
    assert_eq!(caps.version, "1.0.0");
    assert_eq!(caps.content_type.as_deref(), Some("application/xml"));
    assert!(caps.document.contains("sentinel2_ard"));
    assert!(caps.url.contains("/titiler/core/WMTSCapabilities.xml?"));
    assert!(!caps.is_exception());
}

#[tokio::test]
async fn test_get_wms_capabilities() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/titiler/core/wms"))
        .and(query_param("SERVICE", "WMS"))
        .and(query_param("VERSION", "1.1.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<WMT_MS_Capabilities version=\"1.1.1\"><Capability/></WMT_MS_Capabilities>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let caps = client(&server).get_wms().await.unwrap();

    assert_eq!(caps.service, MapService::Wms);
    assert!(caps.document.starts_with("<WMT_MS_Capabilities"));
}

#[tokio::test]
async fn test_capabilities_at_custom_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/wms"))
        .and(query_param("SERVICE", "WMS"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<WMT_MS_Capabilities/>"))
        .expect(1)
        .mount(&server)
        .await;

    let caps = client(&server)
        .get_capabilities(MapService::Wms, "maps/wms")
        .await
        .unwrap();
    assert_eq!(caps.document, "<WMT_MS_Capabilities/>");
}

#[tokio::test]
async fn test_capabilities_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("tiler unavailable"))
        .mount(&server)
        .await;

    let err = client(&server).get_wmts().await.unwrap_err();
    match err {
        EodhError::ApiError { status_code, message } => {
            assert_eq!(status_code, Some(503));
            assert_eq!(message, "tiler unavailable");
        }
        other => panic!("Expected ApiError, got {other:?}"),
    }
}
