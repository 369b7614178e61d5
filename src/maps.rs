//! OGC map services (WMTS and WMS) published by the hub.
//!
//! Only the capabilities documents are fetched. They are XML and are
//! returned as text for an OGC client library to interpret.

use std::fmt;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::client::EodhClient;
use crate::error::Result;

/// Path of the hub's WMTS endpoint, relative to the base URL.
pub const WMTS_PATH: &str = "titiler/core/WMTSCapabilities.xml";
/// Path of the hub's WMS endpoint, relative to the base URL.
pub const WMS_PATH: &str = "titiler/core/wms";

/// An OGC map service protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MapService {
    /// Web Map Tile Service 1.0.0.
    Wmts,
    /// Web Map Service 1.1.1.
    Wms,
}

impl MapService {
    /// Value of the `SERVICE` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wmts => "WMTS",
            Self::Wms => "WMS",
        }
    }

    /// Protocol version requested.
    pub fn version(&self) -> &'static str {
        match self {
            Self::Wmts => "1.0.0",
            Self::Wms => "1.1.1",
        }
    }

    /// Default endpoint of this service on the hub.
    pub fn default_path(&self) -> &'static str {
        match self {
            Self::Wmts => WMTS_PATH,
            Self::Wms => WMS_PATH,
        }
    }
}

impl fmt::Display for MapService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capabilities document as served.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub service: MapService,
    pub version: String,
    /// Final URL, after redirects.
    pub url: String,
    pub content_type: Option<String>,
    pub document: String,
}

impl Capabilities {
    /// Whether the document is an OGC exception report rather than capabilities.
    pub fn is_exception(&self) -> bool {
        self.document.contains("ExceptionReport") || self.document.contains("ServiceException")
    }
}

impl EodhClient {
    /// Capabilities of the hub's Web Map Tile Service.
    ///
    /// Calls: `GET {base}/titiler/core/WMTSCapabilities.xml?SERVICE=WMTS&REQUEST=GetCapabilities&VERSION=1.0.0`
    pub async fn get_wmts(&self) -> Result<Capabilities> {
        self.get_capabilities(MapService::Wmts, WMTS_PATH).await
    }

    /// Capabilities of the hub's Web Map Service.
    ///
    /// Calls: `GET {base}/titiler/core/wms?SERVICE=WMS&REQUEST=GetCapabilities&VERSION=1.1.1`
    pub async fn get_wms(&self) -> Result<Capabilities> {
        self.get_capabilities(MapService::Wms, WMS_PATH).await
    }

    /// Capabilities of `service` served at `path`.
    #[tracing::instrument(skip(self))]
    pub async fn get_capabilities(&self, service: MapService, path: &str) -> Result<Capabilities> {
        let query = [
            ("SERVICE", service.as_str()),
            ("REQUEST", "GetCapabilities"),
            ("VERSION", service.version()),
        ];
        let response = self.get_with_query(path, &query).await?;

        let url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let document = response.text().await?;
        tracing::debug!(%url, len = document.len(), "fetched capabilities");

        Ok(Capabilities {
            service,
            version: service.version().to_string(),
            url,
            content_type,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_parameters() {
        assert_eq!(MapService::Wmts.as_str(), "WMTS");
        assert_eq!(MapService::Wmts.version(), "1.0.0");
        assert_eq!(MapService::Wms.to_string(), "WMS");
        assert_eq!(MapService::Wms.version(), "1.1.1");
        assert_eq!(MapService::Wms.default_path(), WMS_PATH);
    }

    #[test]
    fn test_exception_report_detected() {
        let caps = Capabilities {
            service: MapService::Wms,
            version: "1.1.1".to_string(),
            url: "https://hub/titiler/core/wms".to_string(),
            content_type: Some("application/vnd.ogc.se_xml".to_string()),
            document: "<ServiceExceptionReport><ServiceException/></ServiceExceptionReport>"
                .to_string(),
        };
        assert!(caps.is_exception());
    }
}
