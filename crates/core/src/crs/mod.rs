//! Coordinate Reference System handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// WKT for WGS84, the only CRS we can describe without a projection database.
const WGS84_WKT: &str = "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563,AUTHORITY[\"EPSG\",\"7030\"]],AUTHORITY[\"EPSG\",\"6326\"]],PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],AUTHORITY[\"EPSG\",\"4326\"]]";

/// A CRS as far as the bridge needs one: enough to write a `.prj` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    wkt: Option<String>,
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string
    ///
    /// The EPSG code is picked up from a trailing `AUTHORITY["EPSG","<code>"]`
    /// clause when present.
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        let wkt = wkt.into();
        let epsg = trailing_epsg_authority(&wkt);
        Self {
            wkt: Some(wkt),
            epsg,
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Well-known-text serialization, as written to `.prj` sidecars.
    ///
    /// Returns `None` when the CRS was only given as an EPSG code we have no
    /// definition for.
    pub fn to_wkt(&self) -> Option<String> {
        if let Some(wkt) = &self.wkt {
            return Some(wkt.clone());
        }
        match self.epsg {
            Some(4326) => Some(WGS84_WKT.to_string()),
            _ => None,
        }
    }

    /// Short label: `EPSG:<code>`, else the start of the WKT.
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let end = wkt
                .char_indices()
                .nth(50)
                .map(|(i, _)| i)
                .unwrap_or(wkt.len());
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }
}

/// Last `AUTHORITY["EPSG","<code>"]` in a WKT string, which names the CRS itself.
fn trailing_epsg_authority(wkt: &str) -> Option<u32> {
    const MARKER: &str = "AUTHORITY[\"EPSG\",\"";
    let start = wkt.rfind(MARKER)? + MARKER.len();
    let rest = &wkt[start..];
    let end = rest.find('"')?;
    rest[..end].parse().ok()
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}
