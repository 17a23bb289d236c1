//! Geolocation status readout

use std::fmt;

use super::entities::GeoCoord;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GeoStatus {
    #[default]
    Initializing,
    Online(GeoCoord),
    /// Permission denied, no API, timeout, ...
    Unavailable(String),
}

impl GeoStatus {
    /// Last fix, if any
    pub fn coord(&self) -> Option<GeoCoord> {
        match self {
            GeoStatus::Online(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for GeoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoStatus::Initializing => f.write_str("GPS: Initializing..."),
            GeoStatus::Online(c) => write!(f, "GPS: {:.4}, {:.4} ONLINE", c.lat, c.lon),
            GeoStatus::Unavailable(reason) => write!(f, "GPS: OFFLINE ({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(GeoStatus::Initializing.to_string(), "GPS: Initializing...");
        let online = GeoStatus::Online(GeoCoord { lat: 12.34561, lon: 65.43209 });
        assert_eq!(online.to_string(), "GPS: 12.3456, 65.4321 ONLINE");
        assert_eq!(
            GeoStatus::Unavailable("permission denied".into()).to_string(),
            "GPS: OFFLINE (permission denied)"
        );
        assert!(GeoStatus::Unavailable(String::new()).coord().is_none());
    }
}
