//! Nearby libraries
//!
//! A directory of physical libraries with their coordinates. Distances use
//! the haversine formula on a spherical Earth.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Search radius must be a positive number of kilometres, got {0}")]
    InvalidRadius(f64),

    #[error("Failed to read libraries '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Libraries file '{path}' is not a JSON array of libraries: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Library '{0}' has invalid coordinates")]
    BadEntry(String),

    #[error("Unknown platform '{0}'. Valid: android, apple")]
    UnknownPlatform(String),
}

/// A validated latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LibraryError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(LibraryError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in kilometres
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// A physical library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub opening_hours: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Library {
    pub fn coordinates(&self) -> Result<Coordinates, LibraryError> {
        Coordinates::new(self.latitude, self.longitude)
            .map_err(|_| LibraryError::BadEntry(self.id.clone()))
    }
}

/// A library with its distance from the search origin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyLibrary {
    #[serde(flatten)]
    pub library: Library,
    pub distance_km: f64,
}

/// Map application flavour for route links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutePlatform {
    #[default]
    Android,
    Apple,
}

impl FromStr for RoutePlatform {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "android" | "geo" => Ok(RoutePlatform::Android),
            "apple" | "ios" | "maps" => Ok(RoutePlatform::Apple),
            _ => Err(LibraryError::UnknownPlatform(s.to_string())),
        }
    }
}

/// Link that opens turn-by-turn directions to `library`
pub fn route_url(library: &Library, platform: RoutePlatform) -> String {
    let name = encode_component(&library.name);
    match platform {
        RoutePlatform::Android => format!(
            "geo:0,0?q={},{}({})",
            library.latitude, library.longitude, name
        ),
        RoutePlatform::Apple => format!(
            "maps:0,0?q={}@{},{}",
            name, library.latitude, library.longitude
        ),
    }
}

// Percent-encode everything outside the RFC 3986 unreserved set
fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// All known libraries
#[derive(Debug, Clone, Default)]
pub struct LibraryDirectory {
    libraries: Vec<Library>,
}

impl LibraryDirectory {
    /// Build a directory, rejecting entries with out-of-range coordinates
    pub fn new(libraries: Vec<Library>) -> Result<Self, LibraryError> {
        for library in &libraries {
            library.coordinates()?;
        }
        Ok(Self { libraries })
    }

    /// Load a directory from a JSON file
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let content = std::fs::read_to_string(path).map_err(|source| LibraryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let libraries = serde_json::from_str(&content).map_err(|source| LibraryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(libraries)
    }

    pub fn get(&self, id: &str) -> Option<&Library> {
        self.libraries.iter().find(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Libraries within `radius_km` of `origin`, closest first
    pub fn nearby(
        &self,
        origin: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<NearbyLibrary>, LibraryError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(LibraryError::InvalidRadius(radius_km));
        }

        let mut found = Vec::new();
        for library in &self.libraries {
            let distance_km = origin.distance_km(&library.coordinates()?);
            if distance_km <= radius_km {
                found.push(NearbyLibrary {
                    library: library.clone(),
                    distance_km,
                });
            }
        }
        found.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(found)
    }
}
