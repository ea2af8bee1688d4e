//! Structured railway records.

use serde::{Deserialize, Serialize};

/// A train and its end-to-end route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    pub train_number: String,
    pub train_name: String,
    pub source_station_name: String,
    pub destination_station_name: String,
}

impl Train {
    pub fn new(
        train_number: impl Into<String>,
        train_name: impl Into<String>,
        source_station_name: impl Into<String>,
        destination_station_name: impl Into<String>,
    ) -> Self {
        Self {
            train_number: train_number.into(),
            train_name: train_name.into(),
            source_station_name: source_station_name.into(),
            destination_station_name: destination_station_name.into(),
        }
    }
}

impl std::fmt::Display for Train {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} | {} -> {}",
            self.train_number, self.train_name, self.source_station_name, self.destination_station_name
        )
    }
}

/// A station, keyed by its code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// One stop of a train's timetable. Many schedules reference one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub train_no: String,
    pub station_code: String,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default)]
    pub sequence: Option<i64>,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub source_station: Option<String>,
    #[serde(default)]
    pub destination_station: Option<String>,
}

/// What a lookup matches on. A train matches once per term it satisfies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTerms {
    /// Matched as substrings of the source or destination station name
    pub stations: Vec<String>,
    /// Matched exactly against the train number
    pub train_numbers: Vec<String>,
}

impl LookupTerms {
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty() && self.train_numbers.is_empty()
    }
}

/// The sample trains installed by `seed`.
pub fn sample_trains() -> Vec<Train> {
    [
        ("12951", "Rajdhani Express", "Mumbai Central", "New Delhi"),
        ("12952", "Rajdhani Express", "New Delhi", "Mumbai Central"),
        ("12009", "Shatabdi Express", "Mumbai Central", "Ahmedabad"),
        ("12010", "Shatabdi Express", "Ahmedabad", "Mumbai Central"),
        ("22222", "CSMT Rajdhani", "Mumbai CSMT", "Hazrat Nizamuddin"),
        ("11019", "Konark Express", "Mumbai CSMT", "Bhubaneswar"),
        ("12137", "Punjab Mail", "Mumbai CSMT", "Firozpur"),
        ("12617", "Mangala Lakshadweep", "Ernakulam", "Hazrat Nizamuddin"),
    ]
    .into_iter()
    .map(|(n, name, s, d)| Train::new(n, name, s, d))
    .collect()
}
