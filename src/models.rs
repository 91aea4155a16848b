use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// The five daily prayers, in day order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Prayer that follows this one, wrapping Isha -> Fajr.
    pub fn next(self) -> Prayer {
        Prayer::ALL[(self.index() + 1) % Prayer::ALL.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Prayer::Fajr => "🌅",
            Prayer::Dhuhr => "☀️",
            Prayer::Asr => "🌤️",
            Prayer::Maghrib => "🌅",
            Prayer::Isha => "🌙",
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prayer {
    type Err = String;

    // accepts "Asr", "asr", "ASR"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prayer::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown prayer: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub country: String,
}

impl Location {
    pub fn fallback() -> Self {
        Location {
            city: "Dhaka".to_string(),
            country: "Bangladesh".to_string(),
        }
    }
}

// Calculation preferences forwarded to the timings API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalcSettings {
    pub method: i64,     // aladhan method id, 1 = Karachi
    pub school: i64,     // 0 = standard, 1 = Hanafi
    pub adjustment: i64, // Hijri day offset
}

impl Default for CalcSettings {
    fn default() -> Self {
        CalcSettings {
            method: 1,
            school: 1,
            adjustment: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Bn,
}

// ---- remote API shapes (also the cached form) ----

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HijriMonth {
    pub number: u32,
    #[serde(default)]
    pub en: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HijriDate {
    pub day: String,
    pub month: HijriMonth,
    pub year: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GregorianDate {
    pub date: String, // "DD-MM-YYYY"
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateInfo {
    #[serde(default)]
    pub readable: String,
    pub gregorian: Option<GregorianDate>,
    pub hijri: Option<HijriDate>,
}

// One day of timings as returned by the timings API, e.g. "Fajr": "05:00 (+06)".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayTimings {
    pub timings: BTreeMap<String, String>,
    pub date: DateInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ayah {
    pub arabic: String,
    pub translation: String,
    pub surah_name: String,
    pub surah_number: u32,
    pub number_in_surah: u32,
}
