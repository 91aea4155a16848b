use std::time::Duration;

use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize};

use crate::error::FetchError;
use crate::models::{Ayah, CalcSettings, DayTimings, Language, Location};

pub const TOTAL_QURAN_VERSES: u32 = 6236;

// Both aladhan and alquran wrap payloads as { "code": 200, "data": ... }.
#[derive(Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AyahEdition {
    text: String,
    number_in_surah: u32,
    surah: Surah,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Surah {
    number: u32,
    english_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Geocode {
    #[serde(default)]
    city: String,
    #[serde(default)]
    locality: String,
    #[serde(default)]
    country_name: String,
}

/// Client for the public timings, Quran and reverse-geocoding APIs.
#[derive(Clone)]
pub struct PrayerApiClient {
    http: reqwest::Client,
    aladhan_base: String,
    alquran_base: String,
    geocode_base: String,
}

impl PrayerApiClient {
    pub fn new(
        aladhan_base: &str,
        alquran_base: &str,
        geocode_base: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(PrayerApiClient {
            http,
            aladhan_base: aladhan_base.trim_end_matches('/').to_string(),
            alquran_base: alquran_base.trim_end_matches('/').to_string(),
            geocode_base: geocode_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_enveloped<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let envelope: Envelope = self.http.get(url).query(query).send().await?.json().await?;
        if envelope.code != 200 {
            return Err(FetchError::Api(envelope.code));
        }
        serde_json::from_value(envelope.data).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn location_query(location: &Location, calc: &CalcSettings) -> Vec<(&'static str, String)> {
        vec![
            ("city", location.city.clone()),
            ("country", location.country.clone()),
            ("method", calc.method.to_string()),
            ("school", calc.school.to_string()),
        ]
    }

    /// Today's timings for a city.
    pub async fn timings_by_city(
        &self,
        location: &Location,
        calc: &CalcSettings,
    ) -> Result<DayTimings, FetchError> {
        let url = format!("{}/v1/timingsByCity", self.aladhan_base);
        self.get_enveloped(url, &Self::location_query(location, calc)).await
    }

    /// Every day of one Gregorian month.
    pub async fn calendar_by_city(
        &self,
        year: i32,
        month: u32,
        location: &Location,
        calc: &CalcSettings,
    ) -> Result<Vec<DayTimings>, FetchError> {
        let url = format!("{}/v1/calendarByCity/{year}/{month}", self.aladhan_base);
        self.get_enveloped(url, &Self::location_query(location, calc)).await
    }

    pub async fn random_ayah(&self, lang: Language) -> Result<Ayah, FetchError> {
        let number = rand::thread_rng().gen_range(1..=TOTAL_QURAN_VERSES);
        self.ayah(number, lang).await
    }

    // Arabic text plus one translation edition.
    pub async fn ayah(&self, number: u32, lang: Language) -> Result<Ayah, FetchError> {
        let edition = match lang {
            Language::En => "en.sahih",
            Language::Bn => "bn.bengali",
        };
        let url = format!(
            "{}/v1/ayah/{number}/editions/quran-uthmani,{edition}",
            self.alquran_base
        );
        let editions: Vec<AyahEdition> = self.get_enveloped(url, &[]).await?;
        let mut editions = editions.into_iter();
        let (Some(arabic), Some(translation)) = (editions.next(), editions.next()) else {
            return Err(FetchError::Decode("expected two editions".to_string()));
        };

        Ok(Ayah {
            arabic: arabic.text,
            translation: translation.text,
            surah_name: translation.surah.english_name,
            surah_number: translation.surah.number,
            number_in_surah: translation.number_in_surah,
        })
    }

    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Location, FetchError> {
        let url = format!("{}/data/reverse-geocode-client", self.geocode_base);
        let geo: Geocode = self
            .http
            .get(url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("localityLanguage", "en".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let first_present = |options: [&str; 2]| {
            options
                .into_iter()
                .find(|s| !s.trim().is_empty())
                .unwrap_or("Unknown")
                .to_string()
        };

        Ok(Location {
            city: first_present([geo.city.as_str(), geo.locality.as_str()]),
            country: first_present([geo.country_name.as_str(), ""]),
        })
    }
}
