use serde::de::DeserializeOwned;

use crate::error::StoreError;
use crate::models::{CalcSettings, Language, Location};
use crate::store::{
    remove_prefixed, KvStore, CACHE_KEY, CALENDAR_CACHE_KEY, LANG_KEY, LOCATION_KEY, SETTINGS_KEY,
};

fn read_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let text = store.get(key)?;
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("ignoring unreadable '{key}': {e}");
            None
        }
    }
}

pub fn saved_location(store: &dyn KvStore) -> Option<Location> {
    read_json(store, LOCATION_KEY)
}

// Saved location, or the fixed fallback when nothing usable is stored.
pub fn location_or_fallback(store: &dyn KvStore) -> Location {
    saved_location(store).unwrap_or_else(Location::fallback)
}

/// Trims both fields; `None` when either is blank.
pub fn clean_location(city: &str, country: &str) -> Option<Location> {
    let (city, country) = (city.trim(), country.trim());
    if city.is_empty() || country.is_empty() {
        return None;
    }
    Some(Location {
        city: city.to_string(),
        country: country.to_string(),
    })
}

pub fn save_location(store: &dyn KvStore, location: &Location) -> Result<(), StoreError> {
    store.set(LOCATION_KEY, serde_json::to_string(location)?)
}

pub fn calc_settings(store: &dyn KvStore) -> CalcSettings {
    read_json(store, SETTINGS_KEY).unwrap_or_default()
}

// New calculation settings invalidate every cached schedule and calendar month.
pub fn save_calc_settings(store: &dyn KvStore, settings: &CalcSettings) -> Result<(), StoreError> {
    store.set(SETTINGS_KEY, serde_json::to_string(settings)?)?;
    let dropped = remove_prefixed(store, CACHE_KEY)? + remove_prefixed(store, CALENDAR_CACHE_KEY)?;
    log::info!("calculation settings saved, dropped {dropped} cached entries");
    Ok(())
}

pub fn language(store: &dyn KvStore) -> Language {
    read_json(store, LANG_KEY).unwrap_or_default()
}

pub fn save_language(store: &dyn KvStore, lang: Language) -> Result<(), StoreError> {
    store.set(LANG_KEY, serde_json::to_string(&lang)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn missing_location_falls_back_to_dhaka() {
        let store = MemoryStore::default();
        assert_eq!(saved_location(&store), None);
        assert_eq!(location_or_fallback(&store), Location::fallback());
    }

    #[test]
    fn blank_location_fields_are_rejected() {
        assert_eq!(clean_location("  ", "France"), None);
        assert_eq!(
            clean_location(" Paris ", "France "),
            Some(Location {
                city: "Paris".into(),
                country: "France".into()
            })
        );
    }

    #[test]
    fn calc_settings_default_and_clear_caches() {
        let store = MemoryStore::default();
        assert_eq!(calc_settings(&store), CalcSettings::default());

        store.set("prayerTimesCache_Dhaka_Bangladesh_2026-03-10", "{}".into()).unwrap();
        store.set("calendar_cache_2026_3_Dhaka_Bangladesh", "[]".into()).unwrap();
        let hanafi_off = CalcSettings {
            method: 2,
            school: 0,
            adjustment: -1,
        };
        save_calc_settings(&store, &hanafi_off).unwrap();

        assert_eq!(calc_settings(&store), hanafi_off);
        assert_eq!(store.keys(), vec![SETTINGS_KEY.to_string()]);
    }

    #[test]
    fn language_round_trips() {
        let store = MemoryStore::default();
        assert_eq!(language(&store), Language::En);
        save_language(&store, Language::Bn).unwrap();
        assert_eq!(language(&store), Language::Bn);
    }
}
