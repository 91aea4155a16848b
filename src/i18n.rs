use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Language, Prayer};

pub const HIJRI_MONTHS_BN: [&str; 12] = [
    "মুহাররম",
    "সফর",
    "রবিউল আউয়াল",
    "রবিউস সানি",
    "জমাদিউল আউয়াল",
    "জমাদিউস সানি",
    "রজব",
    "শাবান",
    "রমজান",
    "শাওয়াল",
    "জিলকদ",
    "জিলহজ",
];

const BENGALI_DIGITS: [char; 10] = ['০', '১', '২', '৩', '৪', '৫', '৬', '৭', '৮', '৯'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageId {
    AppTitle,
    Now,
    Remaining,
    TimeRemaining,
    SehriEnds,
    Iftar,
    TodaysSchedule,
    NewVerse,
    ChangeLocation,
    Save,
    Cancel,
    PrayerNotifications,
    NotificationDesc,
    EnableNotifications,
    To,
    NotificationHint,
    NotificationError,
    TimeForPrayer,
    FocusPrayer,
    SettingsTitle,
    SettingsDesc,
    CalcMethod,
    AsrMethod,
    Standard,
    Hanafi,
    HijriAdj,
    HijriAdjHint,
    SaveSettings,
    LocationRequired,
}

impl MessageId {
    pub const ALL: [MessageId; 29] = [
        MessageId::AppTitle,
        MessageId::Now,
        MessageId::Remaining,
        MessageId::TimeRemaining,
        MessageId::SehriEnds,
        MessageId::Iftar,
        MessageId::TodaysSchedule,
        MessageId::NewVerse,
        MessageId::ChangeLocation,
        MessageId::Save,
        MessageId::Cancel,
        MessageId::PrayerNotifications,
        MessageId::NotificationDesc,
        MessageId::EnableNotifications,
        MessageId::To,
        MessageId::NotificationHint,
        MessageId::NotificationError,
        MessageId::TimeForPrayer,
        MessageId::FocusPrayer,
        MessageId::SettingsTitle,
        MessageId::SettingsDesc,
        MessageId::CalcMethod,
        MessageId::AsrMethod,
        MessageId::Standard,
        MessageId::Hanafi,
        MessageId::HijriAdj,
        MessageId::HijriAdjHint,
        MessageId::SaveSettings,
        MessageId::LocationRequired,
    ];
}

// Every (language, message) pair has a string, so lookups never fail.
pub fn text(lang: Language, id: MessageId) -> &'static str {
    use MessageId::*;
    match lang {
        Language::En => match id {
            AppTitle => "Prayer Times",
            Now => "Now",
            Remaining => "Remaining",
            TimeRemaining => "Time Remaining",
            SehriEnds => "Sehri Ends",
            Iftar => "Iftar",
            TodaysSchedule => "Today's Schedule",
            NewVerse => "New Verse",
            ChangeLocation => "Change Location",
            Save => "Save",
            Cancel => "Cancel",
            PrayerNotifications => "🔔 Prayer Notifications",
            NotificationDesc => "Set your preferred notification time for each prayer.",
            EnableNotifications => "Enable Notifications",
            To => "to",
            NotificationHint => "Leave times empty to skip notification for that prayer.",
            NotificationError => "Please enter times within each prayer's window.",
            TimeForPrayer => "Time for Prayer",
            FocusPrayer => "Focus on your prayer",
            SettingsTitle => "Settings",
            SettingsDesc => "Customize your prayer calculation methods.",
            CalcMethod => "Calculation Method",
            AsrMethod => "Asr Method",
            Standard => "Others",
            Hanafi => "Hanafi",
            HijriAdj => "Hijri Date Adjustment",
            HijriAdjHint => "Adjust date by +/- days if needed.",
            SaveSettings => "Save Settings",
            LocationRequired => "Please enter both city and country",
        },
        Language::Bn => match id {
            AppTitle => "নামাজের সময়সূচি",
            Now => "এখন",
            Remaining => "বাকি",
            TimeRemaining => "বাকি সময়",
            SehriEnds => "সেহরির শেষ সময়",
            Iftar => "ইফতার",
            TodaysSchedule => "আজকের সময়সূচি",
            NewVerse => "নতুন আয়াত",
            ChangeLocation => "অবস্থান পরিবর্তন করুন",
            Save => "সংরক্ষণ করুন",
            Cancel => "বাতিল করুন",
            PrayerNotifications => "🔔 নামাজের নোটিফিকেশন",
            NotificationDesc => "প্রতিটি নামাজের জন্য নোটিফিকেশনের সময় নির্ধারণ করুন।",
            EnableNotifications => "নোটিফিকেশন চালু করুন",
            To => "থেকে",
            NotificationHint => "কোনো নামাজের নোটিফিকেশন না চাইলে সময় খালি রাখুন।",
            NotificationError => "অনুগ্রহ করে নামাজের নির্ধারিত সময়সীমার মধ্যে সময় দিন।",
            TimeForPrayer => "নামাজের সময় হয়েছে",
            FocusPrayer => "নামাজে মনোযোগ দিন",
            SettingsTitle => "সেটিংস",
            SettingsDesc => "নামাজের সময় গণনার পদ্ধতি কাস্টমাইজ করুন।",
            CalcMethod => "গণনার পদ্ধতি",
            AsrMethod => "আসর গণনার পদ্ধতি",
            Standard => "অন্যান্য",
            Hanafi => "হানাফি",
            HijriAdj => "হিজরি তারিখ সমন্বয়",
            HijriAdjHint => "প্রয়োজনে তারিখ ± দিনের মাধ্যমে ঠিক করুন।",
            SaveSettings => "সেটিংস সংরক্ষণ করুন",
            LocationRequired => "অনুগ্রহ করে শহর এবং দেশ দুটোই লিখুন",
        },
    }
}

pub fn prayer_name(lang: Language, prayer: Prayer) -> &'static str {
    match (lang, prayer) {
        (Language::En, p) => p.as_str(),
        (Language::Bn, Prayer::Fajr) => "ফজর",
        (Language::Bn, Prayer::Dhuhr) => "যোহর",
        (Language::Bn, Prayer::Asr) => "আসর",
        (Language::Bn, Prayer::Maghrib) => "মাগরিব",
        (Language::Bn, Prayer::Isha) => "ইশা",
    }
}

// ASCII digits -> Bengali digits when the language asks for it.
pub fn localize_digits(lang: Language, s: &str) -> String {
    match lang {
        Language::En => s.to_string(),
        Language::Bn => s
            .chars()
            .map(|c| match c.to_digit(10) {
                Some(d) => BENGALI_DIGITS[d as usize],
                None => c,
            })
            .collect(),
    }
}

/// Every message for one language, keyed by its camelCase id in JSON.
pub fn all_texts(lang: Language) -> BTreeMap<MessageId, &'static str> {
    MessageId::ALL.into_iter().map(|id| (id, text(lang, id))).collect()
}
