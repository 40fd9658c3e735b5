//! Asia-Pacific country reference tables: display names, UN M49 subregions
//! and World Bank income groups.

pub const SOUTHERN_ASIA: &str = "Southern Asia";
pub const SOUTH_EASTERN_ASIA: &str = "South-eastern Asia";
pub const EASTERN_ASIA: &str = "Eastern Asia";
pub const AUSTRALIA_NEW_ZEALAND: &str = "Australia and New Zealand";
pub const MELANESIA: &str = "Melanesia";
pub const MICRONESIA: &str = "Micronesia";
pub const POLYNESIA: &str = "Polynesia";

pub const LOW_INCOME: &str = "Low income";
pub const LOWER_MIDDLE_INCOME: &str = "Lower middle income";
pub const UPPER_MIDDLE_INCOME: &str = "Upper middle income";
pub const HIGH_INCOME: &str = "High income";

pub const SUBREGION_REGION: &[(&str, &str)] = &[
    (SOUTHERN_ASIA, "Asia"),
    (SOUTH_EASTERN_ASIA, "Asia"),
    (EASTERN_ASIA, "Asia"),
    (AUSTRALIA_NEW_ZEALAND, "Oceania"),
    (MELANESIA, "Oceania"),
    (MICRONESIA, "Oceania"),
    (POLYNESIA, "Oceania"),
];

/// iso, display name, subregion, income group.
/// Economies without a World Bank classification carry no income group.
pub const COUNTRY_TABLE: &[(&str, &str, &str, Option<&str>)] = &[
    ("AFG", "Afghanistan", SOUTHERN_ASIA, Some(LOW_INCOME)),
    ("AUS", "Australia", AUSTRALIA_NEW_ZEALAND, Some(HIGH_INCOME)),
    ("BGD", "Bangladesh", SOUTHERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("BTN", "Bhutan", SOUTHERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("BRN", "Brunei", SOUTH_EASTERN_ASIA, Some(HIGH_INCOME)),
    ("KHM", "Cambodia", SOUTH_EASTERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("KOR", "Republic of Korea (South Korea)", EASTERN_ASIA, Some(HIGH_INCOME)),
    ("PRK", "Democratic People's Republic of Korea (North Korea)", EASTERN_ASIA, Some(LOW_INCOME)),
    ("IND", "India", SOUTHERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("IDN", "Indonesia", SOUTH_EASTERN_ASIA, Some(UPPER_MIDDLE_INCOME)),
    ("JPN", "Japan", EASTERN_ASIA, Some(HIGH_INCOME)),
    ("LAO", "Laos", SOUTH_EASTERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("MYS", "Malaysia", SOUTH_EASTERN_ASIA, Some(UPPER_MIDDLE_INCOME)),
    ("MDV", "Maldives", SOUTHERN_ASIA, Some(UPPER_MIDDLE_INCOME)),
    ("MNG", "Mongolia", EASTERN_ASIA, Some(UPPER_MIDDLE_INCOME)),
    ("MMR", "Myanmar", SOUTH_EASTERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("NPL", "Nepal", SOUTHERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("NZL", "New Zealand", AUSTRALIA_NEW_ZEALAND, Some(HIGH_INCOME)),
    ("PAK", "Pakistan", SOUTHERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("CHN", "China", EASTERN_ASIA, Some(UPPER_MIDDLE_INCOME)),
    ("PHL", "Philippines", SOUTH_EASTERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("SGP", "Singapore", SOUTH_EASTERN_ASIA, Some(HIGH_INCOME)),
    ("LKA", "Sri Lanka", SOUTHERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("TWN", "Taiwan", EASTERN_ASIA, Some(HIGH_INCOME)),
    ("THA", "Thailand", SOUTH_EASTERN_ASIA, Some(UPPER_MIDDLE_INCOME)),
    ("TLS", "Timor-Leste", SOUTH_EASTERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("VNM", "Vietnam", SOUTH_EASTERN_ASIA, Some(LOWER_MIDDLE_INCOME)),
    ("NCL", "New Caledonia", MELANESIA, Some(HIGH_INCOME)),
    ("COK", "Cook Islands", POLYNESIA, None),
    ("FSM", "Micronesia", MICRONESIA, Some(LOWER_MIDDLE_INCOME)),
    ("PNG", "Papua New Guinea", MELANESIA, Some(LOWER_MIDDLE_INCOME)),
    ("WSM", "Samoa", POLYNESIA, Some(LOWER_MIDDLE_INCOME)),
    ("TON", "Tonga", POLYNESIA, Some(UPPER_MIDDLE_INCOME)),
    ("NIU", "Niue", POLYNESIA, None),
    ("FJI", "Fiji", MELANESIA, Some(UPPER_MIDDLE_INCOME)),
    ("KIR", "Kiribati", MICRONESIA, Some(LOWER_MIDDLE_INCOME)),
    ("MHL", "Marshall Islands", MICRONESIA, Some(UPPER_MIDDLE_INCOME)),
    ("NRU", "Nauru", MICRONESIA, Some(HIGH_INCOME)),
    ("PLW", "Palau", MICRONESIA, Some(HIGH_INCOME)),
    ("VUT", "Vanuatu", MELANESIA, Some(LOWER_MIDDLE_INCOME)),
    ("SLB", "Solomon Islands", MELANESIA, Some(LOWER_MIDDLE_INCOME)),
    ("TUV", "Tuvalu", POLYNESIA, Some(UPPER_MIDDLE_INCOME)),
    ("HKG", "Hong Kong", EASTERN_ASIA, Some(HIGH_INCOME)),
    ("TKL", "Tokelau", POLYNESIA, None),
    ("WLF", "Wallis and Futuna Islands", POLYNESIA, None),
    ("MNP", "Northern Mariana Islands", MICRONESIA, Some(HIGH_INCOME)),
    ("ASM", "American Samoa", POLYNESIA, Some(HIGH_INCOME)),
    ("PYF", "French Polynesia", POLYNESIA, Some(HIGH_INCOME)),
];
