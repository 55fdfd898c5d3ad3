use serde::{Deserialize, Serialize};

/// Activity codes (CNAE) of segments with high electricity consumption.
pub const DEFAULT_HIGH_CONSUMPTION_CODES: &[&str] = &[
    "4721-1/01", "4721-1/02", "4721-1/03", "4722-0/00", "9311-5/01", "8690-3/01", "1011-2/01",
    "1011-2/02", "1012-1/00", "1013-9/00", "1020-1/00", "1031-7/00", "1032-5/00", "1041-4/00",
    "1042-2/00", "1051-1/00", "1061-9/00", "1062-7/00", "1063-5/00", "1064-3/00", "1071-6/00",
    "1072-4/00", "1081-3/00", "1082-1/00", "1091-0/00", "1092-8/00", "1093-6/00", "1094-4/00",
    "1095-2/00", "1096-1/00", "1097-9/00", "1099-5/00", "1100-2/00", "1101-1/00", "1102-9/00",
    "1103-7/00", "1104-5/00", "1105-3/00", "1200-7/00", "1300-1/00", "1400-4/00", "1500-7/00",
    "1600-0/00", "1700-3/00", "1800-6/00", "1900-9/00", "2000-1/00", "2100-4/00", "2200-7/00",
    "2300-0/00", "2400-3/00", "2500-6/00", "2600-9/00", "2700-2/00", "2800-5/00", "2900-8/00",
    "3000-0/00", "3100-3/00", "3200-6/00", "3300-9/00", "3500-5/00", "3600-8/00", "3700-1/00",
    "3800-4/00", "3900-7/00", "4100-0/00", "4200-3/00", "4300-6/00", "4500-1/00", "4600-4/00",
    "4700-7/00", "4900-1/00", "5000-4/00", "5100-7/00", "5200-0/00", "5300-3/00", "5500-7/00",
    "5600-0/00", "5800-4/00", "5900-7/00", "6000-0/00", "6100-3/00", "6200-6/00", "6300-9/00",
    "6400-2/00", "6500-5/00", "6600-8/00", "6800-2/00", "6900-5/00", "7000-8/00", "7100-1/00",
    "7200-4/00", "7300-7/00", "7400-0/00", "7500-3/00", "7700-6/00", "7800-9/00", "7900-2/00",
    "8000-5/00", "8100-8/00", "8200-1/00", "8500-9/00", "8600-2/00", "8700-5/00", "8800-8/00",
    "9000-1/00", "9100-4/00", "9200-7/00", "9300-0/00", "9400-3/00", "9500-6/00", "9600-9/00",
    "9700-2/00", "9900-8/00",
];

const DEFAULT_LOW_THRESHOLD: u32 = 1;
const DEFAULT_MEDIUM_THRESHOLD: u32 = 3;
const DEFAULT_HIGH_THRESHOLD: u32 = 5;

/// Number of leading digits compared when matching activity codes.
pub(crate) const SIGNIFICANT_DIGITS: usize = 4;

/// Validation errors raised while building a qualification configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualificationConfigError {
    #[error("industry code '{0}' must carry at least 4 digits")]
    IndustryCode(String),
    #[error("level thresholds must satisfy 1 <= low < medium < high (got {low}/{medium}/{high})")]
    Thresholds { low: u32, medium: u32, high: u32 },
}

/// Score cut-offs separating the qualification levels.
///
/// Every score lands in exactly one level: `[0, low)` is unqualified, `[low, medium)` low,
/// `[medium, high)` medium and `[high, ..)` high. A lead is qualified from `medium` upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThresholds {
    low: u32,
    medium: u32,
    high: u32,
}

impl LevelThresholds {
    pub fn new(low: u32, medium: u32, high: u32) -> Result<Self, QualificationConfigError> {
        if low == 0 || low >= medium || medium >= high {
            return Err(QualificationConfigError::Thresholds { low, medium, high });
        }

        Ok(Self { low, medium, high })
    }

    pub const fn low(self) -> u32 {
        self.low
    }

    pub const fn medium(self) -> u32 {
        self.medium
    }

    pub const fn high(self) -> u32 {
        self.high
    }

    pub const fn qualification_threshold(self) -> u32 {
        self.medium
    }
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_THRESHOLD,
            medium: DEFAULT_MEDIUM_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

/// Immutable rubric handed to the qualification engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualificationConfig {
    industry_codes: Vec<String>,
    #[serde(skip)]
    industry_prefixes: Vec<String>,
    thresholds: LevelThresholds,
}

impl QualificationConfig {
    pub fn new<I, S>(
        industry_codes: I,
        thresholds: LevelThresholds,
    ) -> Result<Self, QualificationConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut codes = Vec::new();
        let mut prefixes = Vec::new();

        for code in industry_codes {
            let code = code.into().trim().to_string();
            let prefix = significant_prefix(&code)
                .ok_or_else(|| QualificationConfigError::IndustryCode(code.clone()))?;
            if !prefixes.contains(&prefix) {
                prefixes.push(prefix);
            }
            codes.push(code);
        }

        Ok(Self {
            industry_codes: codes,
            industry_prefixes: prefixes,
            thresholds,
        })
    }

    /// Same industry list under different level thresholds.
    pub fn with_thresholds(mut self, thresholds: LevelThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn industry_codes(&self) -> &[String] {
        &self.industry_codes
    }

    pub fn thresholds(&self) -> LevelThresholds {
        self.thresholds
    }

    pub(crate) fn matches_industry(&self, code: &str) -> bool {
        match significant_prefix(code) {
            Some(prefix) => self.industry_prefixes.iter().any(|known| *known == prefix),
            None => false,
        }
    }
}

impl Default for QualificationConfig {
    fn default() -> Self {
        let prefixes = DEFAULT_HIGH_CONSUMPTION_CODES
            .iter()
            .filter_map(|code| significant_prefix(code))
            .fold(Vec::new(), |mut acc, prefix| {
                if !acc.contains(&prefix) {
                    acc.push(prefix);
                }
                acc
            });

        Self {
            industry_codes: DEFAULT_HIGH_CONSUMPTION_CODES
                .iter()
                .map(|code| code.to_string())
                .collect(),
            industry_prefixes: prefixes,
            thresholds: LevelThresholds::default(),
        }
    }
}

/// First four digits of an activity code, ignoring separators.
pub(crate) fn significant_prefix(code: &str) -> Option<String> {
    let prefix: String = code
        .chars()
        .filter(char::is_ascii_digit)
        .take(SIGNIFICANT_DIGITS)
        .collect();

    (prefix.len() == SIGNIFICANT_DIGITS).then_some(prefix)
}
