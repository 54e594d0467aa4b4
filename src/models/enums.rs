use serde::{Deserialize, Serialize};

/// Unknown value for a string-backed enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value for {field}: {value}")]
pub struct ParseEnumError {
    pub field: &'static str,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(MessageRole {
    User => "user",
    Assistant => "assistant",
});

str_enum!(SymptomCategory {
    Headache => "headache",
    Fever => "fever",
    Cough => "cough",
    Cold => "cold",
    Stomach => "stomach",
    Allergy => "allergy",
    Default => "default",
});

str_enum!(PatientStatus {
    Stable => "stable",
    Critical => "critical",
    Recovering => "recovering",
    Monitoring => "monitoring",
});

str_enum!(AppointmentStatus {
    Confirmed => "confirmed",
    Pending => "pending",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(ChatFlow {
    Patient => "patient",
    Clinician => "clinician",
});
