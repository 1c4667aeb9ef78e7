use serde::{Deserialize, Deserializer};

/// A survey mark as returned by the data explorer `bounds` query.
///
/// The service is loose about numeric fields (sometimes strings, sometimes
/// numbers, sometimes blank), so every number goes through
/// [`lenient_f64`].
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyMark {
    /// Permanent identifier, e.g. `KV0123`.
    pub pid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_f64_required")]
    pub lat: f64,
    #[serde(deserialize_with = "lenient_f64_required")]
    pub lon: f64,
    #[serde(rename = "ellipHeight", default, deserialize_with = "lenient_f64")]
    pub ellip_height: Option<f64>,
    #[serde(rename = "orthoHt", default, deserialize_with = "lenient_f64")]
    pub ortho_height: Option<f64>,
    /// Horizontal accuracy in meters when the mark publishes one.
    #[serde(
        rename = "horizAccuracy",
        alias = "accuracy",
        default,
        deserialize_with = "lenient_f64"
    )]
    pub horiz_accuracy: Option<f64>,
    #[serde(rename = "markerType", alias = "marker", default)]
    pub marker_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SurveyMark {
    /// Ellipsoid height when published, orthometric height otherwise.
    pub fn elevation(&self) -> Option<f64> {
        self.ellip_height.or(self.ortho_height)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<NumberOrString> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn lenient_f64_required<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_f64(deserializer)?.ok_or_else(|| serde::de::Error::custom("expected a coordinate"))
}
