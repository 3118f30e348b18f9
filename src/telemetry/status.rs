//! Terminal status: obstruction wedges and device identity

use serde::{Deserialize, Serialize};

use super::de::{flexible_u64, nullable_f64_vec, one_or_many};

/// Status section of a snapshot, one entry per observed status poll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishStatus {
    #[serde(default, deserialize_with = "one_or_many")]
    pub obstruction_stats: Vec<ObstructionStats>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub device_info: Vec<DeviceInfo>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub device_state: Vec<DeviceState>,
}

/// Obstruction fractions around the sky, wedge 0 facing north
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstructionStats {
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    pub wedge_fraction_obstructed: Vec<f64>,
    #[serde(default)]
    pub fraction_obstructed: Option<f64>,
    #[serde(default)]
    pub currently_obstructed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub hardware_version: Option<String>,
    #[serde(default)]
    pub software_version: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    #[serde(default, deserialize_with = "flexible_u64")]
    pub uptime_s: Option<u64>,
}

impl DishStatus {
    /// Most recent obstruction entry
    pub fn latest_obstruction(&self) -> Option<&ObstructionStats> {
        self.obstruction_stats.last()
    }

    /// Per-wedge maximum across every obstruction entry
    ///
    /// The wedge count follows the latest entry; older entries with fewer
    /// wedges contribute only the wedges they have. NaN entries are skipped.
    pub fn max_wedges(&self) -> Vec<f64> {
        let Some(latest) = self.latest_obstruction() else {
            return Vec::new();
        };

        (0..latest.wedge_fraction_obstructed.len())
            .map(|i| {
                self.obstruction_stats
                    .iter()
                    .filter_map(|s| s.wedge_fraction_obstructed.get(i).copied())
                    .filter(|v| !v.is_nan())
                    .fold(0.0, f64::max)
            })
            .collect()
    }

    /// Latest reported device identity
    pub fn latest_device_info(&self) -> Option<&DeviceInfo> {
        self.device_info.last()
    }

    /// Latest reported uptime in seconds
    pub fn uptime_secs(&self) -> Option<u64> {
        self.device_state.last().and_then(|s| s.uptime_s)
    }
}

/// Format an uptime as `3d 4h 05m`
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h {:02}m", days, hours, minutes)
    } else {
        format!("{}h {:02}m", hours, minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_wedges() {
        let json = r#"{
            "obstructionStats": [
                {"wedgeFractionObstructed": [0.1, 0.0, 0.3]},
                {"wedgeFractionObstructed": [0.0, 0.2, null]}
            ]
        }"#;
        let status: DishStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.max_wedges(), vec![0.1, 0.2, 0.3]);
        assert_eq!(
            status.latest_obstruction().unwrap().wedge_fraction_obstructed[1],
            0.2
        );
    }

    #[test]
    fn test_no_obstruction_stats() {
        let status = DishStatus::default();
        assert!(status.max_wedges().is_empty());
        assert!(status.latest_obstruction().is_none());
    }

    #[test]
    fn test_single_object_fields() {
        let json = r#"{
            "deviceInfo": {"id": "ut01", "softwareVersion": "2026.10.1"},
            "deviceState": {"uptimeS": "93784"}
        }"#;
        let status: DishStatus = serde_json::from_str(json).unwrap();
        assert_eq!(
            status.latest_device_info().and_then(|d| d.software_version.as_deref()),
            Some("2026.10.1")
        );
        assert_eq!(status.uptime_secs(), Some(93_784));
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(93_784), "1d 2h 03m");
        assert_eq!(format_uptime(3_600 * 5 + 60 * 7), "5h 07m");
    }
}
