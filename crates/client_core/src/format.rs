//! Display formatting shared by front ends.

use shared::domain::TravelTime;

/// Average driving speed the backend assumes for travel-time estimates.
pub const AVERAGE_SPEED_KMH: f64 = 40.0;

pub fn format_computation_time(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("{:.2}ms", seconds * 1000.0)
    } else {
        format!("{seconds:.3}s")
    }
}

pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0}m", km * 1000.0)
    } else {
        format!("{km:.2}km")
    }
}

pub fn format_travel_time(travel_time: TravelTime) -> String {
    format!("{}h {}m", travel_time.hours, travel_time.minutes)
}

pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(ratio) => format!("{ratio:.2}x"),
        None => "n/a".to_string(),
    }
}

pub fn format_percent(percent: Option<f64>) -> String {
    match percent {
        Some(percent) => format!("{percent:.1}%"),
        None => "n/a".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficCondition {
    Light,
    Moderate,
    Heavy,
}

impl TrafficCondition {
    pub fn from_average_speed(kmh: f64) -> Self {
        if kmh > 35.0 {
            TrafficCondition::Light
        } else if kmh > 20.0 {
            TrafficCondition::Moderate
        } else {
            TrafficCondition::Heavy
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrafficCondition::Light => "Light Traffic",
            TrafficCondition::Moderate => "Moderate Traffic",
            TrafficCondition::Heavy => "Heavy Traffic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computation_time_switches_to_seconds_at_one_second() {
        assert_eq!(format_computation_time(0.002), "2.00ms");
        assert_eq!(format_computation_time(0.5), "500.00ms");
        assert_eq!(format_computation_time(1.0), "1.000s");
        assert_eq!(format_computation_time(2.3456), "2.346s");
    }

    #[test]
    fn distance_uses_meters_below_one_kilometer() {
        assert_eq!(format_distance(0.85), "850m");
        assert_eq!(format_distance(12.346), "12.35km");
    }

    #[test]
    fn travel_time_and_ratios_render_compactly() {
        assert_eq!(
            format_travel_time(TravelTime {
                hours: 1,
                minutes: 5
            }),
            "1h 5m"
        );
        assert_eq!(format_ratio(Some(5.0)), "5.00x");
        assert_eq!(format_ratio(None), "n/a");
        assert_eq!(format_percent(Some(250.0)), "250.0%");
    }

    #[test]
    fn traffic_condition_thresholds_are_exclusive() {
        assert_eq!(
            TrafficCondition::from_average_speed(AVERAGE_SPEED_KMH),
            TrafficCondition::Light
        );
        assert_eq!(
            TrafficCondition::from_average_speed(35.0),
            TrafficCondition::Moderate
        );
        assert_eq!(
            TrafficCondition::from_average_speed(20.0),
            TrafficCondition::Heavy
        );
    }
}
