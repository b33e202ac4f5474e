use velo::stats::WpmSample;

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(samples: &[WpmSample], duration_secs: u32) -> (f64, f64) {
    let highest_wpm = samples.iter().map(|s| s.wpm).fold(0.0, f64::max);

    let overall_duration = samples
        .last()
        .map_or(duration_secs as f64, |s| s.t)
        .max(1.0);

    (overall_duration, highest_wpm.round())
}

/// Format a numeric axis label, dropping the fraction for whole numbers
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_params_without_samples_use_duration() {
        let (x, y) = compute_chart_params(&[], 30);
        assert_eq!(x, 30.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn chart_params_follow_samples() {
        let samples = [
            WpmSample::new(1.0, 20.0),
            WpmSample::new(2.0, 44.6),
            WpmSample::new(3.0, 41.0),
        ];
        assert_eq!(compute_chart_params(&samples, 60), (3.0, 45.0));
    }

    #[test]
    fn format_label_trims_whole_numbers() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
