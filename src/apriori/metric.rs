use super::config::RatioMetric;

/// Population totals a ratio is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Population {
    pub rows: u64,
    pub outliers: u64,
}

impl RatioMetric {
    pub fn ratio(&self, support: u64, outlier_support: u64, population: Population) -> f64 {
        if support == 0 {
            return 0.0;
        }
        match self {
            RatioMetric::OutlierShare => outlier_support as f64 / support as f64,
            RatioMetric::RiskRatio => {
                let exposed_rate = outlier_support as f64 / support as f64;
                let unexposed_rows = population.rows.saturating_sub(support);
                let unexposed_outliers = population.outliers.saturating_sub(outlier_support);
                if unexposed_outliers == 0 {
                    return if outlier_support > 0 { f64::INFINITY } else { 0.0 };
                }
                let unexposed_rate = unexposed_outliers as f64 / unexposed_rows as f64;
                exposed_rate / unexposed_rate
            }
        }
    }
}
