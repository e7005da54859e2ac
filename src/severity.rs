pub const MODERATE_THRESHOLD: f64 = 1500.0;
pub const HIGH_THRESHOLD: f64 = 2500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityTier {
    Normal,
    Moderate,
    High,
}

impl SeverityTier {
    pub fn label(self) -> &'static str {
        match self {
            SeverityTier::Normal => "Normal",
            SeverityTier::Moderate => "Moderate",
            SeverityTier::High => "High",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            SeverityTier::Normal => "#10B981",
            SeverityTier::Moderate => "#F59E0B",
            SeverityTier::High => "#EF4444",
        }
    }

    /// 1 (Normal) to 3 (High).
    pub fn rank(self) -> u8 {
        match self {
            SeverityTier::Normal => 1,
            SeverityTier::Moderate => 2,
            SeverityTier::High => 3,
        }
    }
}

pub fn classify(value: f64) -> SeverityTier {
    if value < MODERATE_THRESHOLD {
        SeverityTier::Normal
    } else if value < HIGH_THRESHOLD {
        SeverityTier::Moderate
    } else {
        SeverityTier::High
    }
}
