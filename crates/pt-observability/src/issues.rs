/// The fixed issue taxonomy surfaced in both `loop_health.json` and
/// `latest_snapshot.json`. Not user-extensible — downstream tooling keys
/// off these exact strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Issue {
    FeedStale,
    ConfidenceMissing,
    RegimeUnknown,
    CompressionNull,
    SelfTrustUnavailable,
    OpportunityLow,
    LoopCrash,
}

impl Issue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Issue::FeedStale => "FEED_STALE",
            Issue::ConfidenceMissing => "CONFIDENCE_MISSING",
            Issue::RegimeUnknown => "REGIME_UNKNOWN",
            Issue::CompressionNull => "COMPRESSION_NULL",
            Issue::SelfTrustUnavailable => "SELF_TRUST_UNAVAILABLE",
            Issue::OpportunityLow => "OPPORTUNITY_LOW",
            Issue::LoopCrash => "LOOP_CRASH",
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_issue_renders_its_screaming_snake_case_code() {
        assert_eq!(Issue::FeedStale.as_str(), "FEED_STALE");
        assert_eq!(Issue::LoopCrash.as_str(), "LOOP_CRASH");
    }
}
