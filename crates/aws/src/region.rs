//! Known AWS region identifiers
//!
//! The SDK accepts any string as a region and only fails once a request is
//! sent. Settings are checked against this table so a typo is reported when
//! the provider is configured rather than on the first lookup.

/// Region identifiers across the commercial, China, GovCloud and ISO partitions
pub const KNOWN_REGIONS: &[&str] = &[
    // aws
    "af-south-1",
    "ap-east-1",
    "ap-east-2",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-southeast-5",
    "ap-southeast-6",
    "ap-southeast-7",
    "ca-central-1",
    "ca-west-1",
    "eu-central-1",
    "eu-central-2",
    "eu-north-1",
    "eu-south-1",
    "eu-south-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "il-central-1",
    "me-central-1",
    "me-south-1",
    "mx-central-1",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    // aws-cn
    "cn-north-1",
    "cn-northwest-1",
    // aws-us-gov
    "us-gov-east-1",
    "us-gov-west-1",
    // aws-iso*
    "us-iso-east-1",
    "us-iso-west-1",
    "us-isob-east-1",
];

/// Check whether `region` is a recognized region identifier
#[must_use]
pub fn is_known_region(region: &str) -> bool {
    KNOWN_REGIONS.iter().any(|known| *known == region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_common_regions() {
        assert!(is_known_region("us-east-1"));
        assert!(is_known_region("eu-central-1"));
        assert!(is_known_region("cn-north-1"));
        assert!(is_known_region("us-gov-west-1"));
    }

    #[test]
    fn test_rejects_unknown_or_malformed_regions() {
        assert!(!is_known_region("mars-north-1"));
        assert!(!is_known_region("US-EAST-1"));
        assert!(!is_known_region(" us-east-1"));
        assert!(!is_known_region(""));
    }

    #[test]
    fn test_table_has_no_duplicates() {
        let mut regions = KNOWN_REGIONS.to_vec();
        regions.sort_unstable();
        regions.dedup();
        assert_eq!(regions.len(), KNOWN_REGIONS.len());
    }
}
