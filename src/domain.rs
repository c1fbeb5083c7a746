use crate::provider::Zone;

/// `a.b.example.com` yields `example.com`, `b.example.com`, `a.b.example.com`.
pub fn zone_candidates(domain: &str) -> Vec<String> {
    let labels = domain.split('.').collect::<Vec<_>>();
    (0..labels.len().saturating_sub(1))
        .rev()
        .map(|start| labels[start..].join("."))
        .collect()
}

pub fn find_zone<'a>(zones: &'a [Zone], domain: &str) -> Option<&'a Zone> {
    let candidates = zone_candidates(domain);
    zones.iter().find(|zone| {
        candidates
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(&zone.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ZoneId;

    fn zone(id: &str, name: &str) -> Zone {
        Zone {
            id: ZoneId(id.to_string()),
            name: name.to_string(),
        }
    }

    #[test]
    fn candidates_go_from_shortest_to_longest() {
        assert_eq!(
            zone_candidates("sub.sub2.example.com"),
            vec!["example.com", "sub2.example.com", "sub.sub2.example.com"]
        );
    }

    #[test]
    fn apex_domain_is_its_own_only_candidate() {
        assert_eq!(zone_candidates("example.com"), vec!["example.com"]);
    }

    #[test]
    fn single_label_has_no_candidates() {
        assert!(zone_candidates("localhost").is_empty());
    }

    #[test]
    fn finds_zone_for_subdomain() {
        let zones = vec![zone("1", "other.org"), zone("2", "example.com")];
        let found = find_zone(&zones, "home.example.com").unwrap();
        assert_eq!(found.id, ZoneId("2".to_string()));
    }

    #[test]
    fn first_matching_zone_in_provider_order_wins() {
        let zones = vec![
            zone("sub", "lab.example.com"),
            zone("apex", "example.com"),
        ];
        let found = find_zone(&zones, "host.lab.example.com").unwrap();
        assert_eq!(found.id, ZoneId("sub".to_string()));
    }

    #[test]
    fn zone_names_match_case_insensitively() {
        let zones = vec![zone("1", "Example.COM")];
        assert!(find_zone(&zones, "home.example.com").is_some());
    }

    #[test]
    fn suffix_without_label_boundary_does_not_match() {
        let zones = vec![zone("1", "ample.com")];
        assert!(find_zone(&zones, "home.example.com").is_none());
    }

    #[test]
    fn tld_zone_is_not_a_match() {
        let zones = vec![zone("1", "com")];
        assert!(find_zone(&zones, "home.example.com").is_none());
    }
}
