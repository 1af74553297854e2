//! Property tests for pattern matching against derived addresses.

use proptest::prelude::*;

use contract_vanity::{create_address, Address, PatternSpec};

fn address_strategy() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

fn hex_string(max_len: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(0u8..16, 0..=max_len).prop_map(|nibbles| {
        nibbles
            .into_iter()
            .map(|n| char::from_digit(n as u32, 16).unwrap_or('0'))
            .collect()
    })
}

proptest! {
    #[test]
    fn prefix_suffix_agree_with_string_comparison(
        address in address_strategy(),
        prefix in hex_string(4),
        suffix in hex_string(4),
    ) {
        prop_assume!(!prefix.is_empty() || !suffix.is_empty());
        let spec = PatternSpec::new_prefix_and_suffix(&prefix, &suffix, false).unwrap();

        let body = address.to_hex();
        let expected = body.starts_with(&prefix) && body.ends_with(&suffix);
        prop_assert_eq!(spec.matches(&address).is_match(), expected);
    }

    #[test]
    fn own_prefix_and_suffix_always_match(
        address in address_strategy(),
        head in 1usize..=8,
        tail in 0usize..=8,
    ) {
        let body = address.to_hex();
        let spec = PatternSpec::new_prefix_and_suffix(&body[..head], &body[40 - tail..], false)
            .unwrap();
        prop_assert!(spec.matches(&address).is_match());
    }

    #[test]
    fn wildcards_over_own_body_always_match(
        address in address_strategy(),
        mask in proptest::collection::vec(any::<bool>(), 1..=12),
    ) {
        let body = address.to_hex();
        let glob: String = body
            .chars()
            .zip(mask.iter())
            .map(|(c, &wild)| if wild { '?' } else { c })
            .collect();
        let spec = PatternSpec::builder().custom_pattern(glob).build().unwrap();
        prop_assert!(spec.matches(&address).is_match());
    }

    #[test]
    fn leading_zero_rule_counts_zeros(address in address_strategy(), zeros in 1usize..=6) {
        let spec = PatternSpec::builder().zero_count(zeros).build().unwrap();
        let body = address.to_hex();
        let expected = body.bytes().take(zeros).all(|c| c == b'0');
        prop_assert_eq!(spec.matches(&address).is_match(), expected);
    }

    #[test]
    fn case_sensitive_matches_own_checksum(address in address_strategy(), head in 1usize..=6) {
        let checksum = address.to_checksum();
        let body = &checksum[2..];
        let spec = PatternSpec::new_prefix_and_suffix(&body[..head], "", true).unwrap();
        prop_assert!(spec.matches(&address).is_match());
    }

    #[test]
    fn contract_address_is_a_pure_function(
        deployer in address_strategy(),
        nonce in any::<u64>(),
    ) {
        prop_assert_eq!(create_address(&deployer, nonce), create_address(&deployer, nonce));
    }

    #[test]
    fn different_nonces_give_different_addresses(
        deployer in address_strategy(),
        nonce in 0u64..1_000_000,
    ) {
        prop_assert_ne!(create_address(&deployer, nonce), create_address(&deployer, nonce + 1));
    }
}
