//! Fuzz target for `m.room.join_rules` content decoding
//!
//! State event content comes from other clients and servers. Decoding must
//! accept any JSON and produce a usable rule.
//!
//! # Invariants
//!
//! - Decoding never panics
//! - Re-encoding decoded content and decoding it again yields the same content

#![no_main]

use libfuzzer_sys::fuzz_target;
use trellis_core::{JoinRule, JoinRulesContent};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let content = JoinRulesContent::from_event_content(&value);
    let again = JoinRulesContent::from_event_content(&content.to_event_content());

    assert_eq!(again.join_rule, content.join_rule);
    if content.join_rule == JoinRule::Restricted {
        assert_eq!(again, content);
    } else {
        assert!(again.allow.is_empty());
    }
});
