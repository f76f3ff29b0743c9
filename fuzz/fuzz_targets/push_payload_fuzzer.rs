//! Fuzz target for push payload parsing
//!
//! Push gateways deliver arbitrary bytes. Parsing must reject anything that is
//! not a notification with well-formed ids, and never panic.
//!
//! # Invariants
//!
//! - Accepted payloads carry an event id starting with `$`
//! - Accepted payloads carry a room id starting with `!`

#![no_main]

use libfuzzer_sys::fuzz_target;
use trellis_app::parse_push_data;
use trellis_core::ids;

fuzz_target!(|data: &[u8]| {
    if let Ok(push) = parse_push_data(data) {
        assert!(ids::is_event_id(&push.event_id), "accepted event id {:?}", push.event_id);
        assert!(ids::is_room_id(&push.room_id), "accepted room id {:?}", push.room_id);
    }
});
