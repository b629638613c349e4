//! Fuzz target: `Message::from_frame`
//!
//! Drives arbitrary byte sequences through the frame decoder and asserts
//! that it never panics and that every accepted frame survives a
//! re-encode/decode cycle unchanged.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use sensornet::Message;

fuzz_target!(|data: &[u8]| {
    if let Ok(msg) = Message::from_frame(data) {
        let frame = msg.to_frame().expect("accepted message must re-encode");
        assert!(
            frame.len() <= sensornet::message::MAX_FRAME_LEN,
            "encoded frame exceeds MAX_FRAME_LEN"
        );
        assert_eq!(
            Message::from_frame(&frame),
            Ok(msg),
            "re-encoded frame must decode to the same message"
        );
    }
});
