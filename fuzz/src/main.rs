use pushjson::{JsonHandler, JsonParser};

#[macro_use]
extern crate afl;

/// Consumes every event without building anything.
struct Sink;

impl JsonHandler for Sink {}

fn main() {
    fuzz!(|data: &[u8]| {
        let mut parser = JsonParser::new();
        let mut sink = Sink;

        // The first byte picks the chunk size so the fuzzer also explores
        // boundary stitching.
        let (size, rest) = match data.split_first() {
            Some((&n, rest)) => ((n as usize % 7) + 1, rest),
            None => (1, data),
        };

        for piece in rest.chunks(size) {
            let consumed = parser.exec(&mut sink, piece);
            assert!(consumed <= piece.len());
            if consumed < piece.len() {
                assert!(parser.is_dead());
                break;
            }
        }
        let _ = parser.finish(&mut sink);
    });
}
