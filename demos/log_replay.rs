//! Replays an append-only change log in small chunks, the way a tailing
//! reader would, and prints the state after every record.
//!
//! Run with: cargo run --example log_replay

use serde_bit::{ByteBuffer, Decoder, Object, WriteBuffer};
use std::error::Error;

const LOG: &str = "\
# customers
customer[0] : name='Tom' address.city='San Diego'
customer[1] : name='Rick'
customer[0] : address.city='Vista'
customer[1] :: name='Richard' note(10)='says \"hi\"\n'
customer[0].address : null
bogus line
";

fn main() -> Result<(), Box<dyn Error>> {
    let state = Object::new();
    let mut decoder = Decoder::new();
    let mut buffer = ByteBuffer::new();

    for chunk in LOG.as_bytes().chunks(16) {
        buffer.write_bytes(chunk);
        loop {
            match decoder.decode(&mut buffer) {
                Ok(Some(record)) => {
                    state.append(&record);
                    println!("after line {}:", decoder.line() - 1);
                    print!("{}", serde_bit::to_string(&state));
                }
                Ok(None) => break,
                Err(err) => println!("skipped: {}", err),
            }
        }
        buffer.compact();
    }
    if let Some(record) = decoder.finish()? {
        state.append(&record);
    }

    let customers = state.at("customer").array();
    println!("{} customers, ids {:?}", customers.size(), customers.item_ids());
    Ok(())
}
