//! Basic bit encoding and decoding.
//!
//! Run with: cargo run --example simple

use serde::Serialize;
use serde_bit::{from_str, to_object, to_string_with_options, EncodeOptions, RowMode};
use std::error::Error;

#[derive(Debug, Serialize)]
struct User {
    id: u32,
    name: String,
    email: String,
}

#[derive(Debug, Serialize)]
struct Directory {
    user: Vec<User>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let directory = Directory {
        user: vec![
            User {
                id: 42,
                name: "Alice Johnson".to_string(),
                email: "alice@example.com".to_string(),
            },
            User {
                id: 43,
                name: "Bob Smith".to_string(),
                email: "bob@example.com".to_string(),
            },
        ],
    };

    let state = to_object(&directory)?;
    let options = EncodeOptions::new().with_row_mode(RowMode::Child);
    let bit = to_string_with_options(&state, &options);
    println!("bit output:\n{}", bit);

    let replayed = from_str(&bit)?;
    assert_eq!(state, replayed);
    println!("✓ Round-trip successful");

    for user in replayed.at("user").array().items() {
        println!(
            "{} <{}>",
            user.at("name").value().unwrap_or_default(),
            user.at("email").value().unwrap_or_default()
        );
    }

    Ok(())
}
