use serde::Serialize;
use serde_bit::{
    bit, from_reader, from_str, from_str_lenient, to_object, to_string, to_string_with_options,
    ByteBuffer, DecodeErrorKind, Decoder, EncodeOptions, Error, Object, RowMode, WriteBuffer,
};

const CUSTOMERS: &str = "\
customer[0] : name='Tom' address.city='San Diego'
customer[1] : name='Rick'
customer[0] : address.city='Vista'
";

#[test]
fn test_customer_log_replay() {
    let state = from_str(CUSTOMERS).unwrap();
    assert_eq!(
        state.at("customer[0].address.city").value().as_deref(),
        Some("Vista")
    );
    assert_eq!(state.at("customer[0].name").value().as_deref(), Some("Tom"));
    assert_eq!(state.at("customer[1].name").value().as_deref(), Some("Rick"));

    let customers = state.at("customer").array();
    assert_eq!(customers.size(), 2);
    assert_eq!(customers.item_ids(), vec!["0", "1"]);
}

#[test]
fn test_records_merge_in_order() {
    let state = from_str("a : x='1' y='2'\na : y='3' z='4'\n").unwrap();
    assert_eq!(state.at("a.x").value().as_deref(), Some("1"));
    assert_eq!(state.at("a.y").value().as_deref(), Some("3"));
    assert_eq!(state.at("a.z").value().as_deref(), Some("4"));
}

#[test]
fn test_erase_then_repopulate_in_one_line() {
    let state = from_str("a : old='1'\na :: x='1'\n").unwrap();
    assert!(state.at("a").is_nulled());
    assert_eq!(state.at("a.x").value().as_deref(), Some("1"));
    assert_eq!(state.at("a.old").value(), None);
}

#[test]
fn test_tombstone_precedence() {
    let state = from_str("k : old='1' keep='2'\nk : null\nk : child='v'\n").unwrap();
    assert!(!state.at("k").is_nulled());
    assert_eq!(state.at("k.child").value().as_deref(), Some("v"));
    assert_eq!(state.at("k.old").value(), None);
    assert_eq!(state.at("k.keep").value(), None);
}

#[test]
fn test_length_prefixed_values() {
    let state = from_str("k : v(5)'ab'de'\n").unwrap();
    assert_eq!(state.at("k.v").value().as_deref(), Some("ab'de"));

    let err = from_str("k : v(5)'abcd'\n").unwrap_err();
    assert_eq!(
        err.decode_kind(),
        Some(DecodeErrorKind::ExpectedValueDelimiter)
    );
}

#[test]
fn test_array_order_after_removal() {
    let obj = Object::new();
    let list = obj.at("list").array();
    list.append_with_id("a").set("1");
    list.append_with_id("b").set("2");
    list.append_with_id("c").set("3");
    list.erase("b");

    let values: Vec<String> = list.items().iter().filter_map(Object::value).collect();
    assert_eq!(values, vec!["1", "3"]);

    let replayed = from_str(&to_string(&obj)).unwrap();
    assert_eq!(replayed.at("list").array().item_ids(), vec!["a", "c"]);
}

#[test]
fn test_array_order_is_not_lexicographic() {
    let state = from_str("list[10]='a'\nlist[9]='b'\nlist[100]='c'\n").unwrap();
    assert_eq!(
        state.at("list").array().item_ids(),
        vec!["10", "9", "100"]
    );
}

#[test]
fn test_idempotent_reapplication() {
    let mut decoder = Decoder::new();
    let mut buffer = ByteBuffer::from("a :: x='1' y=null list[q]='v'\n");
    let record = decoder.decode(&mut buffer).unwrap().unwrap();

    let once = Object::new();
    once.append(&record);
    let twice = Object::new();
    twice.append(&record);
    twice.append(&record);
    assert_eq!(once, twice);
}

#[test]
fn test_clip_view_encodes_relative_keys() {
    let state = from_str(CUSTOMERS).unwrap();
    let customer = state.at("customer[0]").clip();
    assert_eq!(customer.at("address.city").key().get(), "address.city");

    let text = to_string(&customer);
    assert_eq!(text, "address.city='Vista' name='Tom'\n");
    assert_eq!(from_str(&text).unwrap(), customer);
}

#[test]
fn test_streaming_chunks_and_compaction() {
    let state = Object::new();
    let mut decoder = Decoder::new();
    let mut buffer = ByteBuffer::new();
    let mut records = 0;

    for chunk in CUSTOMERS.as_bytes().chunks(7) {
        buffer.write_bytes(chunk);
        while let Some(record) = decoder.decode(&mut buffer).unwrap() {
            state.append(&record);
            records += 1;
        }
        buffer.compact();
    }

    assert_eq!(records, 3);
    assert_eq!(state, from_str(CUSTOMERS).unwrap());
    assert_eq!(decoder.offset(), CUSTOMERS.len());
}

#[test]
fn test_skip_and_log_policy() {
    let text = "a : x='1'\na : y=oops\n# note\na : z='3'\n";
    let (state, errors) = from_str_lenient(text);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        Error::Decode {
            kind: DecodeErrorKind::ExpectedValueOrValueSpec,
            line: 2,
            ..
        }
    ));
    assert_eq!(state.at("a.x").value().as_deref(), Some("1"));
    assert_eq!(state.at("a.y").value(), None);
    assert_eq!(state.at("a.z").value().as_deref(), Some("3"));
}

#[test]
fn test_row_modes_on_nested_data() {
    let obj = bit! {
        "app.name" => "demo",
        "app.db.host" => "localhost",
        "app.db.port" => "5432",
    };

    let encode = |mode| to_string_with_options(&obj, &EncodeOptions::new().with_row_mode(mode));
    assert_eq!(
        encode(RowMode::Object),
        "app.db.host='localhost' app.db.port='5432' app.name='demo'\n"
    );
    assert_eq!(
        encode(RowMode::Child),
        "app : db.host='localhost' db.port='5432' name='demo'\n"
    );
    assert_eq!(
        encode(RowMode::Leaf),
        "app : name='demo'\napp.db : host='localhost' port='5432'\n"
    );
    assert_eq!(
        encode(RowMode::Value),
        "app.db.host='localhost'\napp.db.port='5432'\napp.name='demo'\n"
    );
}

#[derive(Serialize)]
struct Service {
    name: String,
    replicas: u32,
    ports: Vec<u16>,
    owner: Option<String>,
}

#[test]
fn test_serde_bridge() {
    let service = Service {
        name: "api".to_string(),
        replicas: 3,
        ports: vec![80, 443],
        owner: None,
    };
    let obj = to_object(&service).unwrap();
    let text = to_string(&obj);
    assert_eq!(
        text,
        "name='api' owner=null ports[0]='80' ports[1]='443' replicas='3'\n"
    );

    let json = serde_json::to_value(&from_str(&text).unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "api",
            "owner": null,
            "ports[0]": "80",
            "ports[1]": "443",
            "replicas": "3",
        })
    );
}

#[test]
fn test_from_reader_matches_from_str() {
    let from_bytes = from_reader(std::io::Cursor::new(CUSTOMERS.as_bytes())).unwrap();
    assert_eq!(from_bytes, from_str(CUSTOMERS).unwrap());
}
