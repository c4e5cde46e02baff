use sovran_valuemap::{MapError, MergePolicy, TypedMap};

const BODY: &[u8] = br#"{
    "id": "1042",
    "amount": 19.99,
    "paid": 1,
    "created": "2024-03-01T12:30:00+01:00",
    "ttl": "15m",
    "customer": {"name": "Ada", "vip": "T"},
    "tags": ["new", "web"]
}"#;

/// Demonstrates decoding a loosely-typed JSON body and reading it back
fn main() -> Result<(), MapError> {
    let order = TypedMap::from_json(BODY)?.with_merge_policy(MergePolicy::Batch);

    println!("id:       {}", order.get_i64("id"));
    println!("amount:   {:.2}", order.get_f64("amount"));
    println!("paid:     {}", order.get_bool("paid"));
    println!("created:  {}", order.get_time("created"));
    println!("ttl:      {}s", order.get_duration("ttl").num_seconds());

    let customer = order.get_sub_map("customer");
    println!("customer: {} (vip: {})", customer.get_string("name"), customer.get_bool("vip"));

    // Arrays pass through untouched but aren't coerced
    println!("tags as text: {:?}", order.get_string("tags"));

    // Apply defaults for anything the client left out
    order.add_map([("currency", "EUR"), ("channel", "web")]);

    println!("\nRe-encoded:\n{}", order.to_json()?);

    // A malformed replacement is rejected and the order is left alone
    if let Err(e) = order.load_json(b"{\"id\": ") {
        println!("\nRejected update: {}", e);
    }
    println!("id still {}", order.get_string("id"));

    Ok(())
}
