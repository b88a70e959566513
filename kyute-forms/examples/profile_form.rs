//! Loads a profile form from JSON, edits it, and prints the change events.
//!
//! Run with `RUST_LOG=kyute_forms=trace` to see the reconciliation steps.
use kyute_forms::{validators, FormBuilder, FormEvent, FormTree, SetOptions, StructureOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Contact {
    kind: String,
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Profile {
    name: String,
    age: Option<f64>,
    contacts: Vec<Contact>,
}

const SAVED: &str = r#"{
    "name": "Ada Lovelace",
    "age": "36",
    "contacts": [
        {"kind": "email", "value": "ada@example.com"},
        {"kind": "post", "value": "12 St James's Square, London"}
    ]
}"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let fb = FormBuilder::new();
    let template = fb.group([
        ("name", fb.control("").validator(validators::required())),
        ("age", fb.number(None::<f64>).validator(validators::min(0.0))),
        (
            "contacts",
            fb.table(0, |_, _| {
                let fb = FormBuilder::new();
                fb.group([
                    ("kind", fb.control("email")),
                    ("value", fb.control("").validator(validators::required())),
                ])
            }),
        ),
    ]);

    let mut tree = FormTree::new();
    let form = tree.insert(&template);
    tree.subscribe(form, |event| match event {
        FormEvent::ValueChanged { value, .. } => println!("value  -> {value}"),
        FormEvent::StatusChanged { status, .. } => println!("status -> {status:?}"),
    })?;

    // the saved value has two contacts, the form none: `full_sync` creates them
    let saved: serde_json::Value = serde_json::from_str(SAVED)?;
    tree.full_sync(form, saved, SetOptions::default())?;

    let profile: Profile = tree.value_as(form)?;
    println!("loaded {profile:?}");

    // an empty contact makes the form invalid
    let contacts = tree.get(form, "contacts").ok_or_else(|| anyhow::anyhow!("no contacts"))?;
    tree.push(contacts, StructureOptions::default())?;
    println!("valid: {}", tree.is_valid(form)?);

    // a shorter list drops the extra rows
    tree.partial_sync(
        form,
        serde_json::json!({"contacts": [{"kind": "email", "value": "ada@analytical.engine"}]}),
        SetOptions::default(),
    )?;
    println!("valid: {}, {} contact(s)", tree.is_valid(form)?, tree.len(contacts)?);

    let profile: Profile = tree.value_as(form)?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}
