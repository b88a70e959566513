use kyute_forms::{
    validators, ArrayConfig, ControlKind, ControlTemplate, FormError, FormEvent, FormState, FormTree, FormValue,
    SetOptions, Status, StructureOptions, Validator,
};
use serde_json::json;
use std::{cell::RefCell, rc::Rc};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn pair() -> ControlTemplate {
    ControlTemplate::group([
        ("a", ControlTemplate::control(0)),
        ("b", ControlTemplate::control("x")),
    ])
}

fn strings(size: usize) -> ControlTemplate {
    ControlTemplate::array(ArrayConfig::new(size, |index, _| {
        ControlTemplate::control(format!("item{index}"))
    }))
}

#[test]
fn initial_values() -> anyhow::Result<()> {
    init_logging();
    let template = ControlTemplate::group([
        ("pair", pair()),
        ("list", strings(2)),
        ("off", ControlTemplate::with_state(FormState::disabled(true))),
    ]);
    let mut tree = FormTree::new();
    let form = tree.insert(&template);

    assert_eq!(tree.control_count(), 8);
    assert_eq!(tree.kind(form)?, ControlKind::Group);
    assert_eq!(
        tree.value(form)?,
        &FormValue::from(json!({"pair": {"a": 0, "b": "x"}, "list": ["item0", "item1"]}))
    );
    assert_eq!(
        tree.raw_value(form)?,
        FormValue::from(json!({"pair": {"a": 0, "b": "x"}, "list": ["item0", "item1"], "off": true}))
    );
    assert_eq!(tree.status(form)?, Status::Valid);
    assert!(tree.is_pristine(form)? && tree.is_untouched(form)?);
    Ok(())
}

#[test]
fn strict_set_errors() {
    init_logging();
    let mut tree = FormTree::new();
    let group = tree.insert(&pair());
    let a = tree.get(group, "a").unwrap();
    let b = tree.get(group, "b").unwrap();

    let err = tree.set_value(group, json!({"a": 1}), SetOptions::default()).unwrap_err();
    assert!(matches!(err, FormError::MissingValue { ref key } if key == "b"));
    assert_eq!(err.to_string(), "must supply a value for form control with name: 'b'");

    // no rollback: entries before the unknown key are written
    let err = tree
        .set_value(group, json!({"a": 1, "b": 2, "c": 3}), SetOptions::default())
        .unwrap_err();
    assert!(matches!(err, FormError::UnknownKey { ref key } if key == "c"));
    assert_eq!(tree.value(a).unwrap(), &FormValue::from(1));
    assert_eq!(tree.value(b).unwrap(), &FormValue::from(2));

    let err = tree.set_value(group, json!([1, 2]), SetOptions::default()).unwrap_err();
    assert!(matches!(err, FormError::ShapeMismatch { kind: ControlKind::Group, .. }));

    let array = tree.insert(&strings(2));
    let err = tree.set_value(array, json!(["x"]), SetOptions::default()).unwrap_err();
    assert!(matches!(err, FormError::MissingIndex { index: 1 }));
    let err = tree
        .set_value(array, json!(["x", "y", "z"]), SetOptions::default())
        .unwrap_err();
    assert!(matches!(err, FormError::IndexOutOfBounds { index: 2, len: 2 }));
}

#[test]
fn patch_is_lenient() -> anyhow::Result<()> {
    init_logging();
    let mut tree = FormTree::new();
    let group = tree.insert(&pair());

    tree.patch_value(group, json!({"a": 5, "zzz": 1}), SetOptions::default())?;
    assert_eq!(tree.value(group)?, &FormValue::from(json!({"a": 5, "b": "x"})));

    tree.patch_value(group, FormValue::Null, SetOptions::default())?;
    assert_eq!(tree.value(group)?, &FormValue::from(json!({"a": 5, "b": "x"})));

    let array = tree.insert(&strings(2));
    tree.patch_value(array, json!(["first"]), SetOptions::default())?;
    assert_eq!(tree.value(array)?, &FormValue::from(json!(["first", "item1"])));
    tree.patch_value(array, json!(["1", "2", "3"]), SetOptions::default())?;
    assert_eq!(tree.value(array)?, &FormValue::from(json!(["1", "2"])));
    Ok(())
}

#[test]
fn reset_values_and_state() -> anyhow::Result<()> {
    init_logging();
    let mut tree = FormTree::new();
    let group = tree.insert(&pair());
    let a = tree.get(group, "a").unwrap();
    let b = tree.get(group, "b").unwrap();
    tree.mark_as_dirty(a, false)?;
    tree.mark_as_touched(b, false)?;
    assert!(tree.is_dirty(group)? && tree.is_touched(group)?);

    tree.reset(group, json!({"a": 3}), SetOptions::default())?;
    assert_eq!(tree.value(group)?, &FormValue::from(json!({"a": 3, "b": null})));
    assert!(tree.is_pristine(group)? && tree.is_pristine(a)?);
    assert!(tree.is_untouched(group)? && tree.is_untouched(b)?);

    // boxed state on a leaf also sets the disabled flag
    tree.reset(b, json!({"value": "z", "disabled": true}), SetOptions::default())?;
    assert!(tree.is_disabled(b)?);
    assert_eq!(tree.value(b)?, &FormValue::from("z"));
    assert_eq!(tree.value(group)?, &FormValue::from(json!({"a": 3})));
    assert_eq!(tree.raw_value(group)?, FormValue::from(json!({"a": 3, "b": "z"})));

    tree.reset(b, json!({"value": "w", "disabled": false}), SetOptions::default())?;
    assert!(tree.is_enabled(b)?);
    assert_eq!(tree.value(group)?, &FormValue::from(json!({"a": 3, "b": "w"})));

    tree.reset(group, None::<i32>, SetOptions::default())?;
    assert_eq!(tree.value(group)?, &FormValue::from(json!({"a": null, "b": null})));
    Ok(())
}

#[test]
fn disabled_controls_are_excluded_from_values() -> anyhow::Result<()> {
    init_logging();
    let mut tree = FormTree::new();
    let group = tree.insert(&pair());
    let a = tree.get(group, "a").unwrap();
    let b = tree.get(group, "b").unwrap();

    tree.disable(a, SetOptions::default())?;
    assert_eq!(tree.status(a)?, Status::Disabled);
    assert_eq!(tree.status(group)?, Status::Valid);
    assert_eq!(tree.value(group)?, &FormValue::from(json!({"b": "x"})));
    assert_eq!(tree.raw_value(group)?, FormValue::from(json!({"a": 0, "b": "x"})));
    assert!(!tree.contains(group, "a"));
    assert!(tree.contains(group, "b"));

    // all children disabled: the group is disabled and its value includes everything
    tree.disable(b, SetOptions::default())?;
    assert_eq!(tree.status(group)?, Status::Disabled);
    assert_eq!(tree.value(group)?, &FormValue::from(json!({"a": 0, "b": "x"})));

    tree.enable(group, SetOptions::default())?;
    assert!(tree.is_enabled(a)? && tree.is_enabled(b)?);
    assert_eq!(tree.status(group)?, Status::Valid);
    Ok(())
}

#[test]
fn validation_status() -> anyhow::Result<()> {
    init_logging();
    let template = ControlTemplate::group([
        ("name", ControlTemplate::control("").validator(validators::required())),
        ("age", ControlTemplate::number(10).validator(validators::min(18.0))),
    ]);
    let mut tree = FormTree::new();
    let form = tree.insert(&template);
    let name = tree.find(form, "name").unwrap();
    let age = tree.find(form, "age").unwrap();

    assert_eq!(tree.status(name)?, Status::Invalid);
    assert!(tree.has_error(name, "required"));
    assert!(tree.has_error(age, "min"));
    assert_eq!(tree.status(form)?, Status::Invalid);
    // container errors only hold its own validators
    assert_eq!(tree.errors(form)?, None);

    tree.set_value(name, "Ada", SetOptions::default())?;
    assert!(tree.is_valid(name)?);
    assert!(tree.is_invalid(form)?);

    tree.set_value(age, "20", SetOptions::default())?;
    assert_eq!(tree.value(age)?, &FormValue::from(20));
    assert!(tree.is_valid(form)?);

    // disabled controls are exempt from validation
    tree.set_value(name, "", SetOptions::default())?;
    assert!(tree.is_invalid(form)?);
    tree.disable(name, SetOptions::default())?;
    assert_eq!(tree.errors(name)?, None);
    assert!(tree.is_valid(form)?);
    tree.enable(name, SetOptions::default())?;
    assert!(tree.is_invalid(form)?);
    Ok(())
}

#[test]
fn group_validator() -> anyhow::Result<()> {
    init_logging();
    let same_passwords = Validator::new(|value| {
        if value.get("password") == value.get("confirm") {
            None
        } else {
            Some([("mismatch".to_owned(), FormValue::Bool(true))].into_iter().collect())
        }
    });
    let template = ControlTemplate::group([
        ("password", ControlTemplate::control("")),
        ("confirm", ControlTemplate::control("")),
    ])
    .validator(same_passwords);
    let mut tree = FormTree::new();
    let form = tree.insert(&template);
    assert!(tree.is_valid(form)?);

    tree.set_value(tree.get(form, "password").unwrap(), "hunter2", SetOptions::default())?;
    assert!(tree.has_error(form, "mismatch"));
    tree.patch_value(form, json!({"confirm": "hunter2"}), SetOptions::default())?;
    assert!(tree.is_valid(form)?);

    tree.update_value_and_validity(form, SetOptions::SILENT)?;
    assert!(tree.is_valid(form)?);
    Ok(())
}

#[test]
fn pristine_and_touched() -> anyhow::Result<()> {
    init_logging();
    let template = ControlTemplate::group([("inner", pair()), ("c", ControlTemplate::control(None::<bool>))]);
    let mut tree = FormTree::new();
    let form = tree.insert(&template);
    let inner = tree.get(form, "inner").unwrap();
    let a = tree.find(form, "inner.a").unwrap();
    let b = tree.find(form, "inner.b").unwrap();

    tree.mark_as_dirty(a, false)?;
    assert!(tree.is_dirty(inner)? && tree.is_dirty(form)?);
    tree.mark_as_pristine(a, false)?;
    assert!(tree.is_pristine(inner)? && tree.is_pristine(form)?);

    tree.mark_as_dirty(a, true)?;
    assert!(tree.is_dirty(a)? && tree.is_pristine(inner)?);

    tree.mark_as_touched(b, false)?;
    assert!(tree.is_touched(inner)? && tree.is_touched(form)?);
    tree.mark_as_untouched(form, false)?;
    assert!(tree.is_untouched(b)? && tree.is_untouched(inner)?);

    tree.mark_all_as_touched(form)?;
    for id in [form, inner, a, b] {
        assert!(tree.is_touched(id)?);
    }
    Ok(())
}

#[test]
fn disabling_keeps_directly_marked_dirty_parent() -> anyhow::Result<()> {
    init_logging();
    let mut tree = FormTree::new();
    let group = tree.insert(&pair());
    let a = tree.get(group, "a").unwrap();

    // dirty because of a child: re-derived when the child is disabled
    tree.mark_as_dirty(a, false)?;
    tree.disable(a, SetOptions::default())?;
    assert!(tree.is_pristine(group)?);

    // marked dirty directly: kept
    tree.enable(a, SetOptions::default())?;
    tree.mark_as_pristine(group, false)?;
    tree.mark_as_dirty(group, true)?;
    tree.disable(a, SetOptions::default())?;
    assert!(tree.is_dirty(group)?);
    Ok(())
}

#[test]
fn array_structure() -> anyhow::Result<()> {
    init_logging();
    let mut tree = FormTree::new();
    let array = tree.insert(&strings(1));
    let opts = StructureOptions::default();

    tree.push(array, opts)?;
    tree.insert_at(array, 0, opts)?;
    assert_eq!(tree.value(array)?, &FormValue::from(json!(["item0", "item0", "item1"])));

    // clamped to the end
    let last = tree.insert_at(array, 100, opts)?;
    assert_eq!(tree.children(array)?.last(), Some(&last));
    assert_eq!(tree.value(last)?, &FormValue::from("item3"));

    let replaced = tree.at(array, 1).unwrap();
    tree.set_control_at(array, 1, &ControlTemplate::control("new"), opts)?;
    assert!(!tree.contains_control(replaced));
    assert_eq!(tree.value(array)?, &FormValue::from(json!(["item0", "new", "item1", "item3"])));

    let removed = tree.at(array, 0).unwrap();
    tree.remove_at(array, 0, opts)?;
    assert!(!tree.contains_control(removed));
    assert_eq!(tree.len(array)?, 3);

    let err = tree.remove_at(array, 3, opts).unwrap_err();
    assert!(matches!(err, FormError::IndexOutOfBounds { index: 3, len: 3 }));

    tree.clear(array, opts)?;
    assert_eq!(tree.len(array)?, 0);
    assert_eq!(tree.value(array)?, &FormValue::List(vec![]));
    assert_eq!(tree.control_count(), 1);

    let group = tree.insert(&pair());
    let err = tree.push(group, opts).unwrap_err();
    assert!(matches!(
        err,
        FormError::KindMismatch {
            expected: ControlKind::Array,
            found: ControlKind::Group,
            ..
        }
    ));
    Ok(())
}

#[test]
fn group_structure() -> anyhow::Result<()> {
    init_logging();
    let mut tree = FormTree::new();
    let group = tree.insert(&pair());
    let opts = StructureOptions::default();
    let a = tree.get(group, "a").unwrap();

    // already live: returns the existing control
    assert_eq!(tree.add_control(group, "a", opts)?, a);

    tree.remove_control(group, "a", opts)?;
    assert!(!tree.contains_control(a));
    assert_eq!(tree.template_keys(group)?, ["a", "b"]);
    let a = tree.add_control(group, "a", opts)?;
    assert_eq!(tree.keys(group)?, ["b", "a"]);

    tree.set_value(a, 42, SetOptions::default())?;
    let restored = tree.restore_control(group, "a", opts)?;
    assert_ne!(restored, a);
    assert_eq!(tree.value(restored)?, &FormValue::from(0));

    let replaced = tree.set_control(group, "b", &strings(1), opts)?;
    assert_eq!(tree.kind(replaced)?, ControlKind::Array);
    assert_eq!(tree.value(group)?, &FormValue::from(json!({"a": 0, "b": ["item0"]})));

    for err in [
        tree.add_control(group, "zzz", opts).unwrap_err(),
        tree.remove_control(group, "zzz", opts).unwrap_err(),
        tree.set_control(group, "zzz", &pair(), opts).unwrap_err(),
    ] {
        assert!(matches!(err, FormError::UnknownKey { ref key } if key == "zzz"));
    }
    Ok(())
}

#[test]
fn removing_controls() -> anyhow::Result<()> {
    init_logging();
    let mut tree = FormTree::new();
    let form = tree.insert(&ControlTemplate::group([("pair", pair()), ("list", strings(3))]));
    let list = tree.get(form, "list").unwrap();
    let item = tree.at(list, 1).unwrap();

    tree.remove(item)?;
    assert_eq!(tree.value(list)?, &FormValue::from(json!(["item0", "item2"])));
    assert!(matches!(tree.value(item), Err(FormError::NoSuchControl(id)) if id == item));

    tree.remove(form)?;
    assert_eq!(tree.control_count(), 0);
    assert!(!tree.contains_control(list));
    Ok(())
}

#[test]
fn find_by_path() {
    let template = ControlTemplate::group([(
        "rows",
        ControlTemplate::array(ArrayConfig::new(2, |_, _| pair())),
    )]);
    let mut tree = FormTree::new();
    let form = tree.insert(&template);
    let row = tree.find(form, "rows.1").unwrap();
    assert_eq!(tree.find(form, "rows.1.b"), tree.get(row, "b"));
    assert_eq!(tree.parent(row), tree.get(form, "rows"));
    assert_eq!(tree.root(tree.find(form, "rows.1.b").unwrap()), form);
    assert_eq!(tree.find(form, "rows.2"), None);
    assert_eq!(tree.find(form, "rows.x"), None);
    assert_eq!(tree.find(form, "rows.0.a.deeper"), None);
}

#[test]
fn change_events() -> anyhow::Result<()> {
    init_logging();
    let mut tree = FormTree::new();
    let group = tree.insert(&pair());
    let a = tree.get(group, "a").unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let recorded = log.clone();
    tree.subscribe(a, move |event| recorded.borrow_mut().push(event.clone()))?;
    let recorded = log.clone();
    let group_sub = tree.subscribe(group, move |event| recorded.borrow_mut().push(event.clone()))?;

    tree.set_value(a, 7, SetOptions::default())?;
    let ids: Vec<_> = log.borrow().iter().map(FormEvent::id).collect();
    // the control first, then its ancestors
    assert_eq!(ids, [a, a, group, group]);
    assert_eq!(
        log.borrow()[2],
        FormEvent::ValueChanged {
            id: group,
            value: json!({"a": 7, "b": "x"}).into()
        }
    );

    log.borrow_mut().clear();
    tree.set_value(a, 8, SetOptions::default().only_self())?;
    assert_eq!(log.borrow().len(), 2);

    log.borrow_mut().clear();
    tree.set_value(a, 9, SetOptions::SILENT)?;
    assert!(log.borrow().is_empty());

    assert!(tree.unsubscribe(group_sub));
    assert!(!tree.unsubscribe(group_sub));
    tree.set_value(a, 10, SetOptions::default())?;
    assert_eq!(log.borrow().len(), 2);

    // listeners of destroyed controls are dropped
    log.borrow_mut().clear();
    tree.remove_control(group, "a", StructureOptions::default())?;
    tree.add_control(group, "a", StructureOptions::default())?;
    tree.set_value(tree.get(group, "a").unwrap(), 1, SetOptions::default())?;
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn status_changes() -> anyhow::Result<()> {
    init_logging();
    let mut tree = FormTree::new();
    let name = tree.insert(&ControlTemplate::control("ok").validator(validators::required()));

    let statuses = Rc::new(RefCell::new(Vec::new()));
    let recorded = statuses.clone();
    tree.subscribe_status_changes(name, move |status| recorded.borrow_mut().push(status))?;

    tree.set_value(name, "", SetOptions::default())?;
    tree.disable(name, SetOptions::default())?;
    tree.enable(name, SetOptions::default())?;
    assert_eq!(*statuses.borrow(), [Status::Invalid, Status::Disabled, Status::Invalid]);
    Ok(())
}

#[test]
fn typed_extraction() -> anyhow::Result<()> {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Pair {
        a: u32,
        b: String,
    }

    let mut tree = FormTree::new();
    let group = tree.insert(&pair());
    assert_eq!(
        tree.value_as::<Pair>(group)?,
        Pair {
            a: 0,
            b: "x".to_owned()
        }
    );

    tree.disable(tree.get(group, "b").unwrap(), SetOptions::default())?;
    assert!(matches!(tree.value_as::<Pair>(group), Err(FormError::Serialization(_))));
    assert_eq!(tree.raw_value_as::<Pair>(group)?.b, "x");
    Ok(())
}
