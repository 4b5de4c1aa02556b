use mantle::testing::{RecordingBinding, RecordingListener};
use mantle::{
    AttachOptions, BoxError, ManagedEvent, ManagedObject, MantleError, OperationError, PresetValue,
    Record, Value, ViewPreset, apply_view_preset,
};
use std::cell::RefCell;
use std::rc::Rc;

mod common;
use common::{Log, attach_logged};

#[test]
fn test_forwarding_remap_reaches_parent_in_order() {
    let list = ManagedObject::new();
    let row = ManagedObject::new();
    let received: Rc<RefCell<Vec<ManagedEvent>>> = Rc::default();
    let sink = received.clone();
    list.attach(
        &row,
        AttachOptions::new().handler(move |_: &ManagedObject, e: &ManagedEvent| {
            sink.borrow_mut().push(e.clone())
        }),
    )
    .unwrap();

    ViewPreset::new()
        .on("Click", "+RemoveItem")
        .unwrap()
        .apply(&row)
        .unwrap();
    row.emit("Click");

    let received = received.borrow();
    let names: Vec<&str> = received.iter().map(ManagedEvent::name).collect();
    assert_eq!(names, vec!["Click", "RemoveItem"]);
    let inner = received[1].inner().unwrap();
    assert!(inner.ptr_eq(&received[0]));
    assert!(received[1].source().ptr_eq(&row));
}

#[test]
fn test_replacing_remap_hides_original() {
    let list = ManagedObject::new();
    let row = ManagedObject::new();
    let log = Log::default();
    attach_logged(&list, &row, "list", &log);

    apply_view_preset(&row, &ViewPreset::new().on("Click", "Open").unwrap()).unwrap();
    row.emit("Click");
    row.emit("Focus");

    assert_eq!(log.entries(), vec!["list:Open", "list:Focus"]);
}

#[test]
fn test_remap_to_same_name_adds_target() {
    let row = ManagedObject::new();
    ViewPreset::new()
        .on("Click", "Click:row")
        .unwrap()
        .apply(&row)
        .unwrap();
    let recorder = RecordingListener::new();
    recorder.attach_to(&row);

    row.emit("Click");

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), "Click");
    assert_eq!(events[0].data().get("target"), Some(&Value::from("row")));
    let inner = events[0].inner().unwrap();
    assert_eq!(inner.name(), "Click");
    assert!(inner.data().get("target").is_none());
}

#[test]
fn test_forwarding_remap_to_same_name_emits_twice() {
    let list = ManagedObject::new();
    let row = ManagedObject::new();
    let log = Log::default();
    attach_logged(&list, &row, "list", &log);

    ViewPreset::new()
        .on("Click", "+Click")
        .unwrap()
        .apply(&row)
        .unwrap();
    row.emit("Click");

    assert_eq!(log.entries(), vec!["list:Click", "list:Click"]);
}

#[test]
fn test_dispatch_bypasses_interception() {
    let row = ManagedObject::new();
    ViewPreset::new()
        .on("Click", "Open")
        .unwrap()
        .apply(&row)
        .unwrap();
    let recorder = RecordingListener::new();
    recorder.attach_to(&row);

    row.dispatch(ManagedEvent::new("Click", &row));
    assert_eq!(recorder.names(), vec!["Click"]);
}

#[test]
fn test_preset_from_record() {
    let record: Record = [
        ("label".to_owned(), Value::from("Delete")),
        ("onClick".to_owned(), Value::from("Remove:row")),
        ("onward".to_owned(), Value::Bool(true)),
    ]
    .into_iter()
    .collect();
    let preset = ViewPreset::from_record(&record).unwrap();

    let row = ManagedObject::new();
    preset.apply(&row).unwrap();
    let recorder = RecordingListener::new();
    recorder.attach_to(&row);
    row.emit("Click");

    assert_eq!(row.get("label"), Some(Value::from("Delete")));
    assert_eq!(row.get("onward"), Some(Value::Bool(true)));
    assert!(!row.has("onClick"));
    let events = recorder.events();
    assert_eq!(events[0].name(), "Remove");
    assert_eq!(events[0].data().get("target"), Some(&Value::from("row")));
}

#[test]
fn test_bindings_are_attached() {
    let binding = RecordingBinding::with_value("bound");
    let row = ManagedObject::new();
    ViewPreset::from_entries([
        ("title", PresetValue::Binding(Rc::new(binding.clone()))),
        ("hidden", PresetValue::Unset),
    ])
    .unwrap()
    .apply(&row)
    .unwrap();

    assert_eq!(binding.bound(), vec![(row.id(), "title".to_owned())]);
    assert_eq!(row.get("title"), Some(Value::from("bound")));
    assert!(!row.has("hidden"));
}

#[test]
fn test_invalid_remaps_are_rejected() {
    assert!(matches!(
        ViewPreset::new().on("Click", "Click"),
        Err(MantleError::InvalidArgument(_))
    ));
    assert!(matches!(
        ViewPreset::from_entries([("onClick", PresetValue::from(true))]),
        Err(MantleError::InvalidArgument(_))
    ));
}

#[test]
fn test_failed_binding_can_be_retried() {
    let row = ManagedObject::new();
    let failing = ViewPreset::new()
        .set("label", "A")
        .bind("title", |_: &ManagedObject, _: &str| -> Result<(), BoxError> {
            Err("no source".into())
        });
    let err = failing.apply(&row).unwrap_err();
    assert!(matches!(err, MantleError::Binding { .. }));
    assert!(!row.has_preset());

    let binding = RecordingBinding::with_value("bound");
    ViewPreset::new()
        .set("label", "B")
        .bind("title", binding.clone())
        .on("Click", "Open")
        .unwrap()
        .apply(&row)
        .unwrap();

    assert!(row.has_preset());
    assert_eq!(row.get("label"), Some(Value::from("B")));
    assert_eq!(row.get("title"), Some(Value::from("bound")));
    let recorder = RecordingListener::new();
    recorder.attach_to(&row);
    row.emit("Click");
    assert_eq!(recorder.names(), vec!["Open"]);
}

#[test]
fn test_preset_applies_once() {
    let row = ManagedObject::new();
    let preset = ViewPreset::new().set("label", "A");
    preset.apply(&row).unwrap();
    let err = preset.apply(&row).unwrap_err();
    assert_eq!(err.operation(), Some(&OperationError::PresetApplied));

    let unlinked = ManagedObject::new();
    unlinked.unlink();
    let err = preset.apply(&unlinked).unwrap_err();
    assert_eq!(err.operation(), Some(&OperationError::Unlinked));
}
