use super::*;

fn variant() -> VariantId {
    VariantId(0)
}

fn factory(stored: bool, steps: Vec<Step>) -> TracedFactory {
    TracedFactory { stored, steps }
}

fn trace(factories: Vec<(&str, TracedFactory)>, fields: &[&str]) -> Trace {
    let v = Some(variant());
    Trace {
        factories: factories
            .into_iter()
            .map(|(n, f)| ((v, n.to_string()), f))
            .collect(),
        fields: fields.iter().map(|n| (v, n.to_string())).collect(),
        variants: vec![(variant(), "Root".to_string())],
        ..Trace::default()
    }
}

#[test]
fn call_then_read_replays() {
    let t = trace(
        vec![
            (
                "Root",
                factory(
                    false,
                    vec![Step::Call("Shape_0".into()), Step::Call("Shape_1".into())],
                ),
            ),
            ("Shape_0", factory(false, vec![Step::Call("Brush".into())])),
            ("Shape_1", factory(false, vec![Step::Read("Brush".into())])),
            ("Brush", factory(true, vec![])),
        ],
        &["Brush"],
    );
    let stats = t.replay().unwrap();
    assert_eq!(stats.constructed, 4);
    assert_eq!(stats.reads, 1);
}

#[test]
fn read_before_call_is_rejected() {
    let t = trace(
        vec![
            (
                "Root",
                factory(
                    false,
                    vec![Step::Read("Brush".into()), Step::Call("Brush".into())],
                ),
            ),
            ("Brush", factory(true, vec![])),
        ],
        &["Brush"],
    );
    assert!(t.replay().unwrap_err().is_engine_fault());
}

#[test]
fn read_of_unstored_object_is_rejected() {
    let t = trace(
        vec![
            (
                "Root",
                factory(
                    false,
                    vec![Step::Call("Brush".into()), Step::Read("Brush".into())],
                ),
            ),
            ("Brush", factory(false, vec![])),
        ],
        &[],
    );
    assert!(t.replay().is_err());
}

#[test]
fn second_call_is_rejected() {
    let t = trace(
        vec![
            (
                "Root",
                factory(
                    false,
                    vec![Step::Call("Brush".into()), Step::Call("Brush".into())],
                ),
            ),
            ("Brush", factory(true, vec![])),
        ],
        &["Brush"],
    );
    assert!(t.replay().is_err());
}

#[test]
fn unreached_factory_is_rejected() {
    let t = trace(
        vec![
            ("Root", factory(false, vec![])),
            ("Orphan", factory(false, vec![])),
        ],
        &[],
    );
    assert!(t.replay().is_err());
}

#[test]
fn shared_factories_exist_before_variants_run() {
    let mut t = trace(
        vec![("Root", factory(false, vec![Step::Read("Logo".into())]))],
        &[],
    );
    t.factories
        .insert((None, "Logo".to_string()), factory(true, vec![]));
    t.fields.insert((None, "Logo".to_string()));
    let stats = t.replay().unwrap();
    assert_eq!(stats.constructed, 2);
    assert_eq!(stats.reads, 1);
}
