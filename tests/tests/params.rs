//! Request params conversion and per-call configuration.

use nestauth_tests::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_string_identities_and_destroy_marker() {
    // GIVEN
    init_tracing();
    let registry = schema();
    let ability = ability_for(&registry, Role::Staff);
    let mut store = MemoryStore::new(&registry);
    let seeded = seed(&mut store, &registry);
    let user = registry.get_type_id("User").unwrap();
    let params = json!({
        "user": {
            "vehicles_attributes": [
                { "id": seeded.roadster.raw().to_string(), "_destroy": "1" },
                { "id": seeded.rebel.raw().to_string(), "model": "Shadow", "_destroy": "0" },
            ],
        }
    });
    let proposed = ProposedNode::from_params(&registry, user, &params, &Config::default()).unwrap();
    let root = store.load(seeded.staff).unwrap();

    // WHEN
    let result = AssignmentEngine::new(&registry, &ability).apply(
        &mut store,
        &Actor::new(seeded.staff),
        ActionVerb::Update,
        root,
        &proposed,
    );

    // THEN
    Expect::applied().checks(5).verify(&result).unwrap();
    assert!(store.get(seeded.roadster).is_none());
    assert_eq!(text_attr(&store, seeded.rebel, "model").as_deref(), Some("Shadow"));
    assert_eq!(
        store.members(seeded.staff, "vehicles"),
        &[seeded.caraven, seeded.firebird, seeded.rebel]
    );
}

#[test]
fn test_invalid_identity_is_structural() {
    // GIVEN
    init_tracing();
    let registry = schema();
    let ability = ability_for(&registry, Role::Staff);
    let mut store = MemoryStore::new(&registry);
    let seeded = seed(&mut store, &registry);
    let user = registry.get_type_id("User").unwrap();
    let params = json!({ "vehicles_attributes": [{ "id": "caraven", "make": "makey" }] });
    let config = Config::default().without_resource_key().silenced();
    let proposed = ProposedNode::from_params(&registry, user, &params, &config).unwrap();
    let root = store.load(seeded.staff).unwrap();

    // WHEN
    let result = AssignmentEngine::new(&registry, &ability)
        .with_config(config)
        .apply(&mut store, &Actor::new(seeded.staff), ActionVerb::Update, root, &proposed);

    // THEN
    Expect::structural()
        .error_matching(r#"Invalid identity for vehicles: "caraven""#)
        .verify(&result)
        .unwrap();
}

#[test]
fn test_config_from_document() {
    // GIVEN
    let document = json!({
        "silence_denials": true,
        "implicitly_allow_nested_associations": false,
    });

    // WHEN
    let config: Config = serde_json::from_value(document).unwrap();

    // THEN
    assert_eq!(config, Config::default().silenced().explicit_nested_associations());
    assert!(config.resource_key_in_params);
}

#[test]
fn test_params_under_custom_resource_key() {
    // GIVEN
    let mut builder = nestauth_registry::RegistryBuilder::new();
    builder
        .add_type("Account")
        .resource_key("member")
        .primary_key("uuid")
        .done()
        .unwrap();
    let registry = builder.build().unwrap();
    let account = registry.get_type_id("Account").unwrap();

    // WHEN
    let found = ProposedNode::from_params(&registry, account, &json!({ "member": { "uuid": "9", "nick": "ada" } }), &Config::default());
    let missing = ProposedNode::from_params(&registry, account, &json!({ "account": {} }), &Config::default());

    // THEN
    let found = found.unwrap();
    assert_eq!(found.identity("uuid", "account").unwrap(), Some(EntityKey::new(9)));
    assert!(matches!(
        missing,
        Err(EngineError::Structural(StructuralViolation::MissingResourceKey { ref key })) if key == "member"
    ));
}
