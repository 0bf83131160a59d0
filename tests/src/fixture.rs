//! Fixture schema and seed data.
//!
//! Users own vehicles (destroyable) and a profile; vehicles own parts (not
//! destroyable through nesting). Group and brand memberships are plain id
//! lists on the owning record.

use nestauth_core::{attrs, ActionVerb, EntityKey, Value};
use nestauth_registry::{AssociationDef, Registry, RegistryBuilder};
use nestauth_store::MemoryStore;

use crate::{Ability, Actor};

pub const GROUP_A: i64 = 1;
pub const GROUP_B: i64 = 2;
pub const BRAND_CROMWELL: i64 = 1;

/// Build the fixture registry.
pub fn schema() -> Registry {
    let mut builder = RegistryBuilder::new();
    builder
        .add_type("User")
        .association(AssociationDef::has_many("vehicles", "Vehicle").allow_destroy())
        .association(AssociationDef::has_one("profile", "Profile"))
        .done()
        .expect("User type");
    builder
        .add_type("Vehicle")
        .association(AssociationDef::has_many("parts", "Part"))
        .done()
        .expect("Vehicle type");
    builder.add_type("Part").done().expect("Part type");
    builder.add_type("Profile").done().expect("Profile type");
    builder.build().expect("fixture schema")
}

/// Keys of the seeded records.
#[derive(Debug, Clone, Copy)]
pub struct Seeded {
    pub staff: EntityKey,
    pub normal: EntityKey,
    pub creative: EntityKey,
    pub vehicle_and_user: EntityKey,
    pub caraven: EntityKey,
    pub roadster: EntityKey,
    pub firebird: EntityKey,
    pub rebel: EntityKey,
    pub engine: EntityKey,
    pub frame: EntityKey,
    pub profile: EntityKey,
}

/// Seed the fixture records. The staff user owns every vehicle and the
/// profile; only the Caraven has parts.
pub fn seed(store: &mut MemoryStore<'_>, registry: &Registry) -> Seeded {
    let ty = |name: &str| registry.get_type_id(name).expect("fixture type");
    let user = |first: &str, last: &str, email: &str, groups: Vec<i64>| {
        attrs! {
            "first_name" => first,
            "last_name" => last,
            "email" => email,
            "group_ids" => groups,
        }
    };

    let staff = store.insert(ty("User"), user("Ben", "Dana", "test@test.test", vec![GROUP_A]));
    let normal = store.insert(ty("User"), user("Victor", "Frankenstein", "test2@test.test", vec![]));
    let creative = store.insert(ty("User"), user("Mary", "Shelley", "test3@test.test", vec![]));
    let vehicle_and_user = store.insert(ty("User"), user("Henry", "Clerval", "test4@test.test", vec![]));

    let vehicle = |make: &str, model: &str| attrs! { "make" => make, "model" => model };
    let caraven = store.insert(ty("Vehicle"), vehicle("Dodge", "Caraven"));
    let roadster = store.insert(ty("Vehicle"), vehicle("Tesla", "Roadster"));
    let firebird = store.insert(ty("Vehicle"), vehicle("Ford", "Firebird"));
    let rebel = store.insert(ty("Vehicle"), vehicle("Honda", "Rebel"));
    for key in [caraven, roadster, firebird, rebel] {
        store.link(staff, "vehicles", key).expect("link vehicle");
    }

    let part = |name: &str| attrs! { "name" => name, "brand_ids" => Vec::<i64>::new() };
    let engine = store.insert(ty("Part"), part("Engine"));
    let frame = store.insert(ty("Part"), part("Frame"));
    store.link(caraven, "parts", engine).expect("link part");
    store.link(caraven, "parts", frame).expect("link part");

    let profile = store.insert(ty("Profile"), attrs! { "bio" => "Staff" });
    store.link(staff, "profile", profile).expect("link profile");

    Seeded {
        staff,
        normal,
        creative,
        vehicle_and_user,
        caraven,
        roadster,
        firebird,
        rebel,
        engine,
        frame,
        profile,
    }
}

/// Fixture roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Updates itself and its vehicles and parts; cannot create vehicles.
    Staff,
    /// Updates its own name only.
    Normal,
    /// Creates users; cannot touch vehicles.
    Creative,
    /// Creates users and vehicles; cannot create parts.
    VehicleAndUser,
}

/// The ability of a role.
pub fn ability_for(registry: &Registry, role: Role) -> Ability {
    use ActionVerb::{Create, Destroy, Update};

    let ty = |name: &str| registry.get_type_id(name).expect("fixture type");
    let (user, vehicle, part, profile) = (ty("User"), ty("Vehicle"), ty("Part"), ty("Profile"));

    match role {
        Role::Staff => Ability::new()
            .can_if(
                &[Update],
                user,
                &["first_name", "last_name", "vehicles_attributes", "group_ids"],
                |actor: &Actor, e| actor.is(e),
            )
            .can(&[Update, Destroy], vehicle, &["make", "model", "parts_attributes"])
            .can(&[Update], part, &["name", "brand_ids"])
            .can(&[Update], profile, &["bio"]),
        Role::Normal => Ability::new().can_if(
            &[Update],
            user,
            &["first_name", "last_name"],
            |actor: &Actor, e| actor.is(e),
        ),
        Role::Creative => Ability::new().can(
            &[Create],
            user,
            &["first_name", "last_name", "email", "group_ids", "vehicles_attributes"],
        ),
        Role::VehicleAndUser => Ability::new()
            .can(
                &[Create],
                user,
                &["first_name", "last_name", "email", "group_ids", "vehicles_attributes"],
            )
            .can(&[Create], vehicle, &["make", "model", "parts_attributes"]),
    }
}

/// A string attribute of a stored record.
pub fn text_attr(store: &MemoryStore<'_>, key: EntityKey, name: &str) -> Option<String> {
    store
        .get(key)
        .and_then(|r| r.attributes.get(name))
        .and_then(Value::as_str)
        .map(str::to_string)
}
