use std::sync::Arc;

use modelkit_core::{Field, FieldType, ModelError, Registry, TypeDef};
use serde_json::json;

fn menagerie() -> Arc<Registry> {
    let mut builder = Registry::builder();
    builder
        .register(
            TypeDef::new("Animal")
                .field(Field::new("name", FieldType::String))
                .field(Field::new("legs", FieldType::Number).default_value(json!(4))),
        )
        .unwrap();
    builder
        .register(
            TypeDef::extends("Dog", "Animal").field(Field::new("breed", FieldType::String)),
        )
        .unwrap();
    builder
        .register(
            TypeDef::extends("Cat", "Animal").field(Field::new("indoor", FieldType::Boolean)),
        )
        .unwrap();
    builder
        .register(
            TypeDef::new("Shelter")
                .field(Field::new("name", FieldType::String))
                .field(Field::new("mascot", FieldType::model("Animal")))
                .field(Field::new("residents", FieldType::array(FieldType::model("Animal")))),
        )
        .unwrap();
    builder.build().unwrap()
}

#[test]
fn lineage_and_the_root_marker() {
    let registry = menagerie();
    let dog = registry.get("Dog").unwrap();
    assert_eq!(dog.lineage(), ["Dog", "Animal"]);

    let instance = dog.create().unwrap();
    assert!(instance.is_of_type("Dog"));
    assert!(instance.is_of_type("Animal"));
    assert!(instance.is_of_type("Model"));
    assert!(!instance.is_of_type("Cat"));
}

#[test]
fn subtypes_inherit_fields_and_defaults() {
    let registry = menagerie();
    let dog = registry
        .get("Dog")
        .unwrap()
        .from_value(json!({ "name": "Rex", "breed": "Samoyed" }))
        .unwrap();

    assert_eq!(dog.get("legs").unwrap().unwrap().as_json(), Some(&json!(4)));
    assert_eq!(
        dog.serialize().unwrap(),
        json!({ "_type": "Dog", "name": "Rex", "legs": 4, "breed": "Samoyed" })
    );
}

#[test]
fn registry_dispatches_on_the_type_tag() {
    let registry = menagerie();
    let animal = registry
        .deserialize(json!({ "_type": "Cat", "name": "Mia", "indoor": true }))
        .unwrap();

    assert!(animal.is_of_type("Cat"));
    assert!(animal.is_of_type("Animal"));
    assert_eq!(animal.get("indoor").unwrap().unwrap().as_json(), Some(&json!(true)));
}

#[test]
fn expected_type_redirects_to_the_tagged_subtype() {
    let registry = menagerie();
    let animal = registry
        .get("Animal")
        .unwrap()
        .deserialize(json!({ "_type": "Dog", "name": "Rex", "breed": "Samoyed" }))
        .unwrap();

    assert_eq!(animal.model_type().name(), "Dog");
    assert_eq!(animal.get("breed").unwrap().unwrap().as_json(), Some(&json!("Samoyed")));
}

#[test]
fn tags_outside_the_expected_lineage_are_rejected() {
    let registry = menagerie();
    let err = registry
        .get("Dog")
        .unwrap()
        .deserialize(json!({ "_type": "Cat", "name": "Mia" }))
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::TypeMismatch {
            expected: "a type compatible with 'Dog'".to_string(),
            actual: "'Cat'".to_string(),
        }
    );

    // Sibling hierarchies do not mix in either direction.
    assert!(registry
        .get("Cat")
        .unwrap()
        .from_value(json!({ "_type": "Shelter" }))
        .is_err());
}

#[test]
fn unknown_and_missing_tags() {
    let registry = menagerie();
    assert_eq!(
        registry
            .deserialize(json!({ "_type": "Unicorn" }))
            .unwrap_err(),
        ModelError::UnknownType("Unicorn".to_string())
    );
    assert_eq!(
        registry.deserialize(json!({ "name": "tagless" })).unwrap_err(),
        ModelError::TypeMismatch {
            expected: "an object carrying a string type tag".to_string(),
            actual: "an object".to_string(),
        }
    );
    assert!(registry.deserialize(json!([])).is_err());
}

#[test]
fn model_fields_accept_any_subtype() {
    let registry = menagerie();
    let shelter_type = registry.get("Shelter").unwrap();

    let mut shelter = shelter_type.create().unwrap();
    let dog = registry
        .get("Dog")
        .unwrap()
        .from_value(json!({ "name": "Rex" }))
        .unwrap();
    shelter.set("mascot", dog).unwrap();
    assert_eq!(
        shelter.submodel("mascot").unwrap().unwrap().model_type().name(),
        "Dog"
    );

    // Tagged nested objects pick their subtype during construction.
    let shelter = shelter_type
        .from_value(json!({
            "residents": [
                { "_type": "Dog", "name": "Rex", "breed": "Samoyed" },
                { "_type": "Cat", "name": "Mia", "indoor": false },
                { "name": "Generic" },
            ],
        }))
        .unwrap();
    let kinds: Vec<String> = (0..3)
        .map(|i| {
            shelter
                .submodel_at("residents", i)
                .unwrap()
                .unwrap()
                .model_type()
                .name()
                .to_string()
        })
        .collect();
    assert_eq!(kinds, ["Dog", "Cat", "Animal"]);
}

#[test]
fn model_fields_reject_foreign_instances() {
    let registry = menagerie();
    let mut shelter = registry.get("Shelter").unwrap().create().unwrap();
    let other = registry.get("Shelter").unwrap().create().unwrap();

    assert_eq!(
        shelter.set("mascot", other).unwrap_err(),
        ModelError::TypeMismatch {
            expected: "an instance of 'Animal'".to_string(),
            actual: "an instance of 'Shelter'".to_string(),
        }
    );
}

#[test]
fn polymorphic_wire_roundtrip() {
    let registry = menagerie();
    let shelter = registry
        .get("Shelter")
        .unwrap()
        .from_value(json!({
            "name": "North",
            "mascot": { "_type": "Cat", "name": "Mia", "indoor": true },
        }))
        .unwrap();

    let wire = shelter.serialize().unwrap();
    let back = registry.deserialize(wire).unwrap();

    assert_eq!(back, shelter);
    let mascot = back.submodel("mascot").unwrap().unwrap();
    assert!(mascot.is_of_type("Cat"));
}

#[test]
fn standalone_types_cannot_resolve_model_fields() {
    let ty = TypeDef::new("Orphan")
        .field(Field::new("pet", FieldType::model("Animal")))
        .build_standalone()
        .unwrap();

    let err = ty.from_value(json!({ "pet": { "name": "x" } })).unwrap_err();
    assert_eq!(err, ModelError::RegistryMissing("Orphan".to_string()));
}
