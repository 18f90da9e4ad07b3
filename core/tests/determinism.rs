use serde_json::{Value, json};

mod common;
use common::*;

/// The same section resource with every object's properties in reverse order
fn section(reversed: bool) -> Value {
    let period_properties = if reversed {
        json!({ "periodName": string(60), "beginDate": { "type": "string", "format": "date" } })
    } else {
        json!({ "beginDate": { "type": "string", "format": "date" }, "periodName": string(60) })
    };
    let periods = array_of(object(period_properties, &["periodName"]));
    let location = object(json!({ "room": string(20), "building": string(20) }), &[]);

    let properties = if reversed {
        json!({
            "sectionIdentifier": string(255),
            "periods": periods,
            "location": location,
            "availableCredits": { "type": "number" },
            "academicSubjectDescriptor": string(306)
        })
    } else {
        json!({
            "academicSubjectDescriptor": string(306),
            "availableCredits": { "type": "number" },
            "location": location,
            "periods": periods,
            "sectionIdentifier": string(255)
        })
    };

    let mut section = with_descriptor(
        resource("Section", &["$.sectionIdentifier"], object(properties, &["sectionIdentifier"])),
        "AcademicSubject",
        "$.academicSubjectDescriptor",
        "AcademicSubjectDescriptor",
    );
    section["decimalPropertyValidationInfos"] = json!([
        { "path": "$.availableCredits", "totalDigits": 9, "decimalPlaces": 3 }
    ]);
    section
}

#[test]
fn property_order_does_not_change_the_model() {
    let forward = build(&api_schema(json!({ "sections": section(false) })), "sections").unwrap();
    let reversed = build(&api_schema(json!({ "sections": section(true) })), "sections").unwrap();

    assert_eq!(forward, reversed);

    let names: Vec<_> = forward.root.column_names().collect();
    assert_eq!(
        names,
        vec![
            "DocumentId",
            "AcademicSubject_DescriptorId",
            "AvailableCredits",
            "LocationBuilding",
            "LocationRoom",
            "SectionIdentifier",
        ]
    );
}

#[test]
fn building_twice_is_byte_identical() {
    let doc = api_schema(json!({ "sections": section(false) }));
    let first = serde_json::to_string(&build(&doc, "sections").unwrap()).unwrap();
    let second = serde_json::to_string(&build(&doc, "sections").unwrap()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn tables_are_ordered_by_depth_then_scope() {
    let model = build(&api_schema(json!({ "sections": section(true) })), "sections").unwrap();

    let scopes: Vec<_> = model
        .tables_in_dependency_order
        .iter()
        .map(|t| t.json_scope.canonical())
        .collect();
    assert_eq!(scopes, vec!["$", "$.periods[*]"]);
    assert_eq!(model.root, model.tables_in_dependency_order[0]);
}
