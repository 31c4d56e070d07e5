// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Rulesets that vehicle payloads must satisfy.

use vehicle_world_core::schema::{Bound, Field, Presence, Schema};

/// Message reported when a registration code contains unsupported characters.
const ALPHANUMERIC_MESSAGE: &str = "must not contain whitespace";

/// Builds the ruleset for vehicle payloads where every field has the given `presence`.
fn vehicle_schema(presence: Presence) -> Schema {
    Schema::new(vec![
        Field::string("manufacturer", presence).lowercase().max_length(30).trimmed(),
        Field::string("model", presence).lowercase().max_length(30).trimmed(),
        Field::string("fuel", presence).lowercase().max_length(20).trimmed(),
        Field::string("type", presence).lowercase().max_length(30).trimmed(),
        Field::string("color", presence).lowercase().max_length(25).trimmed(),
        Field::string("VIN", presence)
            .exact_length(17)
            .charset(char::is_ascii_alphanumeric, ALPHANUMERIC_MESSAGE)
            .uppercase(),
        Field::string("VRM", presence)
            .exact_length(7)
            .charset(char::is_ascii_alphanumeric, ALPHANUMERIC_MESSAGE)
            .uppercase(),
        Field::boolean("used", presence),
        Field::number("modelYear", presence).at_most(Bound::YearsFromNow(1)),
    ])
}

/// Ruleset for the creation of vehicles: all fields are required.
pub(crate) fn create_ruleset() -> Schema {
    vehicle_schema(Presence::Required)
}

/// Ruleset for the modification of vehicles: all fields are optional.
pub(crate) fn update_ruleset() -> Schema {
    vehicle_schema(Presence::Optional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use time::OffsetDateTime;
    use time::macros::datetime;

    /// Fixed validation time for all tests.
    const NOW: OffsetDateTime = datetime!(2024-05-10 12:00:00 UTC);

    /// The reference payload that satisfies the creation ruleset.
    fn reference() -> Value {
        json!({
            "manufacturer": "toyota",
            "model": "camry",
            "fuel": "gas",
            "type": "sedan",
            "color": "white",
            "VIN": "TNRU392EESIR93ERF",
            "VRM": "ETHR382",
            "used": true,
            "modelYear": 2024,
        })
    }

    /// Returns the reference payload with `key` set to `value`.
    fn with(key: &str, value: Value) -> Value {
        let mut document = reference();
        document[key] = value;
        document
    }

    /// Returns the reference payload without `key`.
    fn without(key: &str) -> Value {
        let mut document = reference();
        document.as_object_mut().unwrap().remove(key);
        document
    }

    /// Validates `document` with `schema` and returns the error message, if any.
    fn check(schema: Schema, document: Value) -> Option<String> {
        schema.validate(&document, NOW).err().map(|e| e.message)
    }

    #[test]
    fn test_create_reference_ok() {
        assert_eq!(None, check(create_ruleset(), reference()));
    }

    #[test]
    fn test_create_field_order_matches_declaration() {
        let names = create_ruleset().fields().iter().map(Field::name).collect::<Vec<&str>>();
        assert_eq!(
            vec![
                "manufacturer",
                "model",
                "fuel",
                "type",
                "color",
                "VIN",
                "VRM",
                "used",
                "modelYear"
            ],
            names
        );
    }

    #[test]
    fn test_create_missing_fields() {
        for key in reference().as_object().unwrap().keys() {
            assert_eq!(
                Some(format!("{} is a required field", key)),
                check(create_ruleset(), without(key))
            );
            assert_eq!(
                Some(format!("{} is a required field", key)),
                check(create_ruleset(), with(key, Value::Null))
            );
        }
    }

    #[test]
    fn test_create_first_missing_field_wins() {
        assert_eq!(
            Some("manufacturer is a required field".to_owned()),
            check(create_ruleset(), json!({"used": "not a boolean"}))
        );
    }

    #[test]
    fn test_create_empty_strings() {
        for key in ["manufacturer", "model", "fuel", "type", "color"] {
            assert_eq!(
                Some(format!("{} is a required field", key)),
                check(create_ruleset(), with(key, json!("")))
            );
        }
        assert_eq!(
            Some("VIN must be exactly 17 characters".to_owned()),
            check(create_ruleset(), with("VIN", json!("")))
        );
        assert_eq!(
            Some("VRM must be exactly 7 characters".to_owned()),
            check(create_ruleset(), with("VRM", json!("")))
        );
    }

    #[test]
    fn test_lowercase_fields() {
        let limits = [
            ("manufacturer", 30),
            ("model", 30),
            ("fuel", 20),
            ("type", 30),
            ("color", 25),
        ];
        for (key, max) in limits {
            assert_eq!(
                Some(format!("{} must be a lowercase string", key)),
                check(create_ruleset(), with(key, json!("Toyota")))
            );

            let at_max = "a".repeat(max);
            assert_eq!(None, check(create_ruleset(), with(key, json!(at_max))));

            let too_long = "a".repeat(max + 1);
            assert_eq!(
                Some(format!("{} must be at most {} characters", key, max)),
                check(create_ruleset(), with(key, json!(too_long)))
            );

            assert_eq!(
                Some(format!("{} must be a trimmed string", key)),
                check(create_ruleset(), with(key, json!(" toyota ")))
            );

            assert_eq!(
                Some(format!("{} must be a `string` type, but the final value was: `5`.", key)),
                check(create_ruleset(), with(key, json!(5)))
            );
        }
    }

    #[test]
    fn test_lowercase_checked_before_length() {
        let too_long_and_upper = "A".repeat(31);
        assert_eq!(
            Some("manufacturer must be a lowercase string".to_owned()),
            check(create_ruleset(), with("manufacturer", json!(too_long_and_upper)))
        );
    }

    #[test]
    fn test_length_checked_before_trim() {
        let too_long_and_untrimmed = format!(" {}", "a".repeat(30));
        assert_eq!(
            Some("manufacturer must be at most 30 characters".to_owned()),
            check(create_ruleset(), with("manufacturer", json!(too_long_and_untrimmed)))
        );
    }

    #[test]
    fn test_registration_codes() {
        for (key, len, valid) in [("VIN", 17, "TNRU392EESIR93ERF"), ("VRM", 7, "ETHR382")] {
            assert_eq!(
                Some(format!("{} must be exactly {} characters", key, len)),
                check(create_ruleset(), with(key, json!(&valid[1..])))
            );
            assert_eq!(
                Some(format!("{} must be exactly {} characters", key, len)),
                check(create_ruleset(), with(key, json!(format!("{}A", valid))))
            );

            let with_space = format!("{} {}", &valid[..2], &valid[3..]);
            assert_eq!(
                Some(format!("{} must not contain whitespace", key)),
                check(create_ruleset(), with(key, json!(with_space)))
            );

            let with_symbol = format!("{}-", &valid[1..]);
            assert_eq!(
                Some(format!("{} must not contain whitespace", key)),
                check(create_ruleset(), with(key, json!(with_symbol)))
            );

            assert_eq!(
                Some(format!("{} must be a upper case string", key)),
                check(create_ruleset(), with(key, json!(valid.to_lowercase())))
            );

            assert_eq!(
                Some(format!(
                    concat!(
                        "{} must be a `string` type, but the final value was: ",
                        "`[\n  \"\\\"{}\\\"\"\n]`.",
                    ),
                    key, valid
                )),
                check(create_ruleset(), with(key, json!([valid])))
            );
        }
    }

    #[test]
    fn test_registration_code_length_checked_before_charset() {
        assert_eq!(
            Some("VRM must be exactly 7 characters".to_owned()),
            check(create_ruleset(), with("VRM", json!("e h")))
        );
    }

    #[test]
    fn test_used() {
        assert_eq!(None, check(create_ruleset(), with("used", json!(false))));
        assert_eq!(
            Some("used must be a `boolean` type, but the final value was: `\"true\"`.".to_owned()),
            check(create_ruleset(), with("used", json!("true")))
        );
    }

    #[test]
    fn test_model_year() {
        assert_eq!(None, check(create_ruleset(), with("modelYear", json!(2025))));
        assert_eq!(None, check(create_ruleset(), with("modelYear", json!(-500))));
        assert_eq!(None, check(create_ruleset(), with("modelYear", json!(2024.5))));
        assert_eq!(
            Some("modelYear must be less than or equal to 2025".to_owned()),
            check(create_ruleset(), with("modelYear", json!(2026)))
        );
        assert_eq!(
            Some("modelYear must be less than or equal to 2025".to_owned()),
            check(create_ruleset(), with("modelYear", json!(2025.1)))
        );
        assert_eq!(
            Some(
                "modelYear must be a `number` type, but the final value was: `\"2020\"`."
                    .to_owned()
            ),
            check(create_ruleset(), with("modelYear", json!("2020")))
        );
    }

    #[test]
    fn test_model_year_bound_follows_the_clock() {
        let document = with("modelYear", json!(2026));
        create_ruleset().validate(&document, NOW).unwrap_err();
        create_ruleset().validate(&document, datetime!(2025-01-01 00:00:00 UTC)).unwrap();
    }

    #[test]
    fn test_unknown_properties() {
        let mut document = reference();
        document["color2"] = json!("red");
        document["_id"] = json!("0123456789abcdef01234567");
        assert_eq!(
            Some("unknown property: color2, _id".to_owned()),
            check(create_ruleset(), document)
        );
        assert_eq!(
            Some("unknown property: extra".to_owned()),
            check(update_ruleset(), json!({"extra": 1}))
        );
    }

    #[test]
    fn test_unknown_properties_checked_before_fields() {
        assert_eq!(
            Some("unknown property: extra".to_owned()),
            check(create_ruleset(), json!({"extra": 1}))
        );
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(
            Some("this must be a `object` type, but the final value was: `[]`.".to_owned()),
            check(update_ruleset(), json!([]))
        );
    }

    #[test]
    fn test_update_empty_ok() {
        assert_eq!(None, check(update_ruleset(), json!({})));
    }

    #[test]
    fn test_update_partial_ok() {
        assert_eq!(None, check(update_ruleset(), json!({"color": "red"})));
        assert_eq!(None, check(update_ruleset(), reference()));
    }

    #[test]
    fn test_update_empty_strings_ok() {
        for key in ["manufacturer", "model", "fuel", "type", "color"] {
            assert_eq!(None, check(update_ruleset(), json!({ key: "" })));
        }
    }

    #[test]
    fn test_update_null_rejected() {
        for key in reference().as_object().unwrap().keys() {
            assert_eq!(
                Some(format!("{} cannot be null", key)),
                check(update_ruleset(), json!({ key: null }))
            );
        }
    }

    #[test]
    fn test_update_same_constraints() {
        assert_eq!(
            Some("fuel must be at most 20 characters".to_owned()),
            check(update_ruleset(), json!({"fuel": "a".repeat(21)}))
        );
        assert_eq!(
            Some("VIN must be a upper case string".to_owned()),
            check(update_ruleset(), json!({"VIN": "tnru392eesir93erf"}))
        );
        assert_eq!(
            Some("modelYear must be less than or equal to 2025".to_owned()),
            check(update_ruleset(), json!({"modelYear": 3000}))
        );
    }
}
