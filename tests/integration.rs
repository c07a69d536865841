use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use polycodec::{
    AnyEntity, Codec, Entity, Error, Poly, Settings, Shared, TypeNameHandling, TypeRegistry,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::thread;

trait Shape: Entity {
    fn area(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Circle {
    radius: f64,
}

impl Shape for Circle {
    fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Square {
    side: f64,
}

impl Shape for Square {
    fn area(&self) -> f64 {
        self.side * self.side
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Drawing {
    title: String,
    shapes: Vec<Poly<dyn Shape>>,
    highlight: Option<Poly<dyn Shape>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    name: String,
    #[serde(with = "polycodec::values::date::naive")]
    birth: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Meeting {
    #[serde(with = "polycodec::values::date")]
    at: DateTime<Utc>,
    duration_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Badge {
    number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Roster {
    lead: Badge,
    badges: Vec<Badge>,
    spare: Option<Badge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Attachment {
    name: String,
    #[serde(with = "polycodec::values::bytes")]
    data: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Employee {
    name: String,
    manager: Option<Shared<Employee>>,
    reports: Vec<Shared<Employee>>,
}

fn codec() -> Codec {
    let registry = TypeRegistry::builder()
        .register_as::<dyn Shape, Circle>(|circle| circle)
        .register_as::<dyn Shape, Square>(|square| square)
        .register::<Person>()
        .build()
        .unwrap();
    Codec::new(Settings::builder().with_registry(registry).build())
}

fn assert_round_trip<T>(codec: &Codec, value: T)
where
    T: Serialize + for<'de> Deserialize<'de> + PartialEq + Debug,
{
    let json = codec.encode_json(&value).unwrap();
    assert_eq!(codec.decode_json::<T>(&json).unwrap(), value, "{}", json);

    let bytes = codec.encode_binary(&value).unwrap();
    assert_eq!(codec.decode_binary::<T>(&bytes).unwrap(), value);
}

#[test]
fn primitives() {
    let codec = codec();

    assert_round_trip(&codec, 42i32);
    assert_round_trip(&codec, i64::MIN);
    assert_round_trip(&codec, u8::MAX);
    assert_round_trip(&codec, 3.5f64);
    assert_round_trip(&codec, -0.25f32);
    assert_round_trip(&codec, 1e10f64);
    assert_round_trip(&codec, true);
    assert_round_trip(&codec, 'x');
    assert_round_trip(&codec, "Hello, world".to_string());
    assert_round_trip(&codec, String::new());
    assert_round_trip(&codec, Option::<i32>::None);
    assert_round_trip(&codec, Some(7u16));
    assert_round_trip(&codec, vec![1u32, 2, 3]);
    assert_round_trip(&codec, (1i8, "two".to_string(), false));
}

#[test]
fn records() {
    let codec = codec();
    let mut people = BTreeMap::new();
    people.insert(
        "alice".to_string(),
        Person {
            name: "Alice".to_string(),
            birth: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        },
    );

    assert_round_trip(&codec, people);
    assert_round_trip(
        &codec,
        Meeting {
            at: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
            duration_hours: 1.5,
        },
    );
}

#[test]
fn strict_records() {
    let codec = codec();

    assert_round_trip(&codec, Badge { number: 7 });
    assert_round_trip(
        &codec,
        Roster {
            lead: Badge { number: 1 },
            badges: vec![Badge { number: 2 }, Badge { number: 3 }],
            spare: Some(Badge { number: 4 }),
        },
    );
}

#[test]
fn binary_fields() {
    let codec = codec();
    let attachment = Attachment {
        name: "key".to_string(),
        data: vec![0, 1, 2, 254, 255],
    };

    let json = codec.encode_json(&attachment).unwrap();

    assert!(json.contains(r#""data":"AAEC/v8=""#), "{}", json);
    assert_round_trip(&codec, attachment);
}

#[test]
fn reserved_map_keys() {
    let codec = codec();

    for key in ["$value", "$type"] {
        let mut map = BTreeMap::new();
        map.insert(key.to_string(), 1);

        assert!(matches!(codec.encode_binary(&map), Err(Error::Encoding(_))));
        assert!(matches!(codec.encode_json(&map), Err(Error::Encoding(_))));
    }
}

#[test]
fn alice() {
    let codec = codec();
    let alice = Person {
        name: "Alice".to_string(),
        birth: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
    };

    let json = codec.encode_json(&alice).unwrap();

    assert!(json.contains(r#""birth":"2024-01-02T00:00:00Z""#), "{}", json);
    assert!(json.contains(r#""$type":"Person""#), "{}", json);
    assert_eq!(codec.decode_json::<Person>(&json).unwrap(), alice);
}

#[test]
fn polymorphic_fields_keep_their_concrete_type() {
    let codec = codec();
    let drawing = Drawing {
        title: "shapes".to_string(),
        shapes: vec![
            Poly::new(Box::new(Circle { radius: 1.0 })),
            Poly::new(Box::new(Square { side: 2.0 })),
        ],
        highlight: Some(Poly::new(Box::new(Square { side: 3.0 }))),
    };

    for decoded in [
        codec
            .decode_json::<Drawing>(&codec.encode_json(&drawing).unwrap())
            .unwrap(),
        codec
            .decode_binary::<Drawing>(&codec.encode_binary(&drawing).unwrap())
            .unwrap(),
    ] {
        assert_eq!(decoded.title, "shapes");
        assert_eq!(
            decoded.shapes[0].downcast_ref::<Circle>(),
            Some(&Circle { radius: 1.0 })
        );
        assert_eq!(
            decoded.shapes[1].downcast_ref::<Square>(),
            Some(&Square { side: 2.0 })
        );
        assert_eq!(decoded.shapes[1].area(), 4.0);

        let highlight = decoded.highlight.unwrap();
        assert!(highlight.is::<Square>());
        assert_eq!(highlight.type_tag(), "Square");
    }
}

#[test]
fn polymorphic_fields_are_tagged_without_struct_tags() {
    let registry = TypeRegistry::builder()
        .register_as::<dyn Shape, Circle>(|circle| circle)
        .build()
        .unwrap();
    let codec = Codec::new(
        Settings::builder()
            .with_type_name_handling(TypeNameHandling::Polymorphic)
            .with_registry(registry)
            .build(),
    );
    let drawing = Drawing {
        title: "one".to_string(),
        shapes: vec![Poly::new(Box::new(Circle { radius: 2.0 }))],
        highlight: None,
    };

    let json = codec.encode_json(&drawing).unwrap();

    assert!(!json.contains(r#""$type":"Drawing""#), "{}", json);
    assert!(json.contains(r#""$type":"Circle""#), "{}", json);
    let decoded = codec.decode_json::<Drawing>(&json).unwrap();
    assert!(decoded.shapes[0].is::<Circle>());
}

#[test]
fn abstract_root() {
    let codec = codec();
    let shape: Poly<dyn Shape> = Poly::new(Box::new(Circle { radius: 0.5 }));

    let bytes = codec.encode_binary(&shape).unwrap();
    let decoded = codec.decode_binary::<Poly<dyn Shape>>(&bytes).unwrap();
    assert!(decoded.is::<Circle>());

    let any = codec.decode_binary::<AnyEntity>(&bytes).unwrap();
    assert_eq!(any.downcast_ref::<Circle>(), Some(&Circle { radius: 0.5 }));
}

#[test]
fn incompatible_polymorphic_value() {
    let codec = codec();
    let json = codec
        .encode_json(&Person {
            name: "Alice".to_string(),
            birth: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        })
        .unwrap();

    match codec.decode_json::<Poly<dyn Shape>>(&json) {
        Err(Error::TypeMismatch { found, .. }) => assert_eq!(found, "Person"),
        other => panic!("Expected TypeMismatch, got {:?}", other),
    }
}

#[test]
fn unknown_tag() {
    let codec = codec();

    let result = codec.decode_json::<Drawing>(
        r#"{"title":"t","shapes":[{"$type":"Triangle","base":1.0}],"highlight":null}"#,
    );

    assert!(matches!(result, Err(Error::Decoding(_))), "{:?}", result);
}

#[test]
fn reference_cycles_are_dropped() {
    let codec = codec();
    let boss = Shared::new(Employee {
        name: "boss".to_string(),
        manager: None,
        reports: vec![],
    });
    let worker = Shared::new(Employee {
        name: "worker".to_string(),
        manager: Some(boss.clone()),
        reports: vec![],
    });
    boss.write().reports.push(worker.clone());

    let json = codec.encode_json(&boss).unwrap();
    let bytes = codec.encode_binary(&boss).unwrap();
    worker.write().manager = None;

    for decoded in [
        codec.decode_json::<Shared<Employee>>(&json).unwrap(),
        codec.decode_binary::<Shared<Employee>>(&bytes).unwrap(),
    ] {
        let boss = decoded.read();
        assert_eq!(boss.name, "boss");
        assert_eq!(boss.reports.len(), 1);

        let worker = boss.reports[0].read();
        assert_eq!(worker.name, "worker");
        assert!(worker.manager.is_none());
    }
}

#[test]
fn self_reference() {
    let codec = codec();
    let me = Shared::new(Employee {
        name: "me".to_string(),
        manager: None,
        reports: vec![],
    });
    me.write().manager = Some(me.clone());

    let json = codec.encode_json(&me).unwrap();
    me.write().manager = None;

    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&json).unwrap(),
        serde_json::json!({"$type": "Employee", "name": "me", "manager": null, "reports": []})
    );
}

#[test]
fn dates_do_not_depend_on_the_offset_they_were_written_with() {
    let codec = codec();

    let utc = codec
        .decode_json::<Meeting>(
            r#"{"$type":"Meeting","at":"2024-01-02T10:00:00Z","duration_hours":0.5}"#,
        )
        .unwrap();
    let paris = codec
        .decode_json::<Meeting>(
            r#"{"$type":"Meeting","at":"2024-01-02T11:00:00+01:00","duration_hours":0.5}"#,
        )
        .unwrap();

    assert_eq!(utc, paris);
    assert_eq!(
        codec.encode_json(&paris).unwrap(),
        r#"{"$type":"Meeting","at":"2024-01-02T10:00:00Z","duration_hours":0.5}"#
    );
}

#[test]
fn malformed_text() {
    let codec = codec();

    assert!(matches!(
        codec.decode_json::<Person>(r#"{"a":"#),
        Err(Error::Parse(_))
    ));
    assert!(matches!(
        codec.decode_json::<serde_json::Value>(r#"{"a":"#),
        Err(Error::Parse(_))
    ));
}

#[test]
fn malformed_binary() {
    let codec = codec();
    let bytes = codec.encode_binary(&Circle { radius: 1.0 }).unwrap();

    assert!(matches!(
        codec.decode_binary::<Circle>(&bytes[..bytes.len() / 2]),
        Err(Error::Decoding(_))
    ));
    assert!(matches!(
        codec.decode_binary::<Circle>(b"not bson"),
        Err(Error::Decoding(_))
    ));
}

#[test]
fn wrong_root_type() {
    let codec = codec();
    let bytes = codec.encode_binary(&Circle { radius: 1.0 }).unwrap();

    assert!(matches!(
        codec.decode_binary::<Square>(&bytes),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn tagged_root_read_as_an_untagged_type() {
    let codec = codec();
    let json = codec.encode_json(&Circle { radius: 1.0 }).unwrap();
    let bytes = codec.encode_binary(&Circle { radius: 1.0 }).unwrap();

    match codec.decode_json::<i32>(&json) {
        Err(Error::TypeMismatch { expected, found }) => {
            assert_eq!(expected, "i32");
            assert_eq!(found, "Circle");
        }
        other => panic!("Expected TypeMismatch, got {:?}", other),
    }
    assert!(matches!(
        codec.decode_binary::<Vec<i32>>(&bytes),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn out_of_range_values() {
    let codec = codec();

    assert!(matches!(
        codec.encode_binary(&u64::MAX),
        Err(Error::Encoding(_))
    ));
    assert!(matches!(
        codec.encode_json(&Circle { radius: f64::NAN }),
        Err(Error::Encoding(_))
    ));
}

#[test]
fn concurrent_use() {
    let codec = codec();

    let handles = (0..8)
        .map(|i| {
            let codec = codec.clone();
            thread::spawn(move || {
                for j in 0..50 {
                    let shape: Poly<dyn Shape> = Poly::new(Box::new(Square {
                        side: f64::from(i * 100 + j),
                    }));
                    let bytes = codec.encode_binary(&shape).unwrap();
                    let decoded = codec.decode_binary::<Poly<dyn Shape>>(&bytes).unwrap();
                    assert_eq!(decoded.area(), shape.area());
                }
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.join().unwrap();
    }
}
