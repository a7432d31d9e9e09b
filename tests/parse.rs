//! End-to-end parsing: argument tokens, environment entries, and YAML
//! documents layered onto one destination struct.

use std::collections::HashMap;
use std::io::Write;

use serde::{Deserialize, Serialize};
use yamlfig::{Config, Yamlfig, YamlfigError};

#[derive(Yamlfig, Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
struct App {
    /// Display name.
    #[yamlfig(flag = "n")]
    name: String,
    count: u32,
    server: Server,
    endpoints: Vec<Endpoint>,
    limits: HashMap<String, Limit>,
    db: Option<Db>,
}

#[derive(Yamlfig, Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default)]
struct Server {
    host: String,
    pool_size: u32,
}

#[derive(Yamlfig, Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default)]
struct Endpoint {
    url: String,
}

#[derive(Yamlfig, Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default)]
struct Limit {
    max: u64,
}

#[derive(Yamlfig, Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default)]
struct Db {
    host: String,
}

#[test]
fn tokens_set_exactly_the_named_fields() {
    let mut app = App::default();
    Config::new(&mut app)
        .parse_arguments(["--name=alice", "--count=3"])
        .unwrap();
    assert_eq!(app.name, "alice");
    assert_eq!(app.count, 3);
    assert_eq!(app.server, Server::default());
    assert!(app.endpoints.is_empty());
}

#[test]
fn zero_arguments_are_a_no_op() {
    let mut app = App::default();
    app.name = "kept".into();
    Config::new(&mut app).parse_arguments::<[&str; 0]>([]).unwrap();
    assert_eq!(app.name, "kept");
    assert_eq!(app, {
        let mut expected = App::default();
        expected.name = "kept".into();
        expected
    });
}

#[test]
fn flag_alias_addresses_the_field() {
    let mut app = App::default();
    Config::new(&mut app).parse_arguments(["-n=carol"]).unwrap();
    assert_eq!(app.name, "carol");
}

#[test]
fn nested_fields_accept_dotted_and_underscore_keys() {
    let mut app = App::default();
    Config::new(&mut app)
        .parse_arguments(["--server.host=0.0.0.0", "SERVER_POOL_SIZE=8"])
        .unwrap();
    assert_eq!(app.server.host, "0.0.0.0");
    assert_eq!(app.server.pool_size, 8);
}

#[test]
fn sequence_indices_grow_the_container() {
    let mut app = App::default();
    Config::new(&mut app)
        .parse_arguments(["--endpoints.0.url=http://a", "--endpoints.1.url=http://b"])
        .unwrap();
    assert_eq!(app.endpoints.len(), 2);
    assert_eq!(app.endpoints[0].url, "http://a");
    assert_eq!(app.endpoints[1].url, "http://b");
}

#[test]
fn map_keys_are_created_on_demand() {
    let mut app = App::default();
    Config::new(&mut app)
        .parse_arguments(["--limits.default.max=10"])
        .unwrap();
    assert_eq!(app.limits["default"].max, 10);
}

#[test]
fn optional_nested_struct_is_created_by_a_token() {
    let mut app = App::default();
    Config::new(&mut app)
        .parse_arguments(["--db.host=pg"])
        .unwrap();
    assert_eq!(app.db.as_ref().unwrap().host, "pg");
}

#[test]
fn unmatched_tokens_are_not_an_error() {
    let mut app = App::default();
    Config::new(&mut app)
        .parse_arguments(["--bogus=1", "--name=alice"])
        .unwrap();
    assert_eq!(app.name, "alice");
}

#[test]
fn scalar_onto_string_field_coerces() {
    let mut app = App::default();
    Config::new(&mut app).parse_arguments(["--name=42"]).unwrap();
    assert_eq!(app.name, "42");
}

#[test]
fn environment_entries_are_filtered_by_prefix() {
    let mut app = App::default();
    Config::new(&mut app)
        .env_prefix("APP_")
        .parse_environment(["APP_NAME=bob", "OTHER=1"])
        .unwrap();
    assert_eq!(app.name, "bob");
    assert_eq!(app.count, 0);
}

#[test]
fn environment_without_prefix_configured_is_inert() {
    let mut app = App::default();
    Config::new(&mut app)
        .parse_environment(["APP_NAME=bob"])
        .unwrap();
    assert_eq!(app, App::default());
}

#[test]
fn empty_prefix_disables_environment_parsing() {
    let mut app = App::default();
    Config::new(&mut app)
        .env_prefix("")
        .parse_environment(["APP_NAME=bob"])
        .unwrap();
    assert_eq!(app, App::default());
}

#[test]
fn zero_environment_entries_are_a_no_op() {
    let mut app = App::default();
    Config::new(&mut app)
        .env_prefix("APP_")
        .parse_environment::<[&str; 0]>([])
        .unwrap();
    assert_eq!(app, App::default());
}

#[test]
fn nested_environment_entries_reach_nested_fields() {
    let mut app = App::default();
    Config::new(&mut app)
        .env_prefix("APP_")
        .parse_environment(["APP_SERVER_HOST=10.0.0.1"])
        .unwrap();
    assert_eq!(app.server.host, "10.0.0.1");
}

#[test]
fn malformed_prefix_errors_on_first_read() {
    let mut app = App::default();
    let err = Config::new(&mut app)
        .env_prefix("APP(")
        .parse_environment(["APP_NAME=bob"])
        .unwrap_err();
    assert!(matches!(err, YamlfigError::InvalidEnvPrefix { .. }));
    assert_eq!(app, App::default());
}

#[test]
fn yaml_file_then_arguments_layer_last_write_wins() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "name: from-file\ncount: 7\nserver:\n  host: file-host\n"
    )
    .unwrap();

    let mut app = App::default();
    let mut config = Config::new(&mut app);
    config
        .parse_yaml(std::fs::File::open(file.path()).unwrap())
        .unwrap();
    config.parse_arguments(["--name=from-args"]).unwrap();

    assert_eq!(app.name, "from-args");
    assert_eq!(app.count, 7);
    assert_eq!(app.server.host, "file-host");
}

#[test]
fn decode_failure_leaves_the_destination_as_it_was() {
    let mut app = App::default();
    app.count = 5;
    let err = Config::new(&mut app)
        .parse_arguments(["--count=not-a-number"])
        .unwrap_err();
    assert!(matches!(err, YamlfigError::Yaml(_)));
    assert_eq!(app.count, 5);
}

#[test]
fn round_trip_reproduces_field_values() {
    let mut first = App::default();
    Config::new(&mut first)
        .parse_arguments([
            "--name=alice",
            "--count=3",
            "--server.host=h",
            "--server.pool_size=9",
        ])
        .unwrap();

    let tokens = [
        format!("name={}", first.name),
        format!("count={}", first.count),
        format!("server.host={}", first.server.host),
        format!("server.pool_size={}", first.server.pool_size),
    ];
    let mut second = App::default();
    Config::new(&mut second).parse_arguments(tokens).unwrap();
    assert_eq!(first, second);
}

#[test]
fn repeated_parses_keep_earlier_fields() {
    let mut app = App::default();
    let mut config = Config::new(&mut app);
    config.parse_arguments(["--name=alice"]).unwrap();
    config.parse_arguments(["--count=3"]).unwrap();
    assert_eq!(app.name, "alice");
    assert_eq!(app.count, 3);
}
